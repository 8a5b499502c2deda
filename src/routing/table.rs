//! Controllers and the route table
//!
//! A [`Controller`] groups routes under a path prefix and supplies the
//! defaults (auth, tags) its routes inherit. A [`RouteTable`] collects
//! controllers, rejects conflicting registrations and turns them into an axum
//! [`Router`].

use std::collections::{BTreeMap, HashMap};

use axum::{
    handler::Handler,
    http::Method,
    middleware::map_response,
    response::Response,
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use serde::Serialize;
use url::Url;

use super::params::RouteParameters;
use super::setting::{AuthPolicy, Setting};
use crate::api::schema::short_type_name;
use crate::api::{DumpOptions, SchemaRef};
use crate::error::ValidationError;
use crate::middleware::map_json_body;

/// Documentation view of a registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    pub path: String,
    pub methods: Vec<String>,
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Effective policy after inheritance.
    pub auth: Option<AuthPolicy>,
    pub response: Option<SchemaRef>,
    /// Applied to the JSON body of every successful response.
    pub serialization: DumpOptions,
    #[serde(skip)]
    pub include_in_schema: bool,
}

struct RouteEntry<S> {
    path: String,
    handler_name: &'static str,
    params: RouteParameters,
    method_router: MethodRouter<S>,
}

pub struct Controller<S = ()> {
    prefix: String,
    auth: Setting<AuthPolicy>,
    tags: Vec<String>,
    entries: Vec<RouteEntry<S>>,
}

impl<S> Controller<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            auth: Setting::NotSet,
            tags: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn auth(mut self, auth: Setting<AuthPolicy>) -> Self {
        self.auth = auth;
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Attach `handler` under `prefix + params.path()` for `params.methods()`.
    pub fn route<H, T>(mut self, params: RouteParameters, handler: H) -> Result<Self, ValidationError>
    where
        H: Handler<T, S>,
        T: 'static,
    {
        let path = join_paths(&self.prefix, params.path());

        let mut filter: Option<MethodFilter> = None;
        for method in params.methods() {
            let method_filter = method_filter(method)?;
            if self
                .entries
                .iter()
                .any(|entry| entry.path == path && entry.params.methods().contains(method))
            {
                return Err(duplicate_route(method, &path));
            }
            filter = Some(match filter {
                Some(existing) => existing.or(method_filter),
                None => method_filter,
            });
        }
        let filter = filter.ok_or_else(|| {
            ValidationError::new(format!("Route `{path}` has no HTTP methods to register"))
        })?;

        let mut method_router = on(filter, handler);
        let serialization = params.serialization();
        if serialization.exclude_none {
            method_router = method_router.layer(map_response(move |response: Response| {
                render_response(serialization, response)
            }));
        }

        self.entries.push(RouteEntry {
            path,
            handler_name: short_type_name::<H>(),
            params,
            method_router,
        });
        Ok(self)
    }
}

async fn render_response(options: DumpOptions, response: Response) -> Response {
    if !response.status().is_success() {
        return response;
    }
    map_json_body(response, |body| options.apply(body)).await
}

fn method_filter(method: &str) -> Result<MethodFilter, ValidationError> {
    let parsed = Method::from_bytes(method.as_bytes())
        .map_err(|_| ValidationError::new(format!("`{method}` is not a valid HTTP method")))?;
    MethodFilter::try_from(parsed)
        .map_err(|_| ValidationError::new(format!("`{method}` cannot be routed")))
}

fn duplicate_route(method: &str, path: &str) -> ValidationError {
    ValidationError::new(format!("Route `{method} {path}` is registered more than once"))
}

/// `("/api/tasks/", "/:id")` -> `/api/tasks/:id`
pub fn join_paths(prefix: &str, path: &str) -> String {
    let segments: Vec<&str> = prefix
        .split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Name of the first parameter segment at which `a` and `b` bind
/// differently named parameters while every earlier segment matches.
///
/// The router cannot hold both `/tasks/:id` and `/tasks/:pk/notes`.
fn conflicting_param<'a>(a: &'a str, b: &'a str) -> Option<(&'a str, &'a str)> {
    for (left, right) in a.split('/').zip(b.split('/')) {
        let left_param = left.starts_with(':') || left.starts_with('*');
        let right_param = right.starts_with(':') || right.starts_with('*');
        match (left_param, right_param) {
            (true, true) if left != right => return Some((left, right)),
            (true, true) => continue,
            (false, false) if left == right => continue,
            _ => return None,
        }
    }
    None
}

/// Registered controllers, ready to become a [`Router`].
pub struct RouteTable<S = ()> {
    auth: Setting<AuthPolicy>,
    method_routers: BTreeMap<String, MethodRouter<S>>,
    url_names: HashMap<String, String>,
    routes: Vec<RouteInfo>,
}

impl<S> Default for RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> RouteTable<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            auth: Setting::NotSet,
            method_routers: BTreeMap::new(),
            url_names: HashMap::new(),
            routes: Vec::new(),
        }
    }

    /// API-wide auth, inherited by controllers and routes that set none.
    pub fn auth(mut self, auth: Setting<AuthPolicy>) -> Self {
        self.auth = auth;
        self
    }

    pub fn register(mut self, controller: Controller<S>) -> Result<Self, ValidationError> {
        let Controller {
            prefix,
            auth: controller_auth,
            tags: controller_tags,
            entries,
        } = controller;

        for entry in entries {
            let RouteEntry {
                path,
                handler_name,
                params,
                method_router,
            } = entry;

            if let Some(method) = params.methods().iter().find(|method| {
                self.routes
                    .iter()
                    .any(|route| route.path == path && route.methods.contains(method))
            }) {
                return Err(duplicate_route(method, &path));
            }

            if let Some((existing, param)) = self
                .method_routers
                .keys()
                .find_map(|existing| conflicting_param(existing, &path).map(|c| (existing, c)))
            {
                return Err(ValidationError::new(format!(
                    "Route `{path}` conflicts with `{existing}`: `{}` and `{}` bind the same segment",
                    param.1, param.0
                )));
            }

            if let Some(name) = params.url_name() {
                if self.url_names.contains_key(name) {
                    return Err(ValidationError::new(format!(
                        "url_name `{name}` is already registered"
                    )));
                }
                self.url_names.insert(name.to_string(), path.clone());
            }

            let auth = params
                .auth()
                .clone()
                .or_inherit(controller_auth.clone())
                .or_inherit(self.auth.clone())
                .into_option();
            let tags = params
                .tags()
                .map(<[String]>::to_vec)
                .unwrap_or_else(|| controller_tags.clone());

            let info = RouteInfo {
                path: path.clone(),
                methods: params.methods().to_vec(),
                operation_id: params.resolved_operation_id(handler_name),
                url_name: params.url_name().map(str::to_string),
                summary: params.summary().map(str::to_string),
                description: params.description().map(str::to_string),
                tags,
                deprecated: params.deprecated().unwrap_or(false),
                auth,
                response: params.response().clone().into_option(),
                serialization: params.serialization(),
                include_in_schema: params.include_in_schema(),
            };

            tracing::debug!(
                controller = %prefix,
                path = %info.path,
                methods = ?info.methods,
                operation_id = %info.operation_id,
                "Registered route"
            );

            let merged = match self.method_routers.remove(&path) {
                Some(existing) => existing.merge(method_router),
                None => method_router,
            };
            self.method_routers.insert(path, merged);
            self.routes.push(info);
        }

        Ok(self)
    }

    /// Every registered route, in registration order.
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Routes that opted into the published schema.
    pub fn schema(&self) -> Vec<RouteInfo> {
        self.routes
            .iter()
            .filter(|route| route.include_in_schema)
            .cloned()
            .collect()
    }

    /// Reverse a `url_name`, substituting `:param` segments from `args`.
    ///
    /// Argument values are percent-encoded as single path segments. Returns
    /// `None` for unknown names and missing or empty arguments.
    pub fn url_for(&self, name: &str, args: &[(&str, &str)]) -> Option<String> {
        let pattern = self.url_names.get(name)?;
        let segments = pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.strip_prefix(':') {
                Some(param) => args
                    .iter()
                    .find(|(key, value)| *key == param && !value.is_empty())
                    .map(|(_, value)| *value),
                None => Some(segment),
            })
            .collect::<Option<Vec<&str>>>()?;

        let mut url = Url::parse("http://localhost/").ok()?;
        url.path_segments_mut().ok()?.clear().extend(segments);
        Some(url.path().to_string())
    }

    pub fn into_router(self) -> Router<S> {
        self.method_routers
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router)
            })
    }
}
