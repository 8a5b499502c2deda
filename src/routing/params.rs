//! Route registration parameters

use axum::http::Method;
use serde::Deserialize;

use super::setting::{AuthPolicy, Setting};
use crate::api::{DumpOptions, SchemaRef};
use crate::error::ValidationError;

/// Validated configuration for one route registration.
///
/// Built once, then only read by the routing layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRouteParameters")]
pub struct RouteParameters {
    path: String,
    methods: Vec<String>,
    auth: Setting<AuthPolicy>,
    response: Setting<SchemaRef>,
    operation_id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    tags: Option<Vec<String>>,
    deprecated: Option<bool>,
    serialization: DumpOptions,
    url_name: Option<String>,
    include_in_schema: bool,
}

#[derive(Deserialize)]
struct RawRouteParameters {
    path: String,
    methods: Vec<String>,
    #[serde(default)]
    auth: Setting<AuthPolicy>,
    #[serde(default)]
    response: Setting<SchemaRef>,
    #[serde(default)]
    operation_id: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    deprecated: Option<bool>,
    #[serde(default)]
    by_alias: bool,
    #[serde(default)]
    exclude_unset: bool,
    #[serde(default)]
    exclude_defaults: bool,
    #[serde(default)]
    exclude_none: bool,
    #[serde(default)]
    url_name: Option<String>,
    #[serde(default = "default_include_in_schema")]
    include_in_schema: bool,
}

fn default_include_in_schema() -> bool {
    true
}

impl TryFrom<RawRouteParameters> for RouteParameters {
    type Error = ValidationError;

    fn try_from(raw: RawRouteParameters) -> Result<Self, Self::Error> {
        Ok(Self {
            path: raw.path,
            methods: normalize_methods(raw.methods)?,
            auth: raw.auth,
            response: raw.response,
            operation_id: raw.operation_id,
            summary: raw.summary,
            description: raw.description,
            tags: raw.tags,
            deprecated: raw.deprecated,
            serialization: DumpOptions {
                by_alias: raw.by_alias,
                exclude_unset: raw.exclude_unset,
                exclude_defaults: raw.exclude_defaults,
                exclude_none: raw.exclude_none,
            },
            url_name: raw.url_name,
            include_in_schema: raw.include_in_schema,
        })
    }
}

/// Upper-case, validate and de-duplicate method tokens, keeping first-seen
/// order. An empty list is allowed.
fn normalize_methods<I, M>(methods: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = M>,
    M: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for method in methods {
        let method = method.as_ref().trim().to_ascii_uppercase();
        if method.is_empty() || Method::from_bytes(method.as_bytes()).is_err() {
            return Err(ValidationError::new(format!(
                "`{method}` is not a valid HTTP method"
            )));
        }
        if !normalized.contains(&method) {
            normalized.push(method);
        }
    }
    Ok(normalized)
}

impl RouteParameters {
    pub fn new<I, M>(path: impl Into<String>, methods: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = M>,
        M: AsRef<str>,
    {
        Ok(Self::with_methods(path.into(), normalize_methods(methods)?))
    }

    /// Validate untyped configuration, e.g. loaded from JSON.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::with_methods(path.into(), vec![Method::GET.to_string()])
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::with_methods(path.into(), vec![Method::POST.to_string()])
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::with_methods(path.into(), vec![Method::PUT.to_string()])
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::with_methods(path.into(), vec![Method::PATCH.to_string()])
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::with_methods(path.into(), vec![Method::DELETE.to_string()])
    }

    fn with_methods(path: String, methods: Vec<String>) -> Self {
        Self {
            path,
            methods,
            auth: Setting::NotSet,
            response: Setting::NotSet,
            operation_id: None,
            summary: None,
            description: None,
            tags: None,
            deprecated: None,
            serialization: DumpOptions::default(),
            url_name: None,
            include_in_schema: true,
        }
    }

    pub fn with_auth(mut self, auth: Setting<AuthPolicy>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_response(mut self, response: Setting<SchemaRef>) -> Self {
        self.response = response;
        self
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn with_serialization(mut self, serialization: DumpOptions) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn with_url_name(mut self, url_name: impl Into<String>) -> Self {
        self.url_name = Some(url_name.into());
        self
    }

    pub fn with_include_in_schema(mut self, include_in_schema: bool) -> Self {
        self.include_in_schema = include_in_schema;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn auth(&self) -> &Setting<AuthPolicy> {
        &self.auth
    }

    pub fn response(&self) -> &Setting<SchemaRef> {
        &self.response
    }

    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> Option<&[String]> {
        self.tags.as_deref()
    }

    pub fn deprecated(&self) -> Option<bool> {
        self.deprecated
    }

    pub fn serialization(&self) -> DumpOptions {
        self.serialization
    }

    pub fn url_name(&self) -> Option<&str> {
        self.url_name.as_deref()
    }

    pub fn include_in_schema(&self) -> bool {
        self.include_in_schema
    }

    /// The configured operation id, or a generated
    /// `<8 hex chars>_controller_<handler>`.
    pub fn resolved_operation_id(&self, handler: &str) -> String {
        match &self.operation_id {
            Some(id) => id.clone(),
            None => {
                let prefix = uuid::Uuid::new_v4().simple().to_string();
                format!("{}_controller_{}", &prefix[..8], handler)
            }
        }
    }
}
