use anyhow::{Context, Result};
use axum::{http::HeaderValue, middleware::map_response, Router};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, CorsLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Settings;
use crate::domain::Task;
use crate::middleware::{error_request_id, request_id_layer, RequestIdSpan, X_REQUEST_ID};
use crate::persistence::InMemoryManager;
use crate::routes;
use crate::routing::RouteInfo;

/// Shared application state
pub struct AppState {
    pub settings: Settings,
    pub tasks: InMemoryManager<Task>,
    /// Published route documentation, fixed once the table is built.
    pub routes: Vec<RouteInfo>,
}

impl AppState {
    pub fn new(settings: Settings, routes: Vec<RouteInfo>) -> Arc<Self> {
        Arc::new(Self {
            settings,
            tasks: InMemoryManager::named("tasks"),
            routes,
        })
    }
}

/// Build the complete application with all middleware
pub fn create_app(settings: Settings) -> Result<Router> {
    let table = routes::route_table().context("Failed to build route table")?;
    tracing::info!(routes = table.routes().len(), "Route table built");

    // Build CORS layer
    let cors = build_cors_layer(&settings);

    // Build trace layer (use DEBUG for spans to reduce overhead at INFO level)
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(RequestIdSpan::new(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    // Request ID layers
    let (set_request_id, propagate_request_id) = request_id_layer();

    let state = AppState::new(settings, table.schema());

    Ok(table
        .into_router()
        // Middleware stack (applied bottom-up)
        .layer(propagate_request_id)
        .layer(map_response(error_request_id))
        .layer(trace_layer)
        .layer(set_request_id)
        .layer(cors)
        .with_state(state))
}

fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allow_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let max_age = if settings.env.is_dev() {
        std::time::Duration::from_secs(86400)
    } else {
        std::time::Duration::from_secs(3600)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(AllowMethods::list([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static(X_REQUEST_ID),
        ]))
        .allow_credentials(true)
        .max_age(max_age)
}
