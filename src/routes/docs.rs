//! Route documentation endpoint

use axum::extract::State;
use std::sync::Arc;

use crate::api::{ItemEnvelope, Schema};
use crate::app::AppState;
use crate::routing::RouteInfo;

impl Schema for RouteInfo {}

/// GET /api/routes
///
/// Every route that opted into the published schema, with its effective
/// auth policy and response schema.
pub async fn list_routes(State(state): State<Arc<AppState>>) -> ItemEnvelope<RouteInfo> {
    ItemEnvelope::new(state.routes.len() as u64, state.routes.clone())
}
