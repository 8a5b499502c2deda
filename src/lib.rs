//! Response envelopes, route descriptors and model-backed mutation schemas
//! for axum services.

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod persistence;
pub mod routes;
pub mod routing;
pub mod shortcuts;
