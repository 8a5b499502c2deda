//! Request ID middleware for request tracing

use axum::{
    http::{HeaderName, Request},
    response::Response,
};
use serde_json::Value;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::MakeSpan,
};
use tracing::{Level, Span};

use super::json_body::map_json_body;

/// Header name for request ID
pub const X_REQUEST_ID: &str = "x-request-id";

/// Creates a layered middleware that:
/// 1. Sets a request ID if not present (using UUID v4)
/// 2. Propagates the request ID to the response
pub fn request_id_layer() -> (SetRequestIdLayer<MakeRequestUuid>, PropagateRequestIdLayer) {
    let header_name = HeaderName::from_static(X_REQUEST_ID);

    (
        SetRequestIdLayer::new(header_name.clone(), MakeRequestUuid),
        PropagateRequestIdLayer::new(header_name),
    )
}

/// Request span carrying method, path and request ID.
///
/// Must run inside the `SetRequestIdLayer` so the header is already present.
#[derive(Debug, Clone, Copy)]
pub struct RequestIdSpan {
    level: Level,
}

impl RequestIdSpan {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl<B> MakeSpan<B> for RequestIdSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("-");

        macro_rules! request_span {
            ($level:expr) => {
                tracing::span!(
                    $level,
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            };
        }

        match self.level {
            Level::ERROR => request_span!(Level::ERROR),
            Level::WARN => request_span!(Level::WARN),
            Level::INFO => request_span!(Level::INFO),
            Level::DEBUG => request_span!(Level::DEBUG),
            _ => request_span!(Level::TRACE),
        }
    }
}

/// Copy the response's request ID into JSON error bodies that carry a
/// `code` but no `request_id`.
///
/// Must run outside `PropagateRequestIdLayer` so the response header is set.
pub async fn error_request_id(response: Response) -> Response {
    if !(response.status().is_client_error() || response.status().is_server_error()) {
        return response;
    }
    let Some(request_id) = response
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
    else {
        return response;
    };

    map_json_body(response, move |mut body| {
        if let Value::Object(fields) = &mut body {
            let missing = fields.get("request_id").map_or(true, Value::is_null);
            if fields.contains_key("code") && missing {
                fields.insert("request_id".to_string(), Value::String(request_id));
            }
        }
        body
    })
    .await
}
