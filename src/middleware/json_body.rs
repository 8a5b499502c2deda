//! Rewriting JSON response bodies

use axum::{
    body::{to_bytes, Body},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// Apply `rewrite` to a JSON response body. Other responses pass through.
pub async fn map_json_body<F>(response: Response, rewrite: F) -> Response
where
    F: FnOnce(Value) -> Value,
{
    if !is_json(&response) {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let value = match serde_json::from_slice::<Value>(&bytes) {
        Ok(value) => value,
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };
    match serde_json::to_vec(&rewrite(value)) {
        Ok(rendered) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(rendered))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render response body");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use serde_json::json;

    async fn body_of(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_rewrites_json() {
        let response = Json(json!({"a": 1})).into_response();
        let response = map_json_body(response, |mut value| {
            value["b"] = json!(2);
            value
        })
        .await;

        let body: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body, json!({"a": 1, "b": 2}));
    }

    #[tokio::test]
    async fn test_skips_other_content() {
        let response = map_json_body("plain".into_response(), |_| json!(null)).await;
        assert_eq!(body_of(response).await, b"plain");
    }
}
