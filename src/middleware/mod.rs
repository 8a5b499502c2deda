//! HTTP middleware

pub mod json_body;
pub mod request_id;

pub use json_body::map_json_body;
pub use request_id::{error_request_id, request_id_layer, RequestIdSpan, X_REQUEST_ID};
