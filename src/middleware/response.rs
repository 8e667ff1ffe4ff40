use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

pub const NO_STORE_CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate";

/// Mark a response as never reusable by clients or intermediaries.
pub fn apply_no_store(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_STORE_CACHE_CONTROL));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
}

/// JSON response that must reflect the store state at request time.
#[derive(Debug)]
pub struct NoStore<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for NoStore<T> {
    fn into_response(self) -> Response {
        let mut response = match serde_json::to_value(&self.0) {
            Ok(value) => (StatusCode::OK, Json(value)).into_response(),
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Internal server error",
                        "code": "INTERNAL_SERVER_ERROR",
                        "details": "Failed to serialize response data"
                    })),
                )
                    .into_response()
            }
        };
        apply_no_store(response.headers_mut());
        response
    }
}
