// HTTP API Error Types
use axum::{extract::rejection::QueryRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StoreError;
use crate::middleware::response::apply_no_store;

/// HTTP API error with a stable machine code, a human label and a detail string
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest { label: String, details: String },

    // 401 Unauthorized (no verified identity)
    Unauthenticated(String),

    // 403 Forbidden
    Forbidden { label: String, details: String },

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error, store reported a failure
    StoreFailure { label: String, details: String },

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::StoreFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Human-readable error label
    pub fn label(&self) -> &str {
        match self {
            ApiError::BadRequest { label, .. } => label,
            ApiError::Unauthenticated(_) => "Authentication error",
            ApiError::Forbidden { label, .. } => label,
            ApiError::NotFound(_) => "Not found",
            ApiError::StoreFailure { label, .. } => label,
            ApiError::InternalServerError(_) => "Internal server error",
        }
    }

    /// Client-safe detail message
    pub fn details(&self) -> &str {
        match self {
            ApiError::BadRequest { details, .. } => details,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::Forbidden { details, .. } => details,
            ApiError::NotFound(msg) => msg,
            ApiError::StoreFailure { details, .. } => details,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StoreFailure { .. } => "STORE_ERROR",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.label(),
            "code": self.error_code(),
            "details": self.details()
        })
    }
}

impl ApiError {
    pub fn bad_request(label: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::BadRequest { label: label.into(), details: details.into() }
    }

    pub fn unauthenticated(details: impl Into<String>) -> Self {
        ApiError::Unauthenticated(details.into())
    }

    pub fn forbidden(label: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::Forbidden { label: label.into(), details: details.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn store_failure(label: impl Into<String>, err: &StoreError) -> Self {
        ApiError::StoreFailure { label: label.into(), details: err.to_string() }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Malformed query strings (duplicate keys, bad percent-encoding) are a client
// error with the same structured body as any other.
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request("Invalid query string", rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label(), self.details())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum. Error bodies carry the same
// no-store headers as successful ones.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        apply_no_store(response.headers_mut());
        response
    }
}

/// Last-resort conversion for panics caught at the outer layer. The panic
/// payload is not echoed.
pub fn panic_response(_panic: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    tracing::error!("handler panicked");
    ApiError::internal_server_error("Unexpected error while processing the request").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_has_label_code_and_details() {
        let err = ApiError::forbidden("Unauthorized: You can only access your own bookings", "owner mismatch");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            err.to_json(),
            json!({
                "success": false,
                "error": "Unauthorized: You can only access your own bookings",
                "code": "FORBIDDEN",
                "details": "owner mismatch"
            })
        );
    }

    #[test]
    fn store_failure_preserves_store_message() {
        let err = ApiError::store_failure("Failed to fetch bookings", &StoreError::Query("relation \"bookings\" does not exist".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details(), "relation \"bookings\" does not exist");
        assert_eq!(err.error_code(), "STORE_ERROR");
    }

    #[test]
    fn panic_response_hides_payload() {
        let response = panic_response(Box::new("secret stack detail"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
