use axum::{http::Uri, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;

/// GET / - service information
pub async fn root_get() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Booking Access API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Owner-scoped booking retrieval with property normalization",
            "endpoints": {
                "health": "/health (public)",
                "properties": "/api/properties/search (public)",
                "bookings": "/api/bookings/client?clientId=<id>[&debug=true] (session required)"
            }
        }
    }))
}

/// Any unmatched route
pub async fn fallback(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
