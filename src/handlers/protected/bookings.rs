use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use crate::auth::CallerIdentity;
use crate::bookings::BookingService;
use crate::error::ApiError;
use crate::middleware::NoStore;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ClientBookingsQuery {
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
    pub debug: Option<String>,
}

/// GET /api/bookings/client?clientId=<id>[&debug=true] - the caller's own bookings
pub async fn client_bookings_get(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    query: Result<Query<ClientBookingsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };
    let diagnostics = query.debug.as_deref() == Some("true");

    match BookingService::from_state(&state)
        .client_bookings(&caller, query.client_id.as_deref(), diagnostics)
        .await
    {
        Ok(payload) => NoStore(payload).into_response(),
        Err(e) => e.into_response(),
    }
}
