use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::middleware::NoStore;
use crate::properties::{PropertySearch, PropertySearchParams};
use crate::state::AppState;

/// GET /api/properties/search - filter listed properties
///
/// Query: `q`, `published`, `available`, `minPrice`, `maxPrice`, `location`.
pub async fn property_search_get(
    State(state): State<AppState>,
    params: Result<Query<PropertySearchParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return ApiError::from(rejection).into_response(),
    };

    match PropertySearch::from_state(&state).search(&params).await {
        Ok(payload) => NoStore(payload).into_response(),
        Err(e) => e.into_response(),
    }
}
