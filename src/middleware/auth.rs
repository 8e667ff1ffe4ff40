use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::observer::AccessEvent;
use crate::state::AppState;

/// Resolves the caller once per request and injects the [`CallerIdentity`]
/// into request extensions. Failure ends the request with 401 before any
/// handler (and therefore any store access) runs.
///
/// [`CallerIdentity`]: crate::auth::CallerIdentity
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match state.identity.resolve(request.headers()).await {
        Ok(identity) => {
            state.observer.record(AccessEvent::Authenticated { user_id: identity.id.clone() });
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => {
            let reason = err.to_string();
            state.observer.record(AccessEvent::AuthenticationFailed { reason: reason.clone() });
            ApiError::unauthenticated(reason).into_response()
        }
    }
}

/// Session token from the named cookie, falling back to `Authorization: Bearer`.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Result<String, AuthError> {
    if let Some(token) = cookie_value(headers, cookie_name) {
        return Ok(token);
    }

    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::MissingSession);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid Authorization header format".to_string()))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err(AuthError::InvalidToken("Empty JWT token".to_string())),
        None => Err(AuthError::InvalidToken(
            "Authorization header must use Bearer token format".to_string(),
        )),
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}
