use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::middleware::auth::extract_session_token;

/// Session token claims as issued by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(
        user_id: impl Into<String>,
        email: Option<String>,
        expiry_hours: u64,
    ) -> Result<Self, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(expiry_hours)
            .ok()
            .and_then(TimeDelta::try_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                AuthError::TokenGeneration(format!("expiry of {} hours is out of range", expiry_hours))
            })?
            .timestamp();

        Ok(Self {
            sub: user_id.into(),
            email,
            role: Some("authenticated".to_string()),
            exp,
            iat: now.timestamp(),
        })
    }
}

/// Verified caller for the lifetime of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub id: String,
    pub email: Option<String>,
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub, email: claims.email }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No session found")]
    MissingSession,

    #[error("Invalid session token: {0}")]
    InvalidToken(String),

    #[error("Session verification is not configured")]
    NotConfigured,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// Turns request session evidence into a verified identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError>;
}

/// Verifies HS256 session JWTs carried in a cookie (or a Bearer header).
pub struct JwtSessionResolver {
    secret: String,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(secret: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self { secret: secret.into(), cookie_name: cookie_name.into() }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if self.secret.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("token has no subject".to_string()));
        }
        Ok(token_data.claims)
    }
}

#[async_trait]
impl IdentityResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<CallerIdentity, AuthError> {
        let token = extract_session_token(headers, &self.cookie_name)?;
        let claims = self.verify(&token)?;
        Ok(CallerIdentity::from(claims))
    }
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::NotConfigured);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key)
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
}
