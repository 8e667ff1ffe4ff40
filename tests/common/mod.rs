#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use booking_access::auth::{generate_jwt, Claims, JwtSessionResolver};
use booking_access::config::AppConfig;
use booking_access::database::InMemoryStore;
use booking_access::observer::RecordingObserver;
use booking_access::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const COOKIE: &str = "sb-access-token";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// In-process app over an in-memory store, with events captured.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub observer: Arc<RecordingObserver>,
}

impl TestApp {
    pub fn with_fixtures(fixtures: Value) -> Result<Self> {
        let store = Arc::new(InMemoryStore::from_fixtures(fixtures)?);
        Ok(Self::with_store(store))
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        let mut config = AppConfig::development();
        config.security.jwt_secret = TEST_SECRET.to_string();

        let observer = Arc::new(RecordingObserver::new());
        let identity = Arc::new(JwtSessionResolver::new(TEST_SECRET, COOKIE));
        let state = AppState::new(config, store.clone(), identity, observer.clone());

        Self { router: booking_access::app(state), store, observer }
    }

    /// GET with the session token, if any, in the session cookie.
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("{}={}", COOKIE, token));
        }
        self.send(request.body(Body::empty())?).await
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).context("response body is not JSON")?
        };
        Ok(TestResponse { status, headers, body })
    }
}

/// Session token for `user_id` signed with the test secret.
pub fn token_for(user_id: &str) -> Result<String> {
    let claims = Claims::new(user_id, Some(format!("{}@example.com", user_id)), 1)?;
    Ok(generate_jwt(&claims, TEST_SECRET)?)
}

/// Two bookings for `u1` (b1 newer with a property, b2 older whose property is
/// gone), one for `u2`, and a single property.
pub fn booking_fixtures() -> Value {
    serde_json::json!({
        "bookings": [
            {
                "id": "b2", "client_id": "u1", "property_id": "p-deleted",
                "check_in_date": "2024-07-01", "check_out_date": "2024-07-03",
                "total_price": 180, "status": "pending", "guest_count": 2,
                "created_at": "2024-02-01T10:00:00Z", "updated_at": "2024-02-01T10:00:00Z"
            },
            {
                "id": "b1", "client_id": "u1", "property_id": "p1",
                "check_in_date": "2024-08-10", "check_out_date": "2024-08-14",
                "total_price": 360, "status": "confirmed", "guest_count": 4,
                "full_name": "Camille Martin", "email_or_phone": "camille@example.com",
                "travel_type": "famille",
                "created_at": "2024-03-01T10:00:00Z", "updated_at": "2024-03-02T08:00:00Z"
            },
            {
                "id": "b9", "client_id": "u2", "property_id": "p1", "status": "confirmed",
                "created_at": "2024-04-01T10:00:00Z"
            }
        ],
        "properties": [
            {
                "id": "p1", "name": "Yourte du lac", "location": "Annecy",
                "images": ["yourte-1.jpg", "yourte-2.jpg"], "price_per_night": 90,
                "category": "yourte", "owner_id": "o1", "is_published": true,
                "created_at": "2023-12-01T00:00:00Z"
            }
        ]
    })
}
