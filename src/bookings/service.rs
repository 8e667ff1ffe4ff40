use chrono::Utc;

use crate::auth::CallerIdentity;
use crate::config::SchemaConfig;
use crate::database::DataStore;
use crate::error::ApiError;
use crate::observer::{AccessEvent, AccessObserver};
use crate::state::AppState;

use super::assembler::{assemble, BookingsPayload};
use super::guard::{authorize, Access};
use super::normalizer::ResultNormalizer;
use super::planner::{QueryPlanner, PROPERTY_JOIN_ALIAS};

pub const CLIENT_ID_REQUIRED: &str = "Client ID is required";
pub const OWN_BOOKINGS_ONLY: &str = "Unauthorized: You can only access your own bookings";
pub const FETCH_FAILED: &str = "Failed to fetch bookings";

/// Client booking retrieval: validate, authorize, fetch, normalize, assemble.
pub struct BookingService<'a> {
    store: &'a dyn DataStore,
    schema: &'a SchemaConfig,
    observer: &'a dyn AccessObserver,
}

impl<'a> BookingService<'a> {
    pub fn new(store: &'a dyn DataStore, schema: &'a SchemaConfig, observer: &'a dyn AccessObserver) -> Self {
        Self { store, schema, observer }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.store.as_ref(), &state.config.schema, state.observer.as_ref())
    }

    /// Bookings of `client_id` for an already verified `caller`.
    ///
    /// Validation and ownership are checked before the store is touched.
    pub async fn client_bookings(
        &self,
        caller: &CallerIdentity,
        client_id: Option<&str>,
        diagnostics: bool,
    ) -> Result<BookingsPayload, ApiError> {
        let client_id = match client_id {
            Some(id) if !id.is_empty() => id,
            _ => {
                self.observer.record(AccessEvent::InvalidRequest {
                    reason: "missing clientId parameter".to_string(),
                });
                return Err(ApiError::bad_request(CLIENT_ID_REQUIRED, "Missing clientId query parameter"));
            }
        };

        if authorize(client_id, caller) == Access::Deny {
            self.observer.record(AccessEvent::AccessDenied {
                requested_owner_id: client_id.to_string(),
                caller_id: caller.id.clone(),
            });
            return Err(ApiError::forbidden(
                OWN_BOOKINGS_ONLY,
                "Requested client does not match the authenticated user",
            ));
        }

        let planner = QueryPlanner::new(self.store, self.schema, self.observer);
        let rows = match planner.fetch_owned_bookings(client_id, &[]).await {
            Ok(rows) => rows,
            Err(e) => {
                self.observer.record(AccessEvent::StoreFailed {
                    collection: self.schema.bookings_table.clone(),
                    message: e.to_string(),
                });
                return Err(ApiError::store_failure(FETCH_FAILED, &e));
            }
        };

        let normalizer = ResultNormalizer::new(PROPERTY_JOIN_ALIAS, self.schema.property_reference_column.clone());
        let views = normalizer.normalize_all(&rows);

        self.observer.record(AccessEvent::RecordsFetched {
            collection: self.schema.bookings_table.clone(),
            owner_id: Some(client_id.to_string()),
            count: views.len(),
        });

        Ok(assemble(client_id, views, diagnostics, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::observer::RecordingObserver;
    use axum::http::StatusCode;
    use serde_json::json;

    fn caller(id: &str) -> CallerIdentity {
        CallerIdentity { id: id.to_string(), email: Some(format!("{}@example.com", id)) }
    }

    fn store() -> InMemoryStore {
        InMemoryStore::from_fixtures(json!({
            "bookings": [
                { "id": "b2", "client_id": "u1", "property_id": "gone", "status": "pending", "created_at": "2024-02-01T10:00:00Z" },
                { "id": "b1", "client_id": "u1", "property_id": "p1", "status": "confirmed", "created_at": "2024-03-01T10:00:00Z" },
                { "id": "b9", "client_id": "u2", "property_id": "p1", "status": "confirmed", "created_at": "2024-04-01T10:00:00Z" }
            ],
            "properties": [
                { "id": "p1", "name": "Yourte du lac", "location": "Annecy", "images": ["y.jpg"], "price_per_night": 90, "category": "yourte", "owner_id": "o1" }
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn owner_gets_normalized_bookings_newest_first() {
        let store = store();
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let service = BookingService::new(&store, &schema, &observer);

        let payload = service.client_bookings(&caller("u1"), Some("u1"), false).await.unwrap();
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["count"], json!(2));
        assert_eq!(value["data"][0]["id"], json!("b1"));
        assert_eq!(value["data"][0]["properties"]["name"], json!("Yourte du lac"));
        assert_eq!(value["data"][1]["id"], json!("b2"));
        assert_eq!(value["data"][1]["properties"]["name"], json!("Unknown Property"));
        assert_eq!(value["data"][1]["properties"]["images"], json!([]));
        assert_eq!(value["data"][1]["properties"]["price_per_night"], json!(0));
        assert_eq!(value["data"][1]["properties"]["category"], json!("autre"));
        assert!(value.get("debug").is_none());
    }

    #[tokio::test]
    async fn mismatch_is_denied_without_store_access() {
        let store = store();
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let service = BookingService::new(&store, &schema, &observer);

        // u2 has bookings, u3 has none: the answer is the same.
        for requested in ["u2", "u3", "U1"] {
            let err = service.client_bookings(&caller("u1"), Some(requested), false).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
            assert_eq!(err.label(), OWN_BOOKINGS_ONLY);
        }
        assert_eq!(observer.denials(), 3);
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn missing_client_id_is_a_bad_request() {
        let store = store();
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let service = BookingService::new(&store, &schema, &observer);

        for client_id in [None, Some("")] {
            let err = service.client_bookings(&caller("u1"), client_id, false).await.unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.label(), CLIENT_ID_REQUIRED);
        }
        assert_eq!(observer.denials(), 0);
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn store_failure_keeps_message() {
        let store = store();
        store.set_failure(Some("permission denied for table bookings")).await;
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let service = BookingService::new(&store, &schema, &observer);

        let err = service.client_bookings(&caller("u1"), Some("u1"), false).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.label(), FETCH_FAILED);
        assert_eq!(err.details(), "permission denied for table bookings");
        assert!(observer.events().iter().any(|e| matches!(e, AccessEvent::StoreFailed { .. })));
    }

    #[tokio::test]
    async fn unknown_owner_is_an_empty_success() {
        let store = store();
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let service = BookingService::new(&store, &schema, &observer);

        let payload = service.client_bookings(&caller("u3"), Some("u3"), true).await.unwrap();
        assert_eq!(payload.count, 0);
        assert!(payload.data.is_empty());
        assert_eq!(payload.debug.unwrap().latest_booking, None);
    }

    #[tokio::test]
    async fn repeated_calls_yield_identical_views() {
        let store = store();
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let service = BookingService::new(&store, &schema, &observer);

        let first = service.client_bookings(&caller("u1"), Some("u1"), true).await.unwrap();
        let second = service.client_bookings(&caller("u1"), Some("u1"), true).await.unwrap();
        assert_eq!(
            serde_json::to_vec(&first.data).unwrap(),
            serde_json::to_vec(&second.data).unwrap()
        );
        assert_eq!(first.debug.unwrap().booking_statuses, second.debug.unwrap().booking_statuses);
    }
}
