use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::bookings::planner::newest_first_order;
use crate::bookings::{QueryPlanner, SemanticFilter};
use crate::config::SchemaConfig;
use crate::database::{DataStore, Row, StoreQuery};
use crate::error::ApiError;
use crate::observer::{AccessEvent, AccessObserver};
use crate::state::AppState;

pub const SEARCH_FAILED: &str = "Failed to search properties";
pub const INVALID_PRICE: &str = "Invalid price filter";

/// Query string of `GET /api/properties/search`. Everything is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySearchParams {
    pub q: Option<String>,
    pub published: Option<String>,
    pub available: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertySearchPayload {
    pub success: bool,
    pub data: Vec<Row>,
    pub count: usize,
}

impl PropertySearchParams {
    fn flag(value: &Option<String>) -> bool {
        value.as_deref() == Some("true")
    }

    fn price(name: &str, value: &Option<String>) -> Result<Option<i64>, ApiError> {
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ApiError::bad_request(INVALID_PRICE, format!("{} must be an integer, got '{}'", name, raw))),
        }
    }

    /// Drift-prone boolean flags, resolved against the store's columns.
    pub fn semantic_filters(&self) -> Vec<SemanticFilter> {
        let mut filters = Vec::new();
        if Self::flag(&self.published) {
            filters.push(SemanticFilter::new("published", Value::Bool(true)));
        }
        if Self::flag(&self.available) {
            filters.push(SemanticFilter::new("available", Value::Bool(true)));
        }
        filters
    }

    /// Fixed-column conditions: price range, free text and location.
    pub fn conditions(&self) -> Result<Map<String, Value>, ApiError> {
        let mut conditions = Map::new();

        let mut price = Map::new();
        if let Some(min) = Self::price("minPrice", &self.min_price)? {
            price.insert("$gte".to_string(), json!(min));
        }
        if let Some(max) = Self::price("maxPrice", &self.max_price)? {
            price.insert("$lte".to_string(), json!(max));
        }
        if !price.is_empty() {
            conditions.insert("price_per_night".to_string(), Value::Object(price));
        }

        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!("%{}%", q);
            conditions.insert(
                "$or".to_string(),
                json!([
                    { "name": { "$ilike": pattern } },
                    { "location": { "$ilike": pattern } }
                ]),
            );
        }

        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            conditions.insert("location".to_string(), json!({ "$ilike": format!("%{}%", location) }));
        }

        Ok(conditions)
    }
}

/// Public search over listed properties.
pub struct PropertySearch<'a> {
    store: &'a dyn DataStore,
    schema: &'a SchemaConfig,
    observer: &'a dyn AccessObserver,
    max_rows: Option<i32>,
}

impl<'a> PropertySearch<'a> {
    pub fn new(store: &'a dyn DataStore, schema: &'a SchemaConfig, observer: &'a dyn AccessObserver) -> Self {
        Self { store, schema, observer, max_rows: None }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(state.store.as_ref(), &state.config.schema, state.observer.as_ref())
            .max_rows(state.config.filter.max_limit)
    }

    pub fn max_rows(mut self, max_rows: Option<i32>) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub async fn search(&self, params: &PropertySearchParams) -> Result<PropertySearchPayload, ApiError> {
        let collection = &self.schema.properties_table;
        let mut conditions = params.conditions()?;

        let planner = QueryPlanner::new(self.store, self.schema, self.observer);
        let query = async {
            let resolved = planner.resolve_filters(collection, &params.semantic_filters()).await?;
            conditions.extend(resolved);
            let mut query = StoreQuery::new(collection.clone())
                .filter(Value::Object(conditions))
                .order(newest_first_order());
            if let Some(max_rows) = self.max_rows {
                query = query.limit(max_rows);
            }
            self.store.query(&query).await
        };

        let data = match query.await {
            Ok(rows) => rows,
            Err(e) => {
                self.observer.record(AccessEvent::StoreFailed {
                    collection: collection.clone(),
                    message: e.to_string(),
                });
                return Err(ApiError::store_failure(SEARCH_FAILED, &e));
            }
        };

        self.observer.record(AccessEvent::RecordsFetched {
            collection: collection.clone(),
            owner_id: None,
            count: data.len(),
        });

        Ok(PropertySearchPayload { success: true, count: data.len(), data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::InMemoryStore;
    use crate::observer::RecordingObserver;
    use axum::http::StatusCode;

    fn params(pairs: &[(&str, &str)]) -> PropertySearchParams {
        let mut map = Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), json!(v));
        }
        serde_json::from_value(Value::Object(map)).unwrap()
    }

    fn ids(payload: &PropertySearchPayload) -> Vec<&str> {
        payload.data.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    fn store(flag_column: &str) -> InMemoryStore {
        let rows: Vec<Value> = [
            ("p1", "Yourte du lac", "Annecy", 80, true, "2024-01-01T00:00:00Z"),
            ("p2", "Cabane perchee", "Vercors", 120, false, "2024-02-01T00:00:00Z"),
            ("p3", "Tipi des pins", "Landes", 60, true, "2024-03-01T00:00:00Z"),
        ]
        .iter()
        .map(|(id, name, location, price, flag, created_at)| {
            let mut row = Map::new();
            row.insert("id".into(), json!(id));
            row.insert("name".into(), json!(name));
            row.insert("location".into(), json!(location));
            row.insert("price_per_night".into(), json!(price));
            row.insert("created_at".into(), json!(created_at));
            row.insert(flag_column.to_string(), json!(flag));
            Value::Object(row)
        })
        .collect();
        InMemoryStore::from_fixtures(json!({ "properties": rows })).unwrap()
    }

    async fn run(store: &InMemoryStore, params: &PropertySearchParams) -> Result<PropertySearchPayload, ApiError> {
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        PropertySearch::new(store, &schema, &observer).search(params).await
    }

    #[tokio::test]
    async fn published_filter_is_spelling_independent() {
        let wanted = params(&[("published", "true")]);
        let a = run(&store("published"), &wanted).await.unwrap();
        let b = run(&store("is_published"), &wanted).await.unwrap();
        assert_eq!(ids(&a), vec!["p3", "p1"]);
        assert_eq!(ids(&a), ids(&b));

        // Neither spelling present: the flag constrains nothing.
        let c = run(&store("visible"), &wanted).await.unwrap();
        assert_eq!(ids(&c), vec!["p3", "p2", "p1"]);
    }

    #[tokio::test]
    async fn text_price_and_location_filters() {
        let store = store("published");

        let by_text = run(&store, &params(&[("q", "  cabane ")])).await.unwrap();
        assert_eq!(ids(&by_text), vec!["p2"]);

        let by_location_text = run(&store, &params(&[("q", "annecy")])).await.unwrap();
        assert_eq!(ids(&by_location_text), vec!["p1"]);

        let by_price = run(&store, &params(&[("minPrice", "70"), ("maxPrice", "120")])).await.unwrap();
        assert_eq!(ids(&by_price), vec!["p2", "p1"]);

        let by_location = run(&store, &params(&[("location", "land")])).await.unwrap();
        assert_eq!(by_location.count, 1);
    }

    #[tokio::test]
    async fn row_cap_keeps_newest() {
        let store = store("published");
        let schema = SchemaConfig::default();
        let observer = RecordingObserver::new();
        let payload = PropertySearch::new(&store, &schema, &observer)
            .max_rows(Some(2))
            .search(&params(&[]))
            .await
            .unwrap();
        assert_eq!(ids(&payload), vec!["p3", "p2"]);
    }

    #[tokio::test]
    async fn non_integer_price_is_rejected() {
        let err = run(&store("published"), &params(&[("minPrice", "cheap")])).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.label(), INVALID_PRICE);
    }

    #[tokio::test]
    async fn store_failure_is_reported() {
        let store = store("published");
        store.set_failure(Some("timeout")).await;
        let err = run(&store, &params(&[])).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details(), "timeout");
    }
}
