//! In-memory [`DataStore`] used for local runs without Postgres and in tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::filter::matcher::{compare_values, FilterMatcher};
use crate::filter::types::is_valid_identifier;

use super::store::{DataStore, Row, StoreError, StoreQuery};

#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Row>>>,
    failure: RwLock<Option<String>>,
    queries: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `{ "<collection>": [ {row}, ... ], ... }`.
    pub fn from_fixtures(fixtures: Value) -> Result<Self, StoreError> {
        let Value::Object(collections) = fixtures else {
            return Err(StoreError::Decode("fixtures must be an object of collections".to_string()));
        };

        let mut map = HashMap::new();
        for (name, rows) in collections {
            if !is_valid_identifier(&name) {
                return Err(StoreError::Decode(format!("invalid collection name: {}", name)));
            }
            let Value::Array(rows) = rows else {
                return Err(StoreError::Decode(format!("collection {} must be an array", name)));
            };
            let rows = rows
                .into_iter()
                .map(|row| match row {
                    Value::Object(obj) => Ok(obj),
                    _ => Err(StoreError::Decode(format!("rows of {} must be objects", name))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            map.insert(name, rows);
        }

        Ok(Self {
            collections: RwLock::new(map),
            ..Self::default()
        })
    }

    pub async fn create_collection(&self, collection: &str) {
        self.collections.write().await.entry(collection.to_string()).or_default();
    }

    pub async fn insert(&self, collection: &str, row: Value) {
        if let Value::Object(obj) = row {
            self.collections.write().await.entry(collection.to_string()).or_default().push(obj);
        }
    }

    /// Make every subsequent call fail with `message` (`None` to recover).
    pub async fn set_failure(&self, message: Option<&str>) {
        *self.failure.write().await = message.map(str::to_string);
    }

    /// Number of `query`/`probe` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    async fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.read().await.as_deref() {
            Some(message) => Err(StoreError::Query(message.to_string())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Row>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        let collections = self.collections.read().await;
        let rows = collections.get(&query.collection).ok_or_else(|| {
            StoreError::Query(format!("relation \"{}\" does not exist", query.collection))
        })?;

        let mut selected = Vec::new();
        for row in rows {
            if FilterMatcher::matches(&query.where_clause, row)? {
                selected.push(row.clone());
            }
        }
        selected.sort_by(|a, b| FilterMatcher::compare_rows(a, b, &query.order));

        if let Some(join) = &query.join {
            let related = collections.get(&join.relation).ok_or_else(|| {
                StoreError::Query(format!("relation \"{}\" does not exist", join.relation))
            })?;
            for row in selected.iter_mut() {
                let key = row.get(&join.local_column).cloned().unwrap_or(Value::Null);
                let embedded = if key.is_null() {
                    Value::Null
                } else {
                    related
                        .iter()
                        .find(|candidate| {
                            candidate
                                .get(&join.foreign_column)
                                .is_some_and(|v| !v.is_null() && compare_values(v, &key).is_eq())
                        })
                        .map(|candidate| Value::Object(candidate.clone()))
                        .unwrap_or(Value::Null)
                };
                row.insert(join.alias.clone(), embedded);
            }
        }

        if let Some(limit) = query.limit {
            selected.truncate(usize::try_from(limit).unwrap_or(0));
        }

        Ok(selected)
    }

    async fn probe(&self, collection: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.check_failure().await?;

        let collections = self.collections.read().await;
        let rows = collections.get(collection).ok_or_else(|| {
            StoreError::Query(format!("relation \"{}\" does not exist", collection))
        })?;
        Ok(rows.first().map(|row| row.keys().cloned().collect()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_failure().await
    }
}
