use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::filter::{FilterError, FilterOrderInfo, JoinSpec};

/// One row as returned by a store: column name to JSON value. Embedded join
/// results appear under the join alias as an object or `null`.
pub type Row = Map<String, Value>;

/// Errors reported by a [`DataStore`]. The message is preserved verbatim so it
/// can be surfaced to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Query(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Decode(String),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            sqlx::Error::Database(db) => StoreError::Query(db.message().to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Decode(err.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// A filtered, optionally joined, ordered read of one collection.
#[derive(Debug, Clone)]
pub struct StoreQuery {
    pub collection: String,
    pub where_clause: Value,
    pub join: Option<JoinSpec>,
    pub order: Vec<FilterOrderInfo>,
    pub limit: Option<i32>,
}

impl StoreQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            where_clause: Value::Null,
            join: None,
            order: vec![],
            limit: None,
        }
    }

    pub fn filter(mut self, where_clause: Value) -> Self {
        self.where_clause = where_clause;
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.join = Some(join);
        self
    }

    pub fn order(mut self, order: Vec<FilterOrderInfo>) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-only access to the relational store backing bookings and properties.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Row>, StoreError>;

    /// Field names present in `collection`, or `None` when nothing can be
    /// learned (empty or unknown collection).
    async fn probe(&self, collection: &str) -> Result<Option<BTreeSet<String>>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
