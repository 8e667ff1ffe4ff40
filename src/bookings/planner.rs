use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::config::SchemaConfig;
use crate::database::{DataStore, Row, StoreError, StoreQuery};
use crate::filter::matcher::compare_values;
use crate::filter::{FilterOrderInfo, JoinSpec};
use crate::observer::{AccessEvent, AccessObserver};

/// Alias under which the joined property row is embedded in each booking row.
pub const PROPERTY_JOIN_ALIAS: &str = "properties";

/// A constraint on a semantic field whose physical column name may vary.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticFilter {
    pub field: String,
    /// Either a literal (equality) or an operator object such as `{"$gte": 10}`.
    pub value: Value,
}

impl SemanticFilter {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self { field: field.into(), value }
    }
}

/// Builds and runs drift-tolerant reads against the store.
pub struct QueryPlanner<'a> {
    store: &'a dyn DataStore,
    schema: &'a SchemaConfig,
    observer: &'a dyn AccessObserver,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(store: &'a dyn DataStore, schema: &'a SchemaConfig, observer: &'a dyn AccessObserver) -> Self {
        Self { store, schema, observer }
    }

    /// Map semantic filters onto the physical columns present in `collection`.
    ///
    /// The store is probed once, and only when there is something to resolve.
    /// Filters whose field has no present spelling are dropped.
    pub async fn resolve_filters(
        &self,
        collection: &str,
        filters: &[SemanticFilter],
    ) -> Result<Map<String, Value>, StoreError> {
        let mut resolved = Map::new();
        if filters.is_empty() {
            return Ok(resolved);
        }

        let present = self.store.probe(collection).await?;
        for filter in filters {
            let column = self.schema.aliases.resolve(&filter.field, present.as_ref());
            self.observer.record(AccessEvent::SchemaResolved {
                collection: collection.to_string(),
                field: filter.field.clone(),
                column: column.clone(),
            });
            if let Some(column) = column {
                resolved.insert(column, filter.value.clone());
            }
        }
        Ok(resolved)
    }

    /// Bookings owned by `owner_id`, each with its property embedded under
    /// [`PROPERTY_JOIN_ALIAS`], newest first.
    pub async fn fetch_owned_bookings(
        &self,
        owner_id: &str,
        filters: &[SemanticFilter],
    ) -> Result<Vec<Row>, StoreError> {
        let collection = &self.schema.bookings_table;
        let mut conditions = self.resolve_filters(collection, filters).await?;
        // Inserted last so no resolved alias can displace the ownership filter.
        conditions.insert(self.schema.owner_column.clone(), Value::String(owner_id.to_string()));

        let mut join = JoinSpec::new(
            self.schema.properties_table.clone(),
            self.schema.property_reference_column.clone(),
            "id",
        );
        join.alias = PROPERTY_JOIN_ALIAS.to_string();

        let query = StoreQuery::new(collection.clone())
            .filter(Value::Object(conditions))
            .join(join)
            .order(newest_first_order());

        let mut rows = self.store.query(&query).await?;
        sort_newest_first(&mut rows);
        Ok(rows)
    }
}

pub fn newest_first_order() -> Vec<FilterOrderInfo> {
    vec![FilterOrderInfo::desc("created_at"), FilterOrderInfo::desc("id")]
}

/// Order rows by `created_at` descending, then `id` descending.
///
/// Stores disagree on timestamp text formats, so ordering is re-established on
/// parsed instants. Rows without a readable timestamp go last.
pub fn sort_newest_first(rows: &mut [Row]) {
    rows.sort_by(|a, b| {
        let by_time = match (created_at(a), created_at(b)) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_time.then_with(|| {
            let null = Value::Null;
            compare_values(b.get("id").unwrap_or(&null), a.get("id").unwrap_or(&null))
        })
    });
}

fn created_at(row: &Row) -> Option<DateTime<Utc>> {
    row.get("created_at").and_then(Value::as_str).and_then(parse_timestamp)
}

pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Some(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
