use std::collections::BTreeSet;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Row as _};

use crate::filter::Filter;

use super::store::{DataStore, Row, StoreError, StoreQuery};

/// [`DataStore`] backed by a Postgres pool. Queries are compiled through the
/// filter language and every row is returned as `row_to_json`.
pub struct PgStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgStore {
    pub fn new(pool: PgPool, log_queries: bool) -> Self {
        Self { pool, log_queries }
    }
}

#[async_trait]
impl DataStore for PgStore {
    async fn query(&self, query: &StoreQuery) -> Result<Vec<Row>, StoreError> {
        let mut filter = Filter::new(&query.collection)?;
        filter.where_clause(query.where_clause.clone())?;
        filter.order_by(query.order.clone())?;
        if let Some(join) = &query.join {
            filter.join(join.clone())?;
        }
        if let Some(limit) = query.limit {
            filter.limit(limit)?;
        }
        let sql_result = filter.to_json_sql()?;

        let started = Instant::now();
        let mut q = sqlx::query(&sql_result.query);
        for p in sql_result.params.iter() {
            q = bind_param(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;

        if self.log_queries {
            tracing::debug!(
                sql = %sql_result.query,
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "store query"
            );
        }

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            match row.try_get::<Value, _>("row")? {
                Value::Object(map) => results.push(map),
                other => {
                    return Err(StoreError::Decode(format!("expected JSON object row, got {}", other)));
                }
            }
        }
        Ok(results)
    }

    async fn probe(&self, collection: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        // Validates the identifier the same way the query path does
        Filter::new(collection)?;

        let rows = sqlx::query(
            "SELECT column_name::text AS column_name
             FROM information_schema.columns
             WHERE table_schema = current_schema() AND table_name = $1",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        let mut fields = BTreeSet::new();
        for row in rows {
            fields.insert(row.try_get::<String, _>("column_name")?);
        }
        Ok(if fields.is_empty() { None } else { Some(fields) })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Arrays are expanded by FilterWhere; objects bind as JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
