use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{is_valid_identifier, quote_identifier, FilterOrderInfo, JoinSpec, SqlResult};

/// Compiles one filtered read of a table into parameterized SQL.
pub struct Filter {
    table_name: String,
    where_data: Option<Value>,
    order_data: Vec<FilterOrderInfo>,
    join: Option<JoinSpec>,
    limit: Option<i32>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            where_data: None,
            order_data: vec![],
            join: None,
            limit: None,
        })
    }

    pub fn where_clause(&mut self, conditions: Value) -> Result<&mut Self, FilterError> {
        FilterWhere::validate(&conditions)?;
        self.where_data = Some(conditions);
        Ok(self)
    }

    pub fn order_by(&mut self, order: Vec<FilterOrderInfo>) -> Result<&mut Self, FilterError> {
        for info in &order {
            if !is_valid_identifier(&info.column) {
                return Err(FilterError::InvalidColumn(format!("Invalid order column: {}", info.column)));
            }
        }
        self.order_data = order;
        Ok(self)
    }

    pub fn join(&mut self, join: JoinSpec) -> Result<&mut Self, FilterError> {
        Self::validate_table_name(&join.relation)?;
        for column in [&join.local_column, &join.foreign_column, &join.alias] {
            if !is_valid_identifier(column) {
                return Err(FilterError::InvalidColumn(format!("Invalid join column: {}", column)));
            }
        }
        self.join = Some(join);
        Ok(self)
    }

    pub fn limit(&mut self, limit: i32) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i32::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        Ok(self)
    }

    /// Each result row comes back as a single JSON object in the `row` column.
    pub fn to_json_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = match self.where_data {
            Some(ref where_data) => FilterWhere::generate(where_data, 0)?,
            None => FilterWhere::generate_empty(),
        };
        let inner = format!(
            "SELECT {} FROM {} WHERE {}",
            self.build_select_clause(),
            quote_identifier(&self.table_name),
            where_clause
        );

        // Ordering applies to the outer select; a subquery's ORDER BY is not
        // guaranteed to survive.
        let query = [
            format!("SELECT row_to_json(t) AS row FROM ({}) t", inner),
            FilterOrder::generate(&self.order_data),
            self.limit.map(|l| format!("LIMIT {}", l)).unwrap_or_default(),
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        Ok(SqlResult { query, params })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() { return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string())); }
        if !is_valid_identifier(name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn build_select_clause(&self) -> String {
        let table = quote_identifier(&self.table_name);
        let mut parts = vec![format!("{}.*", table)];

        // Correlated subquery keeps one output row per base row even when the
        // related row is missing (embedded as NULL).
        if let Some(join) = &self.join {
            parts.push(format!(
                "(SELECT row_to_json(j) FROM {rel} j WHERE j.{fk} = {table}.{lk} LIMIT 1) AS {alias}",
                rel = quote_identifier(&join.relation),
                fk = quote_identifier(&join.foreign_column),
                lk = quote_identifier(&join.local_column),
                alias = quote_identifier(&join.alias),
                table = table,
            ));
        }

        parts.join(", ")
    }
}
