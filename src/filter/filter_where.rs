use serde_json::Value;

use super::error::FilterError;
use super::types::{is_valid_identifier, quote_identifier, FilterOp, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<FilterWhereInfo>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Render `where_data` into a SQL predicate whose placeholders start after
    /// `starting_param_index`.
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(where_data)
    }

    pub fn generate_empty() -> (String, Vec<Value>) {
        ("1=1".to_string(), vec![])
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn build(&mut self, where_data: &Value) -> Result<(String, Vec<Value>), FilterError> {
        self.parse_where_data(where_data)?;

        let mut sql_conditions = vec![];
        let conditions_snapshot = std::mem::take(&mut self.conditions);
        for condition in &conditions_snapshot {
            sql_conditions.push(self.build_sql_condition(condition)?);
        }
        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        Ok((where_clause, std::mem::take(&mut self.param_values)))
    }

    fn parse_where_data(&mut self, where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null => Ok(()),
            Value::Object(obj) => {
                for (key, value) in obj {
                    if key.starts_with('$') {
                        self.parse_logical_operator(key, value)?;
                    } else {
                        self.parse_field_condition(key, value)?;
                    }
                }
                Ok(())
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn parse_logical_operator(&mut self, op: &str, value: &Value) -> Result<(), FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    // Empty conjunction holds, empty disjunction does not
                    let sql = if op == "$and" { "1=1" } else { "1=0" };
                    self.push_raw(sql.to_string());
                    return Ok(());
                }
                let mut sql_parts = Vec::new();
                for v in arr {
                    let (sql, params) = Self::generate(v, self.param_index)?;
                    self.param_index += params.len();
                    self.param_values.extend(params);
                    sql_parts.push(format!("({})", sql));
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                self.push_raw(format!("({})", sql_parts.join(joiner)));
                Ok(())
            }
            "$not" => {
                let (sql, params) = Self::generate(value, self.param_index)?;
                self.param_index += params.len();
                self.param_values.extend(params);
                self.push_raw(format!("NOT ({})", sql));
                Ok(())
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&mut self, field: &str, value: &Value) -> Result<(), FilterError> {
        if !is_valid_identifier(field) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", field)));
        }
        if let Value::Object(obj) = value {
            for (op_key, op_val) in obj {
                let operator = FilterOp::from_key(op_key)?;
                self.conditions.push(FilterWhereInfo { column: field.to_string(), operator, data: op_val.clone() });
            }
        } else {
            // Implicit equality: { field: value }
            self.conditions.push(FilterWhereInfo { column: field.to_string(), operator: FilterOp::Eq, data: value.clone() });
        }
        Ok(())
    }

    fn push_raw(&mut self, sql: String) {
        self.conditions.push(FilterWhereInfo { column: sql, operator: FilterOp::Raw, data: Value::Null });
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        if condition.operator == FilterOp::Raw {
            return Ok(condition.column.clone());
        }

        let quoted_column = quote_identifier(&condition.column);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() { Ok(format!("{} IS NULL", quoted_column)) }
                else { Ok(format!("{} = {}", quoted_column, self.param(condition.data.clone()))) }
            }
            FilterOp::Ne => {
                if condition.data.is_null() { Ok(format!("{} IS NOT NULL", quoted_column)) }
                else { Ok(format!("{} <> {}", quoted_column, self.param(condition.data.clone()))) }
            }
            FilterOp::Gt => Ok(format!("{} > {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Gte => Ok(format!("{} >= {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Lt => Ok(format!("{} < {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Lte => Ok(format!("{} <= {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::Like => Ok(format!("{} LIKE {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::ILike => Ok(format!("{} ILIKE {}", quoted_column, self.param(condition.data.clone()))),
            FilterOp::In => {
                if let Value::Array(values) = &condition.data {
                    if values.is_empty() { return Ok("1=0".to_string()); }
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", quoted_column, params.join(", ")))
                } else {
                    Ok(format!("{} = {}", quoted_column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Between => match &condition.data {
                Value::Array(values) if values.len() == 2 => {
                    let low = self.param(values[0].clone());
                    let high = self.param(values[1].clone());
                    Ok(format!("{} BETWEEN {} AND {}", quoted_column, low, high))
                }
                _ => Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Raw => Ok(condition.column.clone()),
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
