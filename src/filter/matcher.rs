//! In-process evaluation of the filter language against JSON rows.
//!
//! Mirrors the SQL generated by [`FilterWhere`](super::filter_where::FilterWhere)
//! closely enough for stores that hold rows in memory: comparisons involving a
//! missing or null column are false, `$eq: null` means "missing or null", and
//! nulls sort after every other value (as Postgres does).

use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{is_valid_identifier, FilterOp, FilterOrderInfo, SortDirection};

pub struct FilterMatcher;

impl FilterMatcher {
    pub fn matches(where_data: &Value, row: &Map<String, Value>) -> Result<bool, FilterError> {
        match where_data {
            Value::Null => Ok(true),
            Value::Object(obj) => {
                for (key, value) in obj {
                    let holds = if key.starts_with('$') {
                        Self::logical(key, value, row)?
                    } else {
                        Self::field(key, value, row)?
                    };
                    if !holds {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn logical(op: &str, value: &Value, row: &Map<String, Value>) -> Result<bool, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut results = Vec::with_capacity(arr.len());
                for v in arr {
                    results.push(Self::matches(v, row)?);
                }
                Ok(if op == "$and" { results.iter().all(|r| *r) } else { results.iter().any(|r| *r) })
            }
            "$not" => Ok(!Self::matches(value, row)?),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn field(column: &str, value: &Value, row: &Map<String, Value>) -> Result<bool, FilterError> {
        if !is_valid_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        let actual = row.get(column).unwrap_or(&Value::Null);
        match value {
            Value::Object(ops) => {
                for (op_key, op_val) in ops {
                    let operator = FilterOp::from_key(op_key)?;
                    if !Self::apply(&operator, actual, op_val)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Self::apply(&FilterOp::Eq, actual, value),
        }
    }

    fn apply(operator: &FilterOp, actual: &Value, expected: &Value) -> Result<bool, FilterError> {
        let ordered = |accept: fn(Ordering) -> bool| {
            scalar_cmp(actual, expected).map(accept).unwrap_or(false)
        };

        Ok(match operator {
            FilterOp::Eq if expected.is_null() => actual.is_null(),
            FilterOp::Ne if expected.is_null() => !actual.is_null(),
            FilterOp::Eq => ordered(|o| o == Ordering::Equal),
            FilterOp::Ne => ordered(|o| o != Ordering::Equal),
            FilterOp::Gt => ordered(|o| o == Ordering::Greater),
            FilterOp::Gte => ordered(|o| o != Ordering::Less),
            FilterOp::Lt => ordered(|o| o == Ordering::Less),
            FilterOp::Lte => ordered(|o| o != Ordering::Greater),
            FilterOp::Like | FilterOp::ILike => match (actual.as_str(), expected.as_str()) {
                (Some(text), Some(pattern)) => {
                    if *operator == FilterOp::ILike {
                        like(&pattern.to_lowercase(), &text.to_lowercase())
                    } else {
                        like(pattern, text)
                    }
                }
                _ => false,
            },
            FilterOp::In => match expected {
                Value::Array(values) => values
                    .iter()
                    .any(|v| scalar_cmp(actual, v) == Some(Ordering::Equal)),
                other => scalar_cmp(actual, other) == Some(Ordering::Equal),
            },
            FilterOp::Between => match expected {
                Value::Array(values) if values.len() == 2 => {
                    scalar_cmp(actual, &values[0]).map(|o| o != Ordering::Less).unwrap_or(false)
                        && scalar_cmp(actual, &values[1]).map(|o| o != Ordering::Greater).unwrap_or(false)
                }
                _ => return Err(FilterError::InvalidOperatorData("$between requires array with 2 values".to_string())),
            },
            FilterOp::Raw => return Err(FilterError::UnsupportedOperator("raw SQL".to_string())),
        })
    }

    /// Multi-key row comparison following `order`, nulls last in ascending order.
    pub fn compare_rows(a: &Map<String, Value>, b: &Map<String, Value>, order: &[FilterOrderInfo]) -> Ordering {
        for info in order {
            let left = a.get(&info.column).unwrap_or(&Value::Null);
            let right = b.get(&info.column).unwrap_or(&Value::Null);
            let ordering = match info.sort {
                SortDirection::Asc => compare_values(left, right),
                SortDirection::Desc => compare_values(right, left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Total order over JSON values used for sorting: null is the greatest value,
/// values of different kinds compare by kind.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    scalar_cmp(a, b).unwrap_or_else(|| kind_rank(a).cmp(&kind_rank(b)))
}

fn scalar_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// SQL LIKE: `%` matches any run, `_` matches one character.
fn like(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    like_chars(&pattern, &text)
}

/// Greedy wildcard scan: on mismatch, resume after the last `%` with one more
/// text character consumed. Linear in `pattern.len() * text.len()`.
fn like_chars(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Pattern index after the last `%`, and the text index it resumes from.
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                resume = Some((p, t));
            }
            Some(&c) if c == '_' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((after, from)) => {
                    p = after;
                    t = from + 1;
                    resume = Some((after, t));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn implicit_equality() {
        let r = row(json!({ "client_id": "u1", "status": "confirmed" }));
        assert!(FilterMatcher::matches(&json!({ "client_id": "u1" }), &r).unwrap());
        assert!(!FilterMatcher::matches(&json!({ "client_id": "U1" }), &r).unwrap());
    }

    #[test]
    fn missing_column_never_compares_equal() {
        let r = row(json!({ "name": "Yourte" }));
        assert!(!FilterMatcher::matches(&json!({ "published": true }), &r).unwrap());
        assert!(FilterMatcher::matches(&json!({ "published": null }), &r).unwrap());
    }

    #[test]
    fn ilike_and_or() {
        let r = row(json!({ "name": "Cabane perchée", "location": "Dordogne" }));
        let where_data = json!({
            "$or": [
                { "name": { "$ilike": "%CABANE%" } },
                { "location": { "$ilike": "%cabane%" } }
            ]
        });
        assert!(FilterMatcher::matches(&where_data, &r).unwrap());
        assert!(!FilterMatcher::matches(&json!({ "location": { "$like": "dord%" } }), &r).unwrap());
        assert!(FilterMatcher::matches(&json!({ "location": { "$like": "Dord_gne" } }), &r).unwrap());
    }

    #[test]
    fn like_wildcards() {
        assert!(like("%", ""));
        assert!(like("a%", "a"));
        assert!(like("%b%d", "abcd"));
        assert!(like("a_c%", "abcdef"));
        assert!(!like("a_c", "ac"));
        assert!(!like("%x%", "abc"));
        assert!(like("%ab%ab", "xabyabab"));
    }

    #[test]
    fn many_wildcards_on_long_text_stay_linear() {
        let text = "a".repeat(4000);
        let miss = format!("{}b", "%".repeat(64));
        let hit = format!("{}a", "%".repeat(64));
        assert!(!like(&miss, &text));
        assert!(like(&hit, &text));

        let r = row(json!({ "name": "x".repeat(200), "location": "y".repeat(200) }));
        let where_data = json!({
            "$or": [
                { "name": { "$ilike": "%%%%%%%%%%%%%%%%%%%%b" } },
                { "location": { "$ilike": "%%%%%%%%%%%%%%%%%%%%b" } }
            ]
        });
        assert!(!FilterMatcher::matches(&where_data, &r).unwrap());
    }

    #[test]
    fn numeric_ranges() {
        let r = row(json!({ "price_per_night": 120 }));
        assert!(FilterMatcher::matches(&json!({ "price_per_night": { "$gte": 100, "$lte": 120 } }), &r).unwrap());
        assert!(!FilterMatcher::matches(&json!({ "price_per_night": { "$gt": 120.0 } }), &r).unwrap());
        assert!(FilterMatcher::matches(&json!({ "price_per_night": { "$between": [50, 150] } }), &r).unwrap());
    }

    #[test]
    fn sorts_descending_with_nulls_first() {
        let a = row(json!({ "created_at": "2024-01-02" }));
        let b = row(json!({ "created_at": null }));
        let order = [FilterOrderInfo::desc("created_at")];
        assert_eq!(FilterMatcher::compare_rows(&a, &b, &order), Ordering::Greater);
    }
}
