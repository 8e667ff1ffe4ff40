use serde::Serialize;
use serde_json::{Number, Value};

use crate::database::Row;

pub const UNKNOWN_PROPERTY: &str = "Unknown Property";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";
pub const DEFAULT_CATEGORY: &str = "autre";

/// Denormalized property columns on older booking rows are spelled
/// `property_<field>`.
const LEGACY_PREFIX: &str = "property_";

/// Canonical booking shape exposed by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingView {
    pub id: Value,
    pub check_in_date: Value,
    pub check_out_date: Value,
    pub total_price: Value,
    pub status: Value,
    pub guest_count: Value,
    pub special_requests: Value,
    pub full_name: Value,
    pub email_or_phone: Value,
    pub travel_type: Value,
    pub created_at: Value,
    pub updated_at: Value,
    pub properties: PropertyView,
}

/// Property sub-object of a [`BookingView`]. Always present; every field
/// except `id` and `owner_id` has a default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub name: String,
    pub location: String,
    pub images: Vec<String>,
    pub price_per_night: Number,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<Value>,
}

/// First source yielding a usable value, in priority order. Absent and `null`
/// entries are skipped, as are values `extract` rejects.
pub fn prioritized<'v, T>(
    sources: impl IntoIterator<Item = Option<&'v Value>>,
    extract: impl Fn(&'v Value) -> Option<T>,
) -> Option<T> {
    sources
        .into_iter()
        .flatten()
        .filter(|value| !value.is_null())
        .find_map(extract)
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        // Postgres numerics sometimes arrive as strings.
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    }
}

fn images(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
}

fn any(value: &Value) -> Option<Value> {
    Some(value.clone())
}

/// Folds a joined booking row into a [`BookingView`].
///
/// Each property field is looked up on the joined property first, then on
/// the legacy `property_<field>` column of the booking, then defaulted.
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    join_alias: String,
    reference_column: String,
}

impl ResultNormalizer {
    pub fn new(join_alias: impl Into<String>, reference_column: impl Into<String>) -> Self {
        Self { join_alias: join_alias.into(), reference_column: reference_column.into() }
    }

    pub fn normalize_all(&self, rows: &[Row]) -> Vec<BookingView> {
        rows.iter().map(|row| self.normalize(row)).collect()
    }

    pub fn normalize(&self, row: &Row) -> BookingView {
        let field = |name: &str| row.get(name).cloned().unwrap_or(Value::Null);

        BookingView {
            id: field("id"),
            check_in_date: field("check_in_date"),
            check_out_date: field("check_out_date"),
            total_price: field("total_price"),
            status: field("status"),
            guest_count: field("guest_count"),
            special_requests: field("special_requests"),
            full_name: field("full_name"),
            email_or_phone: field("email_or_phone"),
            travel_type: field("travel_type"),
            created_at: field("created_at"),
            updated_at: field("updated_at"),
            properties: self.property(row),
        }
    }

    fn property(&self, row: &Row) -> PropertyView {
        let joined = row.get(&self.join_alias).and_then(Value::as_object);
        let chain = |name: &str| {
            let legacy = format!("{}{}", LEGACY_PREFIX, name);
            [joined.and_then(|p| p.get(name)), row.get(&legacy)]
        };

        PropertyView {
            id: prioritized([joined.and_then(|p| p.get("id")), row.get(&self.reference_column)], any),
            name: prioritized(chain("name"), text).unwrap_or_else(|| UNKNOWN_PROPERTY.to_string()),
            location: prioritized(chain("location"), text).unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            images: prioritized(chain("images"), images).unwrap_or_default(),
            price_per_night: prioritized(chain("price_per_night"), number).unwrap_or_else(|| Number::from(0)),
            category: prioritized(chain("category"), text).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            owner_id: prioritized(chain("owner_id"), any),
        }
    }
}
