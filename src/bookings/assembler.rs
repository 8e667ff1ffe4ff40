use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::normalizer::BookingView;

/// Status key for bookings whose status is missing.
pub const UNKNOWN_STATUS: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingsPayload {
    pub success: bool,
    pub data: Vec<BookingView>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Diagnostics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub client_id: String,
    pub total_bookings: usize,
    pub booking_statuses: BTreeMap<String, usize>,
    pub latest_booking: Option<BookingView>,
    pub timestamp: String,
}

/// Bookings per status tag.
pub fn status_tally(views: &[BookingView]) -> BTreeMap<String, usize> {
    let mut tally = BTreeMap::new();
    for view in views {
        let key = match &view.status {
            Value::String(status) => status.clone(),
            Value::Null => UNKNOWN_STATUS.to_string(),
            other => other.to_string(),
        };
        *tally.entry(key).or_insert(0) += 1;
    }
    tally
}

pub fn assemble(
    owner_id: &str,
    views: Vec<BookingView>,
    diagnostics: bool,
    now: DateTime<Utc>,
) -> BookingsPayload {
    let debug = diagnostics.then(|| Diagnostics {
        client_id: owner_id.to_string(),
        total_bookings: views.len(),
        booking_statuses: status_tally(&views),
        latest_booking: views.first().cloned(),
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    });

    BookingsPayload {
        success: true,
        count: views.len(),
        data: views,
        debug,
    }
}
