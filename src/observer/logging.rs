use super::traits::{AccessEvent, AccessObserver};

/// Emits access events through `tracing`. Denials always log on the
/// `security` target; success-path lines are only emitted with audit logging.
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    audit: bool,
}

impl LoggingObserver {
    pub fn new(audit: bool) -> Self {
        Self { audit }
    }
}

impl AccessObserver for LoggingObserver {
    fn record(&self, event: AccessEvent) {
        match event {
            AccessEvent::Authenticated { user_id } => {
                if self.audit {
                    tracing::info!(user_id = %user_id, "caller authenticated");
                }
            }
            AccessEvent::AuthenticationFailed { reason } => {
                tracing::warn!(reason = %reason, "authentication failed");
            }
            AccessEvent::InvalidRequest { reason } => {
                tracing::warn!(reason = %reason, "rejected request");
            }
            AccessEvent::AccessDenied { requested_owner_id, caller_id } => {
                tracing::warn!(
                    target: "security",
                    requested_owner_id = %requested_owner_id,
                    caller_id = %caller_id,
                    "unauthorized booking access attempt"
                );
            }
            AccessEvent::SchemaResolved { collection, field, column } => match column {
                Some(column) => tracing::debug!(%collection, %field, %column, "semantic field resolved"),
                None => tracing::debug!(%collection, %field, "semantic field absent, filter skipped"),
            },
            AccessEvent::RecordsFetched { collection, owner_id, count } => {
                if self.audit {
                    tracing::info!(%collection, owner_id = ?owner_id, count, "records fetched");
                }
            }
            AccessEvent::StoreFailed { collection, message } => {
                tracing::error!(%collection, error = %message, "store query failed");
            }
        }
    }
}
