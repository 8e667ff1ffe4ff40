/// Something the access layer did or refused to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessEvent {
    Authenticated {
        user_id: String,
    },
    AuthenticationFailed {
        reason: String,
    },
    InvalidRequest {
        reason: String,
    },
    /// Security-relevant: a verified caller asked for someone else's records.
    AccessDenied {
        requested_owner_id: String,
        caller_id: String,
    },
    SchemaResolved {
        collection: String,
        field: String,
        column: Option<String>,
    },
    RecordsFetched {
        collection: String,
        owner_id: Option<String>,
        count: usize,
    },
    StoreFailed {
        collection: String,
        message: String,
    },
}

pub trait AccessObserver: Send + Sync {
    fn record(&self, event: AccessEvent);
}
