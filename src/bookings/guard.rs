use crate::auth::CallerIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// Bookings are visible to their owner only. Comparison is byte-exact and
/// case-sensitive; there is no shared or delegated visibility.
pub fn authorize(requested_owner_id: &str, caller: &CallerIdentity) -> Access {
    if requested_owner_id == caller.id {
        Access::Allow
    } else {
        Access::Deny
    }
}
