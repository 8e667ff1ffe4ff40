//! Observability collaborator for the booking access layer.
//!
//! Core logic reports what happened as [`AccessEvent`]s; the observer decides
//! how (and whether) to emit them. Production wiring uses [`LoggingObserver`],
//! tests use [`RecordingObserver`] to assert on events without any I/O.

pub mod logging;
pub mod recording;
pub mod traits;

pub use logging::LoggingObserver;
pub use recording::RecordingObserver;
pub use traits::{AccessEvent, AccessObserver};
