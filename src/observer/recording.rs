use std::sync::Mutex;

use super::traits::{AccessEvent, AccessObserver};

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<AccessEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AccessEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn denials(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, AccessEvent::AccessDenied { .. }))
            .count()
    }
}

impl AccessObserver for RecordingObserver {
    fn record(&self, event: AccessEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
