//! In-memory subscriber for assertions in tests

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::bus::Subscriber;
use crate::event::TelemetryEvent;

/// Records every event it receives. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSubscriber {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl RecordingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.log().clone()
    }

    pub fn events_named(&self, name: &str) -> Vec<TelemetryEvent> {
        self.log().iter().filter(|e| e.name() == name).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.log().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log().is_empty()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    fn log(&self) -> MutexGuard<'_, Vec<TelemetryEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Subscriber for RecordingSubscriber {
    fn handle(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
        self.log().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
