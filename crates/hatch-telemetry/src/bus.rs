//! Process-wide publish/subscribe hub for telemetry events
//!
//! One bus is built by the entry point and handed to whatever publishes.
//! Delivery is synchronous and in registration order. A failing subscriber
//! (error or panic) is logged and skipped; the publisher never sees it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hatch_core::InvocationRecord;
use tracing::{debug, warn};

use crate::event::TelemetryEvent;
use crate::failure::FailureReport;
use crate::filter::{BlockAllFilter, TelemetryFilter};

/// A consumer of published events
pub trait Subscriber: Send + Sync {
    fn handle(&self, event: &TelemetryEvent) -> anyhow::Result<()>;

    /// Name used in logs when delivery fails
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<F> Subscriber for F
where
    F: Fn(&TelemetryEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
        self(event)
    }
}

pub struct EventBus {
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
    filter: Mutex<Arc<dyn TelemetryFilter>>,
}

impl EventBus {
    /// A bus with no subscribers and the block-all filter
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            filter: Mutex::new(Arc::new(BlockAllFilter)),
        }
    }

    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) {
        lock(&self.subscribers).push(subscriber);
    }

    pub fn configure_filter(&self, filter: Arc<dyn TelemetryFilter>) {
        *lock(&self.filter) = filter;
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Deliver `event` to every subscriber registered so far
    pub fn publish(&self, event: &TelemetryEvent) {
        // Snapshot so a subscriber may publish or subscribe without deadlocking.
        let subscribers = lock(&self.subscribers).clone();
        debug!(event = event.name(), subscribers = subscribers.len(), "publishing telemetry event");

        for subscriber in subscribers {
            match panic::catch_unwind(AssertUnwindSafe(|| subscriber.handle(event))) {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(
                    subscriber = subscriber.name(),
                    event = event.name(),
                    error = %error,
                    "telemetry subscriber failed"
                ),
                Err(_) => warn!(
                    subscriber = subscriber.name(),
                    event = event.name(),
                    "telemetry subscriber panicked"
                ),
            }
        }
    }

    /// Run the installed filter over an invocation and publish the result
    pub fn publish_invocation(&self, record: &InvocationRecord) {
        let events = self.current_filter().invocation_events(record);
        for event in &events {
            self.publish(event);
        }
    }

    /// Run the installed filter over a captured failure and publish the result
    pub fn publish_failure(&self, failure: &FailureReport) {
        let events = self.current_filter().failure_events(failure);
        for event in &events {
            self.publish(event);
        }
    }

    fn current_filter(&self) -> Arc<dyn TelemetryFilter> {
        Arc::clone(&lock(&self.filter))
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::RecordingSubscriber;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample(name: &str) -> TelemetryEvent {
        TelemetryEvent::new(name, [("verb", "x")])
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(&sample("a"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_delivery_follows_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            bus.subscribe(Arc::new(move |_: &TelemetryEvent| -> anyhow::Result<()> {
                order.lock().unwrap().push(id);
                Ok(())
            }));
        }

        bus.publish(&sample("a"));
        bus.publish(&sample("b"));
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_failing_subscriber_does_not_block_the_next_one() {
        let bus = EventBus::new();
        let recorder = RecordingSubscriber::new();

        bus.subscribe(Arc::new(|_: &TelemetryEvent| -> anyhow::Result<()> {
            bail!("collector offline")
        }));
        bus.subscribe(Arc::new(recorder.clone()));

        bus.publish(&sample("a"));
        bus.publish(&sample("b"));
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let bus = EventBus::new();
        let recorder = RecordingSubscriber::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counted = Arc::clone(&calls);
        bus.subscribe(Arc::new(move |_: &TelemetryEvent| -> anyhow::Result<()> {
            counted.fetch_add(1, Ordering::SeqCst);
            panic!("subscriber bug");
        }));
        bus.subscribe(Arc::new(recorder.clone()));

        bus.publish(&sample("a"));
        bus.publish(&sample("b"));
        bus.publish(&sample("c"));

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let names: Vec<_> = recorder.events().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_default_filter_blocks_invocations() {
        let bus = EventBus::new();
        let recorder = RecordingSubscriber::new();
        bus.subscribe(Arc::new(recorder.clone()));

        bus.publish_invocation(&InvocationRecord::empty());
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_subscriber_may_publish_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let recorder = RecordingSubscriber::new();

        let inner = Arc::clone(&bus);
        bus.subscribe(Arc::new(move |event: &TelemetryEvent| -> anyhow::Result<()> {
            if event.name() == "outer" {
                inner.publish(&sample("inner"));
            }
            Ok(())
        }));
        bus.subscribe(Arc::new(recorder.clone()));

        bus.publish(&sample("outer"));
        let names: Vec<_> = recorder.events().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["inner", "outer"]);
    }
}
