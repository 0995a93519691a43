//! Fire-and-forget delivery of events to the remote collector
//!
//! `handle` only enqueues. A background task batches events and POSTs them;
//! failures are logged and dropped so the CLI is never blocked or changed.

use reqwest::Client;
use serde_json::{json, Map, Value};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

use crate::bus::Subscriber;
use crate::config::TelemetryConfig;
use crate::context::CommonProperties;
use crate::error::{Result, TelemetryError};
use crate::event::TelemetryEvent;

/// Default collector endpoint
pub const DEFAULT_ENDPOINT: &str = "https://telemetry.hatch-cli.dev/v1/events";

/// Send once this many events are queued
const BATCH_SIZE: usize = 10;

/// Send whatever is queued at least this often
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

pub struct CollectorSubscriber {
    common: CommonProperties,
    debug: bool,
    sender: Mutex<Option<mpsc::UnboundedSender<Value>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CollectorSubscriber {
    /// Create the subscriber and spawn its sender task on the current runtime
    ///
    /// In debug mode nothing is spawned; events are printed to stderr.
    pub fn spawn(config: &TelemetryConfig, common: CommonProperties) -> Result<Self> {
        if config.debug {
            return Ok(Self {
                common,
                debug: true,
                sender: Mutex::new(None),
                worker: Mutex::new(None),
            });
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let (tx, rx) = mpsc::unbounded_channel();
        let worker = runtime.spawn(batch_sender(rx, endpoint));

        Ok(Self {
            common,
            debug: false,
            sender: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Close the queue and wait up to `timeout` for the final batch to go out
    pub async fn shutdown(&self, timeout: Duration) {
        drop(lock(&self.sender).take());

        let worker = lock(&self.worker).take();
        if let Some(worker) = worker {
            if tokio::time::timeout(timeout, worker).await.is_err() {
                debug!("telemetry flush timed out");
            }
        }
    }

    /// Event as sent on the wire: `{ "event": name, "properties": {...} }`
    fn payload(&self, event: &TelemetryEvent) -> Value {
        let mut properties: Map<String, Value> = event
            .properties()
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.common.merge_into(&mut properties);
        properties
            .entry("timestamp")
            .or_insert_with(|| json!(chrono::Utc::now().to_rfc3339()));

        json!({
            "event": event.name(),
            "properties": properties,
        })
    }
}

impl Subscriber for CollectorSubscriber {
    fn handle(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
        let payload = self.payload(event);

        if self.debug {
            let pretty = serde_json::to_string_pretty(&payload).map_err(TelemetryError::from)?;
            eprintln!("Telemetry event (debug mode, not sent):");
            eprintln!("{}", pretty);
            return Ok(());
        }

        let sender = lock(&self.sender);
        let sender = sender.as_ref().ok_or(TelemetryError::Closed)?;
        sender.send(payload).map_err(|_| TelemetryError::Closed)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}

/// Background task that batches and sends events until the queue closes
async fn batch_sender(mut rx: mpsc::UnboundedReceiver<Value>, endpoint: String) {
    let client = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default();

    let mut batch: Vec<Value> = Vec::new();
    let mut tick_interval = interval(FLUSH_INTERVAL);

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(event) => {
                    batch.push(event);
                    if batch.len() >= BATCH_SIZE {
                        send_batch(&client, &endpoint, &batch).await;
                        batch.clear();
                    }
                }
                None => {
                    send_batch(&client, &endpoint, &batch).await;
                    break;
                }
            },
            _ = tick_interval.tick() => {
                if !batch.is_empty() {
                    send_batch(&client, &endpoint, &batch).await;
                    batch.clear();
                }
            }
        }
    }
}

/// POST one batch; errors are logged, never returned
async fn send_batch(client: &Client, endpoint: &str, events: &[Value]) {
    if events.is_empty() {
        return;
    }

    match client.post(endpoint).json(events).send().await {
        Ok(response) if response.status().is_success() => {
            debug!(count = events.len(), "telemetry batch sent");
        }
        Ok(response) => warn!(status = %response.status(), "telemetry collector rejected batch"),
        Err(e) => warn!(error = %e, "telemetry send error"),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
