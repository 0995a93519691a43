//! Captures a failed top-level dispatch as a telemetry event
//!
//! The dispatch call returns its outcome; [`capture_failures`] inspects it,
//! publishes one exception event for an error or a panic, and hands the
//! outcome back untouched so exit-code behavior is unchanged.

use std::any::Any;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};

use hatch_core::CommandError;

use crate::bus::EventBus;
use crate::redact::Redactor;

/// Kind reported for a panic escaping dispatch
pub const PANIC_KIND: &str = "core::panic";

/// Errors that can be reported with a closed, non-sensitive kind name
pub trait FailureKind: Error {
    /// Fully-qualified kind, sent unhashed
    fn failure_kind(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

impl FailureKind for CommandError {
    fn failure_kind(&self) -> String {
        let variant = match self {
            CommandError::InvalidVerb { .. } => "InvalidVerb",
            CommandError::NotFound { .. } => "NotFound",
            CommandError::Spawn { .. } => "Spawn",
            CommandError::Terminated { .. } => "Terminated",
        };
        format!("{}::{}", std::any::type_name::<Self>(), variant)
    }
}

/// Kind plus redacted detail of one failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    kind: String,
    detail: String,
}

impl FailureReport {
    pub fn from_error<E: FailureKind + ?Sized>(error: &E, redactor: &Redactor) -> Self {
        Self {
            kind: error.failure_kind(),
            detail: redactor.redact(&error_chain(error)),
        }
    }

    pub fn from_panic(payload: &(dyn Any + Send), redactor: &Redactor) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        Self {
            kind: PANIC_KIND.to_string(),
            detail: redactor.redact(&message),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// `error: source: source...`
fn error_chain<E: Error + ?Sized>(error: &E) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

/// Run the top-level dispatch, reporting an error or panic exactly once
pub fn capture_failures<T, E, F>(bus: &EventBus, redactor: &Redactor, dispatch: F) -> Result<T, E>
where
    E: FailureKind,
    F: FnOnce() -> Result<T, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(dispatch)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => {
            bus.publish_failure(&FailureReport::from_error(&error, redactor));
            Err(error)
        }
        Err(payload) => {
            bus.publish_failure(&FailureReport::from_panic(payload.as_ref(), redactor));
            panic::resume_unwind(payload)
        }
    }
}
