//! Decides which invocation fields become event properties
//!
//! Property keys come from a closed vocabulary and are sent as-is. Every
//! value that started life in argv goes through the hasher first.

use std::sync::Arc;

use hatch_core::{CommandCatalog, InvocationRecord};
use tracing::debug;

use crate::event::{
    TelemetryEvent, ARGUMENT_PROPERTY, DETAIL_PROPERTY, EXCEPTION_EVENT, EXCEPTION_TYPE_PROPERTY,
    SUB_LEVEL_COMMAND_EVENT, TOP_LEVEL_COMMAND_EVENT, VERB_PROPERTY,
};
use crate::failure::FailureReport;
use crate::hasher::{HashFn, Sha256Hasher};

/// Maps pipeline inputs to the events that may leave the process
pub trait TelemetryFilter: Send + Sync {
    fn invocation_events(&self, record: &InvocationRecord) -> Vec<TelemetryEvent>;

    fn failure_events(&self, failure: &FailureReport) -> Vec<TelemetryEvent>;
}

/// Emits nothing. Installed on a fresh bus until a real filter is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockAllFilter;

impl TelemetryFilter for BlockAllFilter {
    fn invocation_events(&self, _record: &InvocationRecord) -> Vec<TelemetryEvent> {
        Vec::new()
    }

    fn failure_events(&self, _failure: &FailureReport) -> Vec<TelemetryEvent> {
        Vec::new()
    }
}

/// The production filter: hashed verb, sub-argument and option values
pub struct HashingFilter {
    hash: HashFn,
    catalog: Arc<CommandCatalog>,
}

impl HashingFilter {
    pub fn new(hash: HashFn, catalog: Arc<CommandCatalog>) -> Self {
        Self { hash, catalog }
    }

    /// Filter using [`Sha256Hasher::hash_with_normalized_casing`]
    pub fn sha256(catalog: Arc<CommandCatalog>) -> Self {
        Self::new(Sha256Hasher::hash_with_normalized_casing, catalog)
    }
}

impl TelemetryFilter for HashingFilter {
    fn invocation_events(&self, record: &InvocationRecord) -> Vec<TelemetryEvent> {
        let verb = (self.hash)(record.verb());
        let mut events = vec![TelemetryEvent::new(
            TOP_LEVEL_COMMAND_EVENT,
            [(VERB_PROPERTY, verb.clone())],
        )];

        if let Some(argument) = record.sub_argument() {
            events.push(TelemetryEvent::new(
                SUB_LEVEL_COMMAND_EVENT,
                [
                    (VERB_PROPERTY, verb.clone()),
                    (ARGUMENT_PROPERTY, (self.hash)(argument)),
                ],
            ));
        }

        // One event per option, never merged: consumers count them.
        for option in record.options() {
            let key = match self.catalog.reportable_option(&option.key) {
                Some(key) if key != VERB_PROPERTY => key,
                _ => {
                    debug!(option_count = record.options().len(), "dropping unreportable option");
                    continue;
                }
            };

            events.push(TelemetryEvent::new(
                SUB_LEVEL_COMMAND_EVENT,
                [
                    (VERB_PROPERTY, verb.clone()),
                    (key, (self.hash)(&option.value)),
                ],
            ));
        }

        events
    }

    fn failure_events(&self, failure: &FailureReport) -> Vec<TelemetryEvent> {
        vec![TelemetryEvent::new(
            EXCEPTION_EVENT,
            [
                (EXCEPTION_TYPE_PROPERTY, failure.kind()),
                (DETAIL_PROPERTY, failure.detail()),
            ],
        )]
    }
}
