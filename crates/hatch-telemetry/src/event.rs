//! Telemetry event data structures

use serde::Serialize;
use std::collections::BTreeMap;

/// Emitted once per invocation with the hashed verb
pub const TOP_LEVEL_COMMAND_EVENT: &str = "toplevelparser/command";
/// Emitted for the sub-argument and once per reported option
pub const SUB_LEVEL_COMMAND_EVENT: &str = "sublevelparser/command";
/// Emitted by the failure capture hook
pub const EXCEPTION_EVENT: &str = "mainCatchException/exception";
/// Emitted by installers after a successful install
pub const INSTALL_SUCCESS_EVENT: &str = "install/reportsuccess";

pub const VERB_PROPERTY: &str = "verb";
pub const ARGUMENT_PROPERTY: &str = "argument";
pub const EXCEPTION_TYPE_PROPERTY: &str = "exceptionType";
pub const DETAIL_PROPERTY: &str = "detail";
pub const EXE_NAME_PROPERTY: &str = "exeName";

/// A named event with string properties. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryEvent {
    #[serde(rename = "event")]
    name: String,
    properties: BTreeMap<String, String>,
}

impl TelemetryEvent {
    pub fn new<I, K, V>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            properties: properties
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}
