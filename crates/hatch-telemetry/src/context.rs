//! Properties attached to every event the collector transmits
//!
//! None of these derive from argv: a salted machine hash, a per-process
//! session id and coarse platform facts.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::is_ci;
use crate::machine_id::get_or_generate_machine_id;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonProperties {
    pub machine_id: String,
    pub session_id: String,
    pub os: String,
    pub arch: String,
    pub cli_version: String,
    pub is_ci: bool,
}

impl CommonProperties {
    /// Gather properties for this process
    pub fn collect(cli_version: &str) -> Self {
        let machine_id = get_or_generate_machine_id().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "machine id unavailable");
            "unknown".to_string()
        });

        Self {
            machine_id,
            session_id: Uuid::new_v4().to_string(),
            os: get_os_string(),
            arch: get_arch_string(),
            cli_version: cli_version.to_string(),
            is_ci: is_ci(),
        }
    }

    /// Add these properties to `properties` without overwriting any key
    pub fn merge_into(&self, properties: &mut Map<String, Value>) {
        if let Ok(Value::Object(common)) = serde_json::to_value(self) {
            for (key, value) in common {
                properties.entry(key).or_insert(value);
            }
        }
    }
}

/// Get OS string
fn get_os_string() -> String {
    if cfg!(target_os = "linux") {
        "linux".to_string()
    } else if cfg!(target_os = "macos") {
        "macos".to_string()
    } else if cfg!(target_os = "windows") {
        "windows".to_string()
    } else {
        "unknown".to_string()
    }
}

/// Get architecture string
fn get_arch_string() -> String {
    if cfg!(target_arch = "x86_64") {
        "x64".to_string()
    } else if cfg!(target_arch = "aarch64") {
        "arm64".to_string()
    } else {
        "unknown".to_string()
    }
}
