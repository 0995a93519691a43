//! Anonymous machine ID generation with salted hashing

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use crate::config::get_telemetry_dir;

/// Get or generate an anonymous machine ID
///
/// The machine ID is a SHA256 hash of:
/// - MAC address (or hostname as fallback)
/// - Random UUID salt (stored in ~/.hatch/telemetry/salt)
///
/// The ID is stable for a given machine and home directory, and cannot be
/// linked back to the MAC address or hostname without the local salt.
pub fn get_or_generate_machine_id() -> Result<String> {
    let telemetry_dir = get_telemetry_dir()?;
    machine_id_in(&telemetry_dir)
}

fn machine_id_in(telemetry_dir: &Path) -> Result<String> {
    let machine_id_path = telemetry_dir.join("machine_id");

    if let Ok(id) = fs::read_to_string(&machine_id_path) {
        if !id.trim().is_empty() {
            return Ok(id.trim().to_string());
        }
    }

    let salt = get_or_create_salt(telemetry_dir)?;
    let machine_id = salted_hash(&salt, &get_machine_identifier());

    fs::write(&machine_id_path, &machine_id)
        .with_context(|| format!("Failed to cache machine id: {}", machine_id_path.display()))?;

    Ok(machine_id)
}

/// Hex SHA-256 of salt followed by identifier (64 chars)
fn salted_hash(salt: &str, identifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(identifier.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Get a stable machine identifier (MAC address, hostname, or UUID fallback)
fn get_machine_identifier() -> String {
    if let Ok(Some(mac)) = mac_address::get_mac_address() {
        return mac.to_string();
    }

    if let Ok(hostname) = hostname::get() {
        if let Some(hostname) = hostname.to_str().filter(|h| !h.is_empty()) {
            return hostname.to_string();
        }
    }

    // Not stable across runs, but still anonymous
    Uuid::new_v4().to_string()
}

/// Get or create a random salt for hashing
fn get_or_create_salt(telemetry_dir: &Path) -> Result<String> {
    let salt_path = telemetry_dir.join("salt");

    if let Ok(salt) = fs::read_to_string(&salt_path) {
        if !salt.trim().is_empty() {
            return Ok(salt.trim().to_string());
        }
    }

    let salt = Uuid::new_v4().to_string();
    fs::write(&salt_path, &salt).context("Failed to write salt file")?;

    Ok(salt)
}
