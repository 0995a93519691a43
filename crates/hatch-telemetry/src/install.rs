//! Install-success reporting, run by installers outside normal dispatch

use crate::bus::EventBus;
use crate::event::{TelemetryEvent, EXE_NAME_PROPERTY, INSTALL_SUCCESS_EVENT};
use crate::hasher::Sha256Hasher;

/// Publish `install/reportsuccess` with the hashed installer file name
pub fn report_install_success(bus: &EventBus, raw_path: &str) {
    let exe_name = file_name(raw_path);
    bus.publish(&TelemetryEvent::new(
        INSTALL_SUCCESS_EVENT,
        [(EXE_NAME_PROPERTY, Sha256Hasher::hash_with_normalized_casing(exe_name))],
    ));
}

/// Last component of a path in either Windows or Unix form
///
/// A path ending in a separator names a directory and has no file name.
fn file_name(raw_path: &str) -> &str {
    let trimmed = raw_path.trim().trim_matches('"');
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}
