//! `hatch telemetry status|enable|disable`

use clap::Subcommand;
use hatch_telemetry::config::{load_telemetry_config, user_config_path};
use hatch_telemetry::{set_user_telemetry_enabled, TelemetryConfig};

use crate::error::CliError;

#[derive(Subcommand)]
pub enum TelemetryAction {
    /// Show whether telemetry is collected
    Status,
    /// Opt back in to anonymous telemetry
    Enable,
    /// Opt out of telemetry
    Disable,
}

pub fn execute(action: TelemetryAction, config: &TelemetryConfig) -> Result<i32, CliError> {
    match action {
        TelemetryAction::Status => {
            println!("Telemetry: {}", if config.enabled { "enabled" } else { "disabled" });
            println!("Debug mode: {}", if config.debug { "on" } else { "off" });
            if let Ok(path) = user_config_path() {
                println!("User config: {}", path.display());
            }
        }
        TelemetryAction::Enable | TelemetryAction::Disable => {
            let enabled = matches!(action, TelemetryAction::Enable);
            let path = set_user_telemetry_enabled(enabled).map_err(|e| CliError::Settings(e.into()))?;
            println!(
                "Telemetry {} (saved to {})",
                if enabled { "enabled" } else { "disabled" },
                path.display()
            );

            // Environment and project settings can still opt out.
            let effective = load_telemetry_config().map_err(|e| CliError::Settings(e.into()))?;
            if enabled && !effective.enabled {
                println!("Note: telemetry remains off because of an environment or project setting");
            }
        }
    }
    Ok(0)
}
