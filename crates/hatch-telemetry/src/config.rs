//! Telemetry configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory (under home or project root) holding hatch settings
pub const CONFIG_DIR: &str = ".hatch";

pub const OPTOUT_ENV: &str = "HATCH_TELEMETRY_OPTOUT";
pub const DEBUG_ENV: &str = "HATCH_TELEMETRY_DEBUG";
pub const IN_CI_ENV: &str = "HATCH_TELEMETRY_IN_CI";

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Whether telemetry is enabled (default: true, opt-out model)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Debug mode - print events instead of sending (default: false)
    #[serde(default)]
    pub debug: bool,

    /// Override the collector endpoint (for testing, optional)
    pub endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug: false,
            endpoint: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Load telemetry configuration with precedence:
/// 1. Environment variables (highest priority)
/// 2. Local config (.hatch/config.local.toml)
/// 3. Project config (.hatch/config.toml)
/// 4. User config (~/.hatch/config.toml)
/// 5. Default (enabled=true)
pub fn load_telemetry_config() -> Result<TelemetryConfig> {
    load_telemetry_config_in(dirs::home_dir().as_deref(), Path::new("."))
}

/// Same as [`load_telemetry_config`] with explicit home and project roots
pub fn load_telemetry_config_in(home_dir: Option<&Path>, project_dir: &Path) -> Result<TelemetryConfig> {
    let mut config = TelemetryConfig::default();

    if let Some(home_dir) = home_dir {
        let user_config = home_dir.join(CONFIG_DIR).join("config.toml");
        if user_config.exists() {
            match load_config_from_file(&user_config) {
                Ok(cfg) => config = cfg,
                Err(e) => tracing::debug!(error = %e, "ignoring unreadable user config"),
            }
        }
    }

    for name in ["config.toml", "config.local.toml"] {
        let path = project_dir.join(CONFIG_DIR).join(name);
        if path.exists() {
            match load_config_from_file(&path) {
                Ok(cfg) => merge_config(&mut config, cfg),
                Err(e) => tracing::debug!(error = %e, "ignoring unreadable project config"),
            }
        }
    }

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Parse only the `[telemetry]` table of a hatch config file
#[derive(Deserialize)]
struct FullConfig {
    #[serde(default)]
    telemetry: Option<TelemetryConfig>,
}

/// Load telemetry config from a TOML file
fn load_config_from_file(path: &Path) -> Result<TelemetryConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    let full_config: FullConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;

    Ok(full_config.telemetry.unwrap_or_default())
}

/// Merge new config into existing config
fn merge_config(base: &mut TelemetryConfig, new: TelemetryConfig) {
    // A later file can only opt out or turn debug on; an omitted key
    // deserializes to its default and must not re-enable anything.
    if !new.enabled {
        base.enabled = false;
    }
    if new.debug {
        base.debug = true;
    }
    if new.endpoint.is_some() {
        base.endpoint = new.endpoint;
    }
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut TelemetryConfig) -> Result<()> {
    if env::var(OPTOUT_ENV).is_ok() {
        config.enabled = false;
        return Ok(());
    }

    // DO_NOT_TRACK=1 (universal opt-out)
    if env::var("DO_NOT_TRACK").is_ok() {
        config.enabled = false;
        return Ok(());
    }

    if env::var(DEBUG_ENV).is_ok() {
        config.debug = true;
    }

    // Auto-disable in CI unless explicitly enabled
    if is_ci() && env::var(IN_CI_ENV).is_err() {
        config.enabled = false;
    }

    Ok(())
}

/// Check if running in CI environment
pub fn is_ci() -> bool {
    env::var("CI").is_ok()
        || env::var("CONTINUOUS_INTEGRATION").is_ok()
        || env::var("GITHUB_ACTIONS").is_ok()
        || env::var("GITLAB_CI").is_ok()
        || env::var("CIRCLECI").is_ok()
        || env::var("TRAVIS").is_ok()
}

/// Path of the user-level config file
pub fn user_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home_dir.join(CONFIG_DIR).join("config.toml"))
}

/// Persist `[telemetry] enabled = <enabled>` in the user config
pub fn set_user_telemetry_enabled(enabled: bool) -> Result<PathBuf> {
    let path = user_config_path()?;
    write_telemetry_enabled(&path, enabled)?;
    Ok(path)
}

/// Rewrite one key of a config file, keeping every other table intact
fn write_telemetry_enabled(path: &Path, enabled: bool) -> Result<()> {
    let mut document: toml::Table = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?
    } else {
        toml::Table::new()
    };

    let telemetry = document
        .entry("telemetry")
        .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    let table = telemetry
        .as_table_mut()
        .with_context(|| format!("`telemetry` is not a table in {}", path.display()))?;
    table.insert("enabled".to_string(), toml::Value::Boolean(enabled));

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(&document)?)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(())
}

/// Get the telemetry state directory
pub fn get_telemetry_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().context("Could not determine home directory")?;
    let telemetry_dir = home_dir.join(CONFIG_DIR).join("telemetry");
    fs::create_dir_all(&telemetry_dir)?;
    Ok(telemetry_dir)
}
