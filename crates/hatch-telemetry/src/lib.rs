//! # hatch Telemetry
//!
//! Privacy-first command telemetry for the hatch CLI.
//!
//! ## Pipeline
//!
//! argv → [`hatch_core::classify`] → [`HashingFilter`] → [`EventBus`] → subscribers
//!
//! The failure hook ([`capture_failures`]) and the install reporter
//! ([`report_install_success`]) publish on the same bus independently.
//!
//! ## Privacy Guarantees
//!
//! - Every value taken from argv is upper-cased and SHA-256 hashed before it
//!   becomes an event property
//! - Property keys come from a closed vocabulary; unknown option names are
//!   dropped, not sent
//! - Failure details are redacted (argv tokens hashed, paths and user
//!   identity replaced) and truncated
//! - Telemetry never changes a command's output or exit status
//!
//! ## Opt-Out
//!
//! ```bash
//! # Via CLI
//! hatch telemetry disable
//!
//! # Via environment variable
//! export HATCH_TELEMETRY_OPTOUT=1
//!
//! # Via config file (~/.hatch/config.toml)
//! [telemetry]
//! enabled = false
//! ```

pub mod bus;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod failure;
pub mod filter;
pub mod hasher;
pub mod install;
pub mod machine_id;
pub mod redact;
pub mod subscriber;

pub use bus::{EventBus, Subscriber};
pub use config::{load_telemetry_config, set_user_telemetry_enabled, TelemetryConfig};
pub use context::CommonProperties;
pub use error::TelemetryError;
pub use event::TelemetryEvent;
pub use failure::{capture_failures, FailureKind, FailureReport};
pub use filter::{BlockAllFilter, HashingFilter, TelemetryFilter};
pub use hasher::Sha256Hasher;
pub use install::report_install_success;
pub use redact::Redactor;
pub use subscriber::{CollectorSubscriber, RecordingSubscriber};
