use std::io;

use hatch_core::CommandError;
use hatch_telemetry::FailureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("could not update telemetry settings")]
    Settings(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write output")]
    Io(#[from] io::Error),
}

impl FailureKind for CliError {
    fn failure_kind(&self) -> String {
        let variant = match self {
            CliError::Command(inner) => return inner.failure_kind(),
            CliError::Settings(_) => "Settings",
            CliError::Io(_) => "Io",
        };
        format!("{}::{}", std::any::type_name::<Self>(), variant)
    }
}
