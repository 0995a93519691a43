use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("the telemetry collector needs a running tokio runtime")]
    NoRuntime,

    #[error("the telemetry collector has been shut down")]
    Closed,

    #[error("failed to encode telemetry event")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
