use std::io;

use thiserror::Error;

/// Failures of hatch itself while dispatching a verb.
///
/// A command that runs and exits non-zero is not an error here; its status
/// is forwarded as-is.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("'{verb}' is not a valid command name")]
    InvalidVerb { verb: String },

    #[error("'{verb}' is not a hatch command (no `{program}` found on PATH)")]
    NotFound { verb: String, program: String },

    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` was terminated by a signal")]
    Terminated { program: String },
}

pub type Result<T> = std::result::Result<T, CommandError>;
