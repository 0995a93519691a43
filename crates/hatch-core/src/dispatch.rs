//! Hands a verb off to its `hatch-<verb>` executable
//!
//! Command implementations live outside this crate. Dispatch only resolves
//! the program, runs it with inherited stdio and reports its exit code.

use std::ffi::OsStr;
use std::io::ErrorKind;
use std::process::Command;

use crate::error::{CommandError, Result};

/// Prefix of external command executables
pub const EXTERNAL_PROGRAM_PREFIX: &str = "hatch-";

/// Program name an external verb resolves to
pub fn external_program(verb: &str) -> Result<String> {
    if verb.is_empty() || verb.contains(['/', '\\']) || verb.starts_with('-') {
        return Err(CommandError::InvalidVerb {
            verb: verb.to_string(),
        });
    }
    Ok(format!("{}{}", EXTERNAL_PROGRAM_PREFIX, verb))
}

/// Run `hatch-<verb> args...` and return its exit code
pub fn run_external<S: AsRef<OsStr>>(verb: &str, args: &[S]) -> Result<i32> {
    let program = external_program(verb)?;

    tracing::debug!(program = %program, arg_count = args.len(), "dispatching external command");

    let status = Command::new(&program)
        .args(args.iter().map(S::as_ref))
        .status()
        .map_err(|source| match source.kind() {
            ErrorKind::NotFound => CommandError::NotFound {
                verb: verb.to_string(),
                program: program.clone(),
            },
            _ => CommandError::Spawn {
                program: program.clone(),
                source,
            },
        })?;

    status
        .code()
        .ok_or(CommandError::Terminated { program })
}
