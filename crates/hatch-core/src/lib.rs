//! # hatch core
//!
//! Verb catalog, invocation classification and command dispatch for the
//! hatch CLI. Telemetry lives in `hatch-telemetry` and only ever sees the
//! [`InvocationRecord`] produced here.

pub mod catalog;
pub mod classify;
pub mod dispatch;
pub mod error;

pub use catalog::{CatalogEntry, CommandCatalog, SubArgumentShape, REPORT_INSTALL_SUCCESS_VERB};
pub use classify::{classify, InvocationRecord, OptionPair};
pub use dispatch::run_external;
pub use error::CommandError;
