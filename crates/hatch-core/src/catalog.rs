//! Static registry of the verbs hatch understands
//!
//! The catalog is only consulted for verb identity and for the shape of a
//! verb's sub-argument. It never validates arguments.

use serde::Serialize;

/// Prefix shared by diagnostic verbs that are not meant for end users
pub const INTERNAL_VERB_PREFIX: &str = "internal-";

/// Verb run by installers after a successful install
pub const REPORT_INSTALL_SUCCESS_VERB: &str = "internal-reportinstallsuccess";

/// Where a verb's sub-argument sits among its positional tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubArgumentShape {
    /// The verb takes no sub-argument worth reporting
    None,
    /// The n-th bare positional token after the verb (option values excluded)
    Positional(usize),
}

/// One registered verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub verb: &'static str,
    pub built_in: bool,
    pub sub_argument: SubArgumentShape,
}

impl CatalogEntry {
    const fn plain(verb: &'static str) -> Self {
        Self {
            verb,
            built_in: true,
            sub_argument: SubArgumentShape::None,
        }
    }

    const fn with_sub_argument(verb: &'static str, position: usize) -> Self {
        Self {
            verb,
            built_in: true,
            sub_argument: SubArgumentShape::Positional(position),
        }
    }

    /// Whether this verb is a diagnostic verb hidden from users
    pub fn is_internal(&self) -> bool {
        self.verb.starts_with(INTERNAL_VERB_PREFIX)
    }
}

const BUILTIN_VERBS: &[CatalogEntry] = &[
    CatalogEntry::plain("build"),
    CatalogEntry::plain("publish"),
    CatalogEntry::plain("restore"),
    CatalogEntry::plain("clean"),
    CatalogEntry::plain("run"),
    CatalogEntry::plain("test"),
    CatalogEntry::plain("pack"),
    CatalogEntry::plain("store"),
    CatalogEntry::plain("migrate"),
    CatalogEntry::with_sub_argument("new", 0),
    CatalogEntry::with_sub_argument("add", 0),
    CatalogEntry::with_sub_argument("remove", 0),
    CatalogEntry::with_sub_argument("list", 0),
    CatalogEntry::with_sub_argument("nuget", 0),
    CatalogEntry::with_sub_argument("help", 0),
    // `sln <solution> <action>`: the solution file is user data, the action is not
    CatalogEntry::with_sub_argument("sln", 1),
    CatalogEntry::plain("telemetry"),
    CatalogEntry::plain(REPORT_INSTALL_SUCCESS_VERB),
];

/// Option names whose values may be reported. Option keys leave the process
/// unhashed, so only this closed set is ever used as an event property key.
const REPORTABLE_OPTIONS: &[&str] = &[
    "configuration",
    "framework",
    "runtime",
    "verbosity",
    "language",
    "type",
    "arch",
    "os",
    "self-contained",
    "no-restore",
    "no-build",
];

/// Immutable verb table, built once at startup and shared by reference
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    entries: Vec<CatalogEntry>,
    reportable_options: Vec<&'static str>,
}

impl CommandCatalog {
    /// The table of every verb shipped with hatch
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_VERBS.to_vec(),
            reportable_options: REPORTABLE_OPTIONS.to_vec(),
        }
    }

    /// Builds a catalog from an explicit table (tests, embedders)
    pub fn from_entries(entries: Vec<CatalogEntry>, reportable_options: Vec<&'static str>) -> Self {
        Self {
            entries,
            reportable_options,
        }
    }

    /// Case-sensitive lookup on the verb exactly as typed
    pub fn lookup(&self, token: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.verb == token)
    }

    pub fn is_known_verb(&self, token: &str) -> bool {
        self.lookup(token).is_some()
    }

    /// Canonical (lower-case) spelling of a reportable option key
    pub fn reportable_option(&self, key: &str) -> Option<&'static str> {
        self.reportable_options
            .iter()
            .copied()
            .find(|known| known.eq_ignore_ascii_case(key))
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
