//! Turns raw argv into an [`InvocationRecord`]
//!
//! Classification is total: any sequence of strings yields a record. Malformed
//! flags are recorded as best we can and left for the command to reject.

use serde::Serialize;

use crate::catalog::{CommandCatalog, SubArgumentShape};

/// A flag-introduced key/value pair, key stored without its dashes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionPair {
    pub key: String,
    pub value: String,
}

impl OptionPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Shape of one invocation. Built once from argv and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationRecord {
    verb: String,
    sub_argument: Option<String>,
    options: Vec<OptionPair>,
}

impl InvocationRecord {
    /// Record for an empty argv: empty verb, nothing else
    pub fn empty() -> Self {
        Self {
            verb: String::new(),
            sub_argument: None,
            options: Vec::new(),
        }
    }

    /// The first token as typed, or `""` when argv was empty
    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn sub_argument(&self) -> Option<&str> {
        self.sub_argument.as_deref()
    }

    /// Options in the order they were supplied, duplicates kept
    pub fn options(&self) -> &[OptionPair] {
        &self.options
    }
}

/// Classify `argv` (program name already stripped)
pub fn classify<S: AsRef<str>>(catalog: &CommandCatalog, argv: &[S]) -> InvocationRecord {
    let Some((first, rest)) = argv.split_first() else {
        return InvocationRecord::empty();
    };

    let verb = first.as_ref().to_string();
    let shape = catalog
        .lookup(&verb)
        .map(|entry| entry.sub_argument)
        .unwrap_or(SubArgumentShape::None);

    let mut options = Vec::new();
    let mut sub_argument = None;
    let mut positional = 0usize;
    let mut options_ended = false;
    let mut tokens = rest.iter().map(S::as_ref).peekable();

    while let Some(token) = tokens.next() {
        if !options_ended {
            if token == "--" {
                options_ended = true;
                continue;
            }

            if let Some(name) = option_name(token) {
                let pair = match name.split_once('=') {
                    Some((key, inline)) => OptionPair::new(key, inline),
                    None => {
                        let value = match tokens.peek() {
                            Some(next) if !opens_option(next) => tokens.next().unwrap_or_default(),
                            _ => "",
                        };
                        OptionPair::new(name, value)
                    }
                };
                options.push(pair);
                continue;
            }
        }

        if shape == SubArgumentShape::Positional(positional) {
            sub_argument = Some(token.to_string());
        }
        positional += 1;
    }

    tracing::debug!(
        verb_known = catalog.is_known_verb(&verb),
        option_count = options.len(),
        has_sub_argument = sub_argument.is_some(),
        "classified invocation"
    );

    InvocationRecord {
        verb,
        sub_argument,
        options,
    }
}

/// Name of the option a token opens, without dashes
///
/// `--name`, `--name=value`, `-n`, `-n=value`. Lone `-`, `--`, negative
/// numbers and `---x` are not options.
fn option_name(token: &str) -> Option<&str> {
    if let Some(long) = token.strip_prefix("--") {
        let usable = long
            .chars()
            .next()
            .map(|c| c != '-' && c != '=')
            .unwrap_or(false);
        return usable.then_some(long);
    }

    let short = token.strip_prefix('-')?;
    short
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map(|_| short)
}

/// Whether a token would be parsed as an option (or the `--` terminator)
fn opens_option(token: &str) -> bool {
    token == "--" || option_name(token).is_some()
}
