//! Scrubs user data out of failure diagnostics
//!
//! Every argv token is replaced by a short hash, the home directory and user
//! name by placeholders, and any remaining path-looking word by `<PATH>`.

use crate::hasher::Sha256Hasher;

/// Longest detail kept after redaction, in characters
pub const MAX_DETAIL_CHARS: usize = 1024;

/// Tokens shorter than this are left alone
const MIN_REDACTED_LEN: usize = 2;

/// Hex chars of the hash kept in a token placeholder
const HASH_PREFIX_LEN: usize = 12;

/// Output length after which token scanning stops at the next word break
const SCAN_LIMIT_CHARS: usize = MAX_DETAIL_CHARS * 4;

#[derive(Debug, Clone)]
pub struct Redactor {
    /// (needle, placeholder), longest needle first
    replacements: Vec<(String, String)>,
}

impl Redactor {
    /// Redactor for one invocation, using the current user's identity
    pub fn for_invocation<S: AsRef<str>>(argv: &[S]) -> Self {
        let home_dir = dirs::home_dir().map(|p| p.to_string_lossy().to_string());
        let username = std::env::var("USER")
            .or_else(|_| std::env::var("LOGNAME"))
            .or_else(|_| std::env::var("USERNAME"))
            .ok();
        Self::new(argv, home_dir, username)
    }

    pub fn new<S: AsRef<str>>(argv: &[S], home_dir: Option<String>, username: Option<String>) -> Self {
        let mut replacements: Vec<(String, String)> = Vec::new();

        let identity = [(home_dir, "<HOME>"), (username, "<USER>")];
        for (value, placeholder) in identity {
            if let Some(value) = value.filter(|v| v.chars().count() >= MIN_REDACTED_LEN) {
                replacements.push((value, placeholder.to_string()));
            }
        }

        for token in argv.iter().map(S::as_ref) {
            for needle in token_needles(token) {
                if needle.chars().count() < MIN_REDACTED_LEN {
                    continue;
                }
                let hash = Sha256Hasher::hash_with_normalized_casing(needle);
                replacements.push((needle.to_string(), format!("<hash:{}>", &hash[..HASH_PREFIX_LEN])));
            }
        }

        replacements.sort_by(|a, b| {
            b.0.chars()
                .count()
                .cmp(&a.0.chars().count())
                .then_with(|| a.0.to_lowercase().cmp(&b.0.to_lowercase()))
        });
        replacements.dedup_by(|a, b| a.0.to_lowercase() == b.0.to_lowercase());

        Self { replacements }
    }

    /// Redact and truncate `text`
    pub fn redact(&self, text: &str) -> String {
        let replaced = self.replace_tokens(text);
        let scrubbed = scrub_paths(&replaced);
        truncate_chars(&scrubbed, MAX_DETAIL_CHARS).to_string()
    }

    /// Single left-to-right pass so placeholders are never re-matched
    ///
    /// Matching ignores case. The scan stops at the first whitespace after
    /// [`SCAN_LIMIT_CHARS`] output chars, so it never ends inside a word.
    fn replace_tokens(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len().min(SCAN_LIMIT_CHARS * 2));
        let mut written = 0usize;
        let mut rest = text;

        'scan: while !rest.is_empty() {
            if written >= SCAN_LIMIT_CHARS && rest.starts_with(char::is_whitespace) {
                break;
            }

            for (needle, placeholder) in &self.replacements {
                if let Some(after) = strip_prefix_ignore_case(rest, needle) {
                    out.push_str(placeholder);
                    written += placeholder.len();
                    rest = after;
                    continue 'scan;
                }
            }

            let mut chars = rest.chars();
            if let Some(ch) = chars.next() {
                out.push(ch);
                written += 1;
            }
            rest = chars.as_str();
        }

        out
    }
}

/// Strings an argv token can leak as: the token, its dash-less form, and both
/// halves of `key=value`
fn token_needles(token: &str) -> Vec<&str> {
    let mut needles = vec![token];
    let bare = token.trim_start_matches('-');
    match bare.split_once('=') {
        Some((key, value)) => needles.extend([key, value]),
        None if bare != token => needles.push(bare),
        None => {}
    }
    needles
}

fn strip_prefix_ignore_case<'a>(text: &'a str, needle: &str) -> Option<&'a str> {
    let mut chars = text.chars();
    for expected in needle.chars() {
        let actual = chars.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    Some(chars.as_str())
}

fn scrub_paths(text: &str) -> String {
    text.split_inclusive(char::is_whitespace)
        .map(|word| {
            let trimmed = word.trim_end();
            if trimmed.contains(['/', '\\']) {
                format!("<PATH>{}", &word[trimmed.len()..])
            } else {
                word.to_string()
            }
        })
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
