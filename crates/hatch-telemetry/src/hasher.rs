//! One-way, case-normalized hashing of reported values

use sha2::{Digest, Sha256};

/// SHA-256 hasher used for every user-derived property value
pub struct Sha256Hasher;

impl Sha256Hasher {
    /// Lower-case hex SHA-256 of the UTF-8 bytes of `value` (64 chars)
    pub fn hash(value: &str) -> String {
        let digest = Sha256::digest(value.as_bytes());
        format!("{:x}", digest)
    }

    /// Upper-case `value` with the locale-independent Unicode mapping, then hash
    ///
    /// Values differing only by case map to the same token.
    pub fn hash_with_normalized_casing(value: &str) -> String {
        Self::hash(&value.to_uppercase())
    }
}

/// Signature of the hashing function a filter applies to values
pub type HashFn = fn(&str) -> String;
