//! Content digest helpers.
//!
//! Every payload is identified by its SHA-256 digest, rendered as lowercase
//! hex. The digest doubles as the dedup key and the integrity reference, so
//! comparisons must accept mixed-case input from older records.

use sha2::{Digest, Sha256};

/// Length of a SHA-256 digest in hex characters.
pub const DIGEST_HEX_LEN: usize = 64;

/// Compute the SHA-256 digest of a payload as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compare two hex digests case-insensitively without short-circuiting.
///
/// The comparison visits every position up to the longer input so a length
/// mismatch is not observably faster than an early-byte mismatch. Hashes are
/// not secrets here, so this is a soft hardening measure, not a guarantee.
pub fn digests_match(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let len = a.len().max(b.len());

    let mut diff = (a.len() ^ b.len()) as u8;
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0).to_ascii_lowercase();
        let y = b.get(i).copied().unwrap_or(0).to_ascii_lowercase();
        diff |= x ^ y;
    }
    diff == 0
}

/// Normalize a digest to its canonical lowercase form.
pub fn normalize(digest: &str) -> String {
    digest.to_ascii_lowercase()
}
