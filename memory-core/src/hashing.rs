//! Two distinct hash schemes, kept deliberately separate: `content_hash`
//! is a cheap duplicate hint, `fingerprint` is a change-detection digest
//! for ingestion sources.

use sha2::{Digest, Sha256};

/// Cheap, non-cryptographic duplicate hint computed over a memory's
/// `detail` field. FNV-1a, rendered as lower-hex.
#[must_use]
pub fn content_hash(detail: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for byte in detail.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:016x}")
}

/// Change-detection fingerprint for an ingestion source's raw content:
/// the first 16 hex characters of its SHA-256 digest.
#[must_use]
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

/// A short, stable hash of `title` used as the id-composition suffix.
/// Distinct from both `content_hash` and `fingerprint`: it only needs to
/// be short and stable, not collision-hardened against adversarial input.
#[must_use]
pub fn short_hash(title: &str) -> String {
    let h = content_hash(title);
    h[..10].to_string()
}
