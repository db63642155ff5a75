//! Request/response identifiers for the validation handshake.
//!
//! Identifiers are keccak-256 digests of UTF-8 payload text, the same hash
//! the contracts compute, so a client-derived request hash matches the one
//! stored on-chain.

use alloy::primitives::{keccak256, B256};
use rand::Rng;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Digest of `payload`. Identical text always yields the identical id.
pub fn digest(payload: &str) -> B256 {
    keccak256(payload.as_bytes())
}

/// Optional correlation tag: all-zero when `tag` is empty.
pub fn tag_digest(tag: &str) -> B256 {
    if tag.is_empty() {
        B256::ZERO
    } else {
        digest(tag)
    }
}

/// Request payload text with an embedded timestamp and random nonce.
///
/// The request hash is the correlation key between a request and its
/// response, so every logical request needs distinct payload text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestData(String);

impl RequestData {
    /// `"<label> at <RFC 3339 time> - nonce:<5 digits>"`.
    pub fn unique(label: &str) -> Self {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());
        Self::with_nonce(label, &now, rand::thread_rng().gen_range(10_000..100_000))
    }

    pub fn with_nonce(label: &str, timestamp: &str, nonce: u32) -> Self {
        Self(format!("{} at {} - nonce:{}", label, timestamp, nonce))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> B256 {
        digest(&self.0)
    }
}

impl std::fmt::Display for RequestData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
