//! Sender identity hashing.
//!
//! Raw sender identifiers (phone numbers) are never stored. Sessions are
//! claimed by, and looked up with, a SHA-256 digest of the identifier in
//! URL-safe base64.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Opaque, storage-safe form of a sender identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SenderToken(String);

impl SenderToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl std::fmt::Display for SenderToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Derive the sender token for a raw identifier.
pub fn hash_sender(raw: &[u8]) -> SenderToken {
    let digest = Sha256::digest(raw);
    SenderToken(URL_SAFE.encode(digest))
}
