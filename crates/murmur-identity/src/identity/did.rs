//! Decentralized identifier derivation.
//!
//! A Murmur DID is `did:mur:` followed by the base58 encoding of the
//! first 20 bytes of SHA-256 over the encoded public signing key. The
//! derivation is pure and deterministic: the same encoded key yields
//! the same DID on every platform, process, and device.
//!
//! The format intentionally resembles, but does not conform to, a W3C
//! DID method. It is a stable internal handle, not interoperable with
//! external DID resolvers.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{IdentityError, Result};

/// The fixed DID prefix.
pub const DID_PREFIX: &str = "did:mur:";

/// Number of digest bytes kept in the identifier. 160 bits keeps
/// second-preimage collisions cryptographically negligible.
const DIGEST_TRUNCATION: usize = 20;

/// A decentralized identifier derived from a public signing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Did(String);

impl Did {
    /// Derive a DID from an encoded public signing key.
    ///
    /// Operates on the encoded string (not the raw key bytes) so the
    /// derivation matches what every device computes from the wire
    /// representation.
    pub fn derive(public_key_encoded: &str) -> Self {
        let digest = Sha256::digest(public_key_encoded.as_bytes());
        let truncated = &digest[..DIGEST_TRUNCATION];
        let encoded = bs58::encode(truncated).into_string();
        Self(format!("{DID_PREFIX}{encoded}"))
    }

    /// Parse and validate a DID string.
    pub fn parse(s: &str) -> Result<Self> {
        let payload = s
            .strip_prefix(DID_PREFIX)
            .ok_or_else(|| IdentityError::InvalidDid(format!("must start with '{DID_PREFIX}'")))?;

        let decoded = bs58::decode(payload)
            .into_vec()
            .map_err(|e| IdentityError::InvalidDid(format!("invalid base58 payload: {e}")))?;

        if decoded.len() != DIGEST_TRUNCATION {
            return Err(IdentityError::InvalidDid(format!(
                "payload must be {DIGEST_TRUNCATION} bytes, got {}",
                decoded.len()
            )));
        }

        Ok(Self(s.to_string()))
    }

    /// The full DID string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Did {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
