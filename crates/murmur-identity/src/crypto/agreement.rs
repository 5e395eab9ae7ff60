//! Shared-secret derivation for encrypted conversations.
//!
//! X25519 Diffie-Hellman between the local private key-agreement key
//! and the peer's published public key, followed by HKDF-SHA256 with a
//! fixed info string. Both parties compute the same secret:
//! `derive(A.priv, B.pub) == derive(B.priv, A.pub)`.
//!
//! The derived secret is only ever fed to the message cipher; it is
//! never used as signing material, displayed, or persisted.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::keys::KeyAgreementKeyPair;
use crate::error::{IdentityError, Result};

/// HKDF info string binding derived keys to the DM cipher. Must remain
/// stable across versions or existing conversations become unreadable.
const DM_KEY_CONTEXT: &[u8] = b"murmur/dm-key-v1";

/// A 32-byte symmetric secret shared between two conversation parties.
///
/// Zeroized on drop. Recomputed per process lifetime, never written to
/// disk, so disk compromise does not expose past session secrets beyond
/// the long-term private key itself.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl SharedSecret {
    /// Raw bytes, for keying the message cipher.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Derive the shared symmetric secret for a conversation.
///
/// # Errors
///
/// Returns `InvalidKey` if the peer key is a low-order point (the raw
/// DH output is all zeros — a non-contributory exchange), or
/// `KeyGeneration` if HKDF expansion fails.
pub fn derive_shared_secret(
    local: &KeyAgreementKeyPair,
    peer_public: &[u8; 32],
) -> Result<SharedSecret> {
    let mut dh = local.diffie_hellman(peer_public);
    if dh == [0u8; 32] {
        return Err(IdentityError::InvalidKey(
            "peer key-agreement key is a low-order point".into(),
        ));
    }

    let hk = Hkdf::<Sha256>::new(None, &dh);
    dh.zeroize();

    let mut output = [0u8; 32];
    hk.expand(DM_KEY_CONTEXT, &mut output)
        .map_err(|e| IdentityError::KeyGeneration(format!("HKDF expand failed: {e}")))?;

    Ok(SharedSecret(output))
}
