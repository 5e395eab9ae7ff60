//! The local identity handle.
//!
//! A [`LocalIdentity`] owns the device's resident signing key pair and
//! key-agreement key pair plus the DID derived from the signing public
//! key. Every operation that needs key material takes a reference to
//! this handle; nothing reads keys from ambient state.

use crate::crypto::keys::{KeyAgreementKeyPair, SigningKeyPair};
use crate::error::Result;
use crate::identity::did::Did;
use crate::time;

/// The device's resident cryptographic identity.
///
/// At most one of these is persisted per device. Generating a new one
/// while another exists is a deliberate identity rotation: the old DID
/// becomes unreachable unless archived through the recovery codec.
pub struct LocalIdentity {
    signing: SigningKeyPair,
    agreement: KeyAgreementKeyPair,
    did: Did,
    created_at: u64,
}

impl LocalIdentity {
    /// Generate a fresh identity: new signing pair, new key-agreement
    /// pair, and the DID derived from the signing public key.
    pub fn generate() -> Self {
        let signing = SigningKeyPair::generate();
        let did = Did::derive(&signing.public_encoded());
        Self {
            signing,
            agreement: KeyAgreementKeyPair::generate(),
            did,
            created_at: time::now_micros(),
        }
    }

    /// Rebuild an identity from both key pairs, re-deriving the DID.
    pub fn from_parts(
        signing: SigningKeyPair,
        agreement: KeyAgreementKeyPair,
        created_at: u64,
    ) -> Self {
        let did = Did::derive(&signing.public_encoded());
        Self {
            signing,
            agreement,
            did,
            created_at,
        }
    }

    /// Rebuild an identity from an imported signing pair only.
    ///
    /// Recovery bundles carry just the signing identity; the new device
    /// gets a fresh key-agreement pair whose public half must be
    /// republished to the directory.
    pub fn from_signing_pair(signing: SigningKeyPair) -> Result<Self> {
        Ok(Self::from_parts(
            signing,
            KeyAgreementKeyPair::generate(),
            time::now_micros(),
        ))
    }

    /// The DID derived from the signing public key.
    pub fn did(&self) -> &Did {
        &self.did
    }

    /// The signing key pair.
    pub fn signing(&self) -> &SigningKeyPair {
        &self.signing
    }

    /// The key-agreement key pair.
    pub fn agreement(&self) -> &KeyAgreementKeyPair {
        &self.agreement
    }

    /// Creation timestamp (microseconds since Unix epoch).
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}
