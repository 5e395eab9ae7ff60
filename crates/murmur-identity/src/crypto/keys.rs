//! Ed25519 and X25519 key pair generation.
//!
//! Ed25519 is used for signing (DID ownership, challenge-response login).
//! X25519 is used for Diffie-Hellman key agreement (encrypted DMs).
//! The two pairs are generated independently; a signing key is never
//! reused as a key-agreement key.

use ed25519_dalek::{SigningKey, VerifyingKey};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroize;

use crate::error::{IdentityError, Result};

/// Encode bytes with standard base64 (the stable binary-to-text encoding
/// used for all key material on the wire and on disk).
pub fn encode_key(bytes: &[u8]) -> String {
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Decode a base64-encoded 32-byte key.
pub fn decode_key(encoded: &str) -> Result<[u8; 32]> {
    let bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, encoded)
        .map_err(|e| IdentityError::InvalidKey(format!("invalid base64 key: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| IdentityError::InvalidKey("key must be 32 bytes".into()))
}

/// An Ed25519 key pair for signing operations.
///
/// The private half is zeroized on drop and never leaves the device
/// except through the recovery codec's explicit export.
#[derive(Debug)]
pub struct SigningKeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl SigningKeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from the encoded private half.
    pub fn from_secret_encoded(encoded: &str) -> Result<Self> {
        let mut bytes = decode_key(encoded)?;
        let pair = Self::from_secret_bytes(&bytes);
        bytes.zeroize();
        Ok(pair)
    }

    /// Reconstruct a verifying key from raw bytes.
    pub fn verifying_key_from_bytes(bytes: &[u8; 32]) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(bytes)
            .map_err(|e| IdentityError::InvalidKey(format!("invalid verifying key: {e}")))
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Return the private key bytes. Caller must zeroize after use.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Return the public key bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Return the public key in its stable encoded form.
    pub fn public_encoded(&self) -> String {
        encode_key(&self.public_bytes())
    }

    /// Return the private key in its stable encoded form.
    ///
    /// Only the recovery codec and the keystore may call this; the
    /// encoding still contains live private material.
    pub fn secret_encoded(&self) -> String {
        let mut bytes = self.secret_bytes();
        let encoded = encode_key(&bytes);
        bytes.zeroize();
        encoded
    }
}

impl Drop for SigningKeyPair {
    fn drop(&mut self) {
        // SigningKey stores bytes internally; zeroize via conversion
        let mut bytes = self.signing_key.to_bytes();
        bytes.zeroize();
    }
}

/// An X25519 static key pair for Diffie-Hellman key agreement.
///
/// The public half is published to the user directory so peers can
/// derive a shared secret; the private half never leaves the device.
pub struct KeyAgreementKeyPair {
    secret: StaticSecret,
    public: X25519PublicKey,
}

impl KeyAgreementKeyPair {
    /// Generate a new random X25519 key pair.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(rand::thread_rng());
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct from raw secret key bytes.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        let secret = StaticSecret::from(bytes);
        let public = X25519PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Reconstruct a key pair from the encoded private half.
    pub fn from_secret_encoded(encoded: &str) -> Result<Self> {
        let bytes = decode_key(encoded)?;
        Ok(Self::from_secret_bytes(bytes))
    }

    /// Perform raw Diffie-Hellman with a peer's public key bytes.
    ///
    /// Callers should go through [`crate::crypto::agreement`] which
    /// applies HKDF and rejects degenerate outputs.
    pub fn diffie_hellman(&self, peer_public: &[u8; 32]) -> [u8; 32] {
        let peer = X25519PublicKey::from(*peer_public);
        *self.secret.diffie_hellman(&peer).as_bytes()
    }

    /// Return the public key bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        *self.public.as_bytes()
    }

    /// Return the public key in its stable encoded form.
    pub fn public_encoded(&self) -> String {
        encode_key(&self.public_bytes())
    }

    /// Return the private key in its stable encoded form.
    pub fn secret_encoded(&self) -> String {
        let mut bytes = self.secret.to_bytes();
        let encoded = encode_key(&bytes);
        bytes.zeroize();
        encoded
    }
}
