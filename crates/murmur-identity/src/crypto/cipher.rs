//! Authenticated message encryption using ChaCha20-Poly1305.
//!
//! A fresh random 12-byte nonce is sampled inside `encrypt` on every
//! call; no API accepts a caller-supplied nonce, so nonce reuse under
//! one key cannot happen by construction.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

use crate::crypto::agreement::SharedSecret;
use crate::crypto::random::random_nonce_12;
use crate::error::{IdentityError, Result};

/// Nonce size in bytes (96 bits, the ChaCha20-Poly1305 standard).
pub const NONCE_SIZE: usize = 12;

/// Encrypt plaintext under a conversation's shared secret.
///
/// Returns `(nonce, ciphertext)`; the ciphertext includes the Poly1305
/// authentication tag. The nonce must travel alongside the ciphertext
/// in the envelope.
pub fn encrypt(secret: &SharedSecret, plaintext: &[u8]) -> Result<([u8; NONCE_SIZE], Vec<u8>)> {
    let nonce_bytes = random_nonce_12();
    let nonce = Nonce::from_slice(&nonce_bytes);
    let cipher = ChaCha20Poly1305::new_from_slice(secret.as_bytes())
        .map_err(|e| IdentityError::EncryptionFailed(format!("cipher init: {e}")))?;
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| IdentityError::EncryptionFailed(format!("encrypt: {e}")))?;
    Ok((nonce_bytes, ciphertext))
}

/// Decrypt ciphertext under a conversation's shared secret.
///
/// # Errors
///
/// Returns `Decryption` when authentication fails: wrong key, corrupted
/// ciphertext, or tampering. Never returns corrupted plaintext.
pub fn decrypt(secret: &SharedSecret, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_SIZE {
        return Err(IdentityError::MalformedEnvelope(format!(
            "IV must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    let nonce = Nonce::from_slice(nonce);
    let cipher = ChaCha20Poly1305::new_from_slice(secret.as_bytes())
        .map_err(|e| IdentityError::EncryptionFailed(format!("cipher init: {e}")))?;
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| IdentityError::Decryption)
}
