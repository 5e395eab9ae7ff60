//! Error types for the Murmur identity core.
//!
//! All failures are strongly typed and recovered at the component
//! boundary; nothing in this crate panics on bad input. Private key
//! material is never included in error messages.

use crate::session::SessionStatus;

/// Error taxonomy covering key custody, authentication, key agreement,
/// message encryption, and recovery import/export.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid DID: {0}")]
    InvalidDid(String),

    /// No private signing key is resident on this device. This is the
    /// expected error when a user attempts DID login on a device that
    /// never generated or imported an identity.
    #[error("No signing key found on this device")]
    SigningKeyMissing,

    #[error("No challenge pending; request a fresh challenge first")]
    ChallengeMissing,

    #[error("Challenge rejected by the authentication service: {0}")]
    ChallengeRejected(String),

    #[error("Authentication service error: {0}")]
    Auth(String),

    #[error("User directory error: {0}")]
    Directory(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// AEAD authentication failed: wrong key, corrupted envelope, or
    /// tampering. Per-message and non-fatal.
    #[error("Decryption failed")]
    Decryption,

    #[error("Malformed ciphertext envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Conversation session not ready: {0:?}")]
    SessionNotReady(SessionStatus),

    #[error("Invalid recovery file: {0}")]
    InvalidRecoveryFile(String),

    #[error("Keystore error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
