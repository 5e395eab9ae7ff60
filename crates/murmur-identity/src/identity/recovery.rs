//! Recovery codec — portable identity backup files.
//!
//! A recovery bundle is a flattened snapshot of the signing key pair
//! plus provenance metadata, written as pretty-printed JSON so the user
//! can open it in any editor and see exactly which fields it contains.
//! Import validates the required fields, reconstructs the signing key,
//! and cross-checks that the embedded public key both matches the
//! reconstructed pair and re-derives the bundle's stored DID.
//!
//! The bundle carries only the signing identity. Key-agreement keys are
//! regenerated on the new device and republished; old conversations
//! re-key on the next session derivation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::keys::SigningKeyPair;
use crate::error::{IdentityError, Result};
use crate::identity::did::Did;
use crate::identity::local::LocalIdentity;
use crate::time;

const RECOVERY_FORMAT: &str = "murmur-recovery-v1";
const RECOVERY_VERSION: u32 = 1;

/// Warning embedded in every exported bundle.
const RECOVERY_WARNING: &str = "KEEP THIS FILE SECRET. Anyone with the private_key in this \
     file can sign in as you and read your encrypted messages. Murmur staff will never ask \
     for it.";

/// On-disk recovery bundle.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecoveryBundle {
    /// Format identifier string.
    pub format: String,
    /// Format version number.
    pub version: u32,
    /// The DID of the archived identity.
    pub did: String,
    /// Base64-encoded public signing key.
    pub public_key: String,
    /// Base64-encoded private signing key.
    pub private_key: String,
    /// Username the identity belonged to when exported.
    pub owner_username: String,
    /// Home server the identity belonged to when exported.
    pub owner_server: String,
    /// Export time, RFC 3339.
    pub created_at: String,
    /// Human-readable warning, part of the file on purpose.
    pub warning: String,
}

/// Loosely-typed view used during import so a missing field produces a
/// clear `InvalidRecoveryFile` error instead of a serde parse failure.
#[derive(Deserialize)]
struct RawBundle {
    format: Option<String>,
    did: Option<String>,
    public_key: Option<String>,
    private_key: Option<String>,
}

/// Serialize an identity's signing pair into a recovery bundle string.
pub fn export_bundle(identity: &LocalIdentity, owner_username: &str, owner_server: &str) -> Result<String> {
    let bundle = RecoveryBundle {
        format: RECOVERY_FORMAT.to_string(),
        version: RECOVERY_VERSION,
        did: identity.did().as_str().to_string(),
        public_key: identity.signing().public_encoded(),
        private_key: identity.signing().secret_encoded(),
        owner_username: owner_username.to_string(),
        owner_server: owner_server.to_string(),
        created_at: time::micros_to_rfc3339(time::now_micros()),
        warning: RECOVERY_WARNING.to_string(),
    };

    serde_json::to_string_pretty(&bundle)
        .map_err(|e| IdentityError::Serialization(e.to_string()))
}

/// Export a bundle and write it to a local file.
pub fn export_to_file(
    identity: &LocalIdentity,
    owner_username: &str,
    owner_server: &str,
    path: &Path,
) -> Result<()> {
    let json = export_bundle(identity, owner_username, owner_server)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Parse a recovery bundle and reconstruct the signing key pair.
///
/// # Errors
///
/// Returns `InvalidRecoveryFile` when the file is not a bundle, a
/// required field (`did`, `public_key`, `private_key`) is missing or
/// empty, the private key does not reproduce the stored public key, or
/// the public key does not re-derive the stored DID.
pub fn import_bundle(contents: &str) -> Result<SigningKeyPair> {
    let raw: RawBundle = serde_json::from_str(contents)
        .map_err(|e| IdentityError::InvalidRecoveryFile(format!("not a recovery file: {e}")))?;

    if let Some(format) = &raw.format {
        if format != RECOVERY_FORMAT {
            return Err(IdentityError::InvalidRecoveryFile(format!(
                "unsupported format '{format}'"
            )));
        }
    }

    let did = require_field(raw.did, "did")?;
    let public_key = require_field(raw.public_key, "public_key")?;
    let private_key = require_field(raw.private_key, "private_key")?;

    let pair = SigningKeyPair::from_secret_encoded(&private_key)
        .map_err(|e| IdentityError::InvalidRecoveryFile(format!("private_key: {e}")))?;

    if pair.public_encoded() != public_key {
        return Err(IdentityError::InvalidRecoveryFile(
            "public_key does not match the reconstructed private key".into(),
        ));
    }

    let derived = Did::derive(&public_key);
    if derived.as_str() != did {
        return Err(IdentityError::InvalidRecoveryFile(format!(
            "stored DID {did} does not match key-derived DID {derived}"
        )));
    }

    Ok(pair)
}

/// Read and import a recovery bundle from a local file.
pub fn import_from_file(path: &Path) -> Result<SigningKeyPair> {
    let contents = std::fs::read_to_string(path)?;
    import_bundle(&contents)
}

fn require_field(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(IdentityError::InvalidRecoveryFile(format!(
            "missing required field '{name}'"
        ))),
    }
}
