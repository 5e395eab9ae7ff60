//! On-disk keystore for the local identity.
//!
//! Stores one signing pair and one key-agreement pair as a
//! version-tagged JSON file. Writes are atomic (sibling temp file plus
//! rename) so a concurrent reader never observes a half-written pair.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "murmur-keystore-v1",
//!     "did": "did:mur:...",
//!     "signing_public_key": "<base64>",
//!     "signing_private_key": "<base64>",
//!     "agreement_public_key": "<base64>",
//!     "agreement_private_key": "<base64>",
//!     "created_at": 1700000000000000
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::keys::{KeyAgreementKeyPair, SigningKeyPair};
use crate::error::{IdentityError, Result};
use crate::identity::LocalIdentity;

const KEYSTORE_VERSION: u32 = 1;
const KEYSTORE_FORMAT: &str = "murmur-keystore-v1";
const KEYSTORE_FILE: &str = "identity.json";

/// Serialized keystore contents.
#[derive(Serialize, Deserialize, Zeroize)]
struct KeystoreFile {
    version: u32,
    format: String,
    did: String,
    signing_public_key: String,
    signing_private_key: String,
    agreement_public_key: String,
    agreement_private_key: String,
    created_at: u64,
}

/// File-backed custody of the device's key material.
pub struct KeyStore {
    root: PathBuf,
}

impl KeyStore {
    /// Open a keystore rooted at the given directory. The directory is
    /// created lazily on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_path(&self) -> PathBuf {
        self.root.join(KEYSTORE_FILE)
    }

    /// Whether an identity is persisted on this device.
    pub fn exists(&self) -> bool {
        self.file_path().exists()
    }

    /// Persist an identity, overwriting any existing one.
    ///
    /// Overwriting is a deliberate rotation; the previous DID becomes
    /// unreachable unless it was archived through the recovery codec,
    /// so a warning is logged when that happens.
    pub fn save(&self, identity: &LocalIdentity) -> Result<()> {
        if let Ok(Some(existing)) = self.load() {
            if existing.did() != identity.did() {
                log::warn!(
                    "replacing identity {} with {}; the old DID is unreachable without a recovery bundle",
                    existing.did(),
                    identity.did()
                );
            }
        }

        let mut contents = KeystoreFile {
            version: KEYSTORE_VERSION,
            format: KEYSTORE_FORMAT.to_string(),
            did: identity.did().as_str().to_string(),
            signing_public_key: identity.signing().public_encoded(),
            signing_private_key: identity.signing().secret_encoded(),
            agreement_public_key: identity.agreement().public_encoded(),
            agreement_private_key: identity.agreement().secret_encoded(),
            created_at: identity.created_at(),
        };

        let json = serde_json::to_string_pretty(&contents)
            .map_err(|e| IdentityError::Serialization(e.to_string()))?;
        contents.zeroize();

        write_atomic(&self.file_path(), json.as_bytes())?;
        log::debug!("persisted identity {}", identity.did());
        Ok(())
    }

    /// Load the persisted identity.
    ///
    /// Returns `Ok(None)` when no identity exists yet on this device —
    /// a normal state, not a failure.
    pub fn load(&self) -> Result<Option<LocalIdentity>> {
        let path = self.file_path();
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut contents: KeystoreFile = serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::Storage(format!("corrupt keystore: {e}")))?;

        if contents.version != KEYSTORE_VERSION || contents.format != KEYSTORE_FORMAT {
            let message = format!(
                "unsupported keystore version={} format={}",
                contents.version, contents.format
            );
            contents.zeroize();
            return Err(IdentityError::Storage(message));
        }

        let signing = SigningKeyPair::from_secret_encoded(&contents.signing_private_key)?;
        let agreement = KeyAgreementKeyPair::from_secret_encoded(&contents.agreement_private_key)?;
        let created_at = contents.created_at;
        contents.zeroize();

        // The DID is re-derived from the key rather than trusted from disk.
        Ok(Some(LocalIdentity::from_parts(signing, agreement, created_at)))
    }

    /// Wipe all persisted key material. Idempotent; leaves the store in
    /// the same state as before first use.
    pub fn erase(&self) -> Result<()> {
        let path = self.file_path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("erased persisted identity");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `data` to `path` atomically using a sibling temporary file.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, data)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}
