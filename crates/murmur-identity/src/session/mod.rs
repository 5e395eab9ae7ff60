//! Per-conversation session state.
//!
//! A [`ConversationSession`] carries the derived shared secret for one
//! thread, or a sentinel status explaining why no secret is available.
//! Establishment is a pure function of its inputs; the calling layer
//! decides when to re-invoke it (thread switch, key rotation). Sessions
//! share no mutable state and may be derived concurrently. They are
//! never persisted.

use crate::crypto::agreement::{derive_shared_secret, SharedSecret};
use crate::crypto::keys::KeyAgreementKeyPair;

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No derivation attempted yet.
    Uninitialized,
    /// Shared secret derived; the session can encrypt and decrypt.
    Ready,
    /// The peer has not published a key-agreement public key.
    PeerKeyMissing,
    /// This device has no key-agreement key pair.
    LocalKeyMissing,
    /// Derivation failed; the secret is absent and callers must not
    /// fall back to a stale or partial one.
    Error,
}

/// The E2E encryption state of one conversation thread.
pub struct ConversationSession {
    thread_id: String,
    peer_public: Option<[u8; 32]>,
    secret: Option<SharedSecret>,
    status: SessionStatus,
}

impl ConversationSession {
    /// A session for a thread that has not been activated yet.
    pub fn uninitialized(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            peer_public: None,
            secret: None,
            status: SessionStatus::Uninitialized,
        }
    }

    /// Derive the session for a thread from the local key-agreement
    /// pair and the peer's published public key.
    ///
    /// Missing inputs produce the corresponding sentinel status without
    /// attempting derivation; a derivation failure produces `Error`
    /// with no secret. This is a pure function: same inputs, same
    /// session.
    pub fn establish(
        thread_id: impl Into<String>,
        local: Option<&KeyAgreementKeyPair>,
        peer_public: Option<[u8; 32]>,
    ) -> Self {
        let thread_id = thread_id.into();

        let local = match local {
            Some(local) => local,
            None => {
                return Self {
                    thread_id,
                    peer_public,
                    secret: None,
                    status: SessionStatus::LocalKeyMissing,
                }
            }
        };

        let peer = match peer_public {
            Some(peer) => peer,
            None => {
                return Self {
                    thread_id,
                    peer_public: None,
                    secret: None,
                    status: SessionStatus::PeerKeyMissing,
                }
            }
        };

        match derive_shared_secret(local, &peer) {
            Ok(secret) => Self {
                thread_id,
                peer_public: Some(peer),
                secret: Some(secret),
                status: SessionStatus::Ready,
            },
            Err(e) => {
                log::warn!("session derivation failed for thread {thread_id}: {e}");
                Self {
                    thread_id,
                    peer_public: Some(peer),
                    secret: None,
                    status: SessionStatus::Error,
                }
            }
        }
    }

    /// The thread this session belongs to.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// The peer public key the session was derived against, if known.
    pub fn peer_public(&self) -> Option<&[u8; 32]> {
        self.peer_public.as_ref()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// The derived secret. `Some` exactly when status is `Ready`.
    pub fn secret(&self) -> Option<&SharedSecret> {
        self.secret.as_ref()
    }

    /// Whether the session can encrypt and decrypt.
    pub fn is_ready(&self) -> bool {
        self.status == SessionStatus::Ready && self.secret.is_some()
    }
}
