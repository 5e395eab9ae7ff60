//! Challenge-response authentication.
//!
//! Proves possession of the private signing key without transmitting
//! it: the server issues a nonce for a DID, the client signs the exact
//! nonce bytes, and the server verifies against the public key the DID
//! was derived from. Verification authority lives entirely with the
//! issuer; the client never verifies its own login signature.
//!
//! A challenge is consumed exactly once. After signing — or after any
//! failure — the nonce is discarded and a fresh challenge must be
//! requested; the state machine structurally prevents replaying a
//! stale nonce.

use crate::crypto::keys::SigningKeyPair;
use crate::crypto::signing;
use crate::error::{IdentityError, Result};
use crate::identity::Did;

/// A server-issued login challenge. Memory-only, never persisted.
#[derive(Debug, Clone)]
pub struct Challenge {
    /// Opaque server-issued nonce.
    pub nonce: String,
    /// The DID the challenge was issued for.
    pub did: Did,
    /// Expiry (epoch microseconds), enforced by the issuing server.
    pub expires_at: u64,
}

/// Authenticator state machine.
///
/// `AwaitingChallenge → ChallengeReceived → Verified | Failed`,
/// with both end states terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    AwaitingChallenge,
    ChallengeReceived,
    Verified,
    Failed,
}

/// Drives one login attempt.
pub struct ChallengeAuthenticator {
    state: AuthState,
    challenge: Option<Challenge>,
}

impl ChallengeAuthenticator {
    /// Start a new login attempt.
    pub fn new() -> Self {
        Self {
            state: AuthState::AwaitingChallenge,
            challenge: None,
        }
    }

    /// Current protocol state.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Accept a challenge from the authentication service.
    ///
    /// Only valid while awaiting a challenge; a consumed or terminal
    /// authenticator must be replaced with a new one.
    pub fn challenge_received(&mut self, challenge: Challenge) -> Result<()> {
        if self.state != AuthState::AwaitingChallenge {
            return Err(IdentityError::Auth(format!(
                "cannot accept a challenge in state {:?}",
                self.state
            )));
        }
        self.challenge = Some(challenge);
        self.state = AuthState::ChallengeReceived;
        Ok(())
    }

    /// Sign the pending challenge nonce, consuming the challenge.
    ///
    /// Signs the exact nonce bytes with no additional framing and
    /// returns the base64 signature together with the nonce to send
    /// back for verification.
    ///
    /// # Errors
    ///
    /// `ChallengeMissing` if no challenge is pending. `SigningKeyMissing`
    /// if `signing` is `None` — the expected error when logging in on a
    /// device that never generated or imported keys; the challenge is
    /// discarded and the attempt fails.
    pub fn sign_challenge(&mut self, signing: Option<&SigningKeyPair>) -> Result<(String, String)> {
        if self.state != AuthState::ChallengeReceived {
            return Err(IdentityError::ChallengeMissing);
        }

        // Consumed either way; retrying with the same nonce is not allowed.
        let challenge = self.challenge.take().ok_or(IdentityError::ChallengeMissing)?;

        let signing = match signing {
            Some(pair) => pair,
            None => {
                self.state = AuthState::Failed;
                return Err(IdentityError::SigningKeyMissing);
            }
        };

        let signature = signing::sign_to_base64(signing.signing_key(), challenge.nonce.as_bytes());
        Ok((challenge.nonce, signature))
    }

    /// Record that the server accepted the signed challenge.
    pub fn verified(&mut self) {
        self.challenge = None;
        self.state = AuthState::Verified;
    }

    /// Record failure; discards any pending nonce so it cannot be
    /// retried.
    pub fn failed(&mut self) {
        self.challenge = None;
        self.state = AuthState::Failed;
    }
}

impl Default for ChallengeAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}
