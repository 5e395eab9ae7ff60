//! The narrow interface exposed to the page/UI layer.
//!
//! [`MessagingClient`] is the only surface the rest of the application
//! talks to. The two external services it depends on — the
//! authentication service that issues and verifies challenges, and the
//! user directory that stores published key-agreement public keys —
//! sit behind traits so the HTTP layer (and tests) can supply their
//! own implementations.
//!
//! Every method returns a typed result; no error escapes this boundary
//! as a panic, and nothing here ever falls back from encrypted to
//! plaintext transmission on its own.

use std::path::Path;

use crate::auth::{Challenge, ChallengeAuthenticator};
use crate::error::{IdentityError, Result};
use crate::identity::{recovery, Did, LocalIdentity};
use crate::message::{IncomingMessage, MessageBody};
use crate::session::ConversationSession;
use crate::storage::KeyStore;

/// Opaque session token returned by the authentication service after a
/// successful challenge verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

/// The external authentication service (server-side nonce issuer and
/// signature verifier).
pub trait AuthService {
    /// Request a login challenge for a DID.
    fn issue_challenge(&self, did: &Did) -> Result<Challenge>;

    /// Submit the signed challenge for verification.
    fn verify_challenge(&self, did: &Did, nonce: &str, signature_b64: &str)
        -> Result<SessionToken>;
}

/// The external user directory holding published key-agreement public
/// keys.
pub trait DirectoryService {
    /// Fetch a peer's published key-agreement public key. `None` means
    /// the peer has not published one.
    fn fetch_peer_key(&self, peer: &str) -> Result<Option<[u8; 32]>>;

    /// Publish the local key-agreement public key.
    fn publish_local_key(&self, did: &Did, public_key_encoded: &str) -> Result<()>;
}

/// Facade over the identity and messaging core.
pub struct MessagingClient<A, D> {
    keystore: KeyStore,
    auth: A,
    directory: D,
}

impl<A: AuthService, D: DirectoryService> MessagingClient<A, D> {
    pub fn new(keystore: KeyStore, auth: A, directory: D) -> Self {
        Self {
            keystore,
            auth,
            directory,
        }
    }

    /// The authentication service backing this client.
    pub fn auth_service(&self) -> &A {
        &self.auth
    }

    /// The directory service backing this client.
    pub fn directory_service(&self) -> &D {
        &self.directory
    }

    /// Load the persisted identity, or generate, persist, and publish a
    /// fresh one if this device has none yet.
    pub fn get_or_create_identity(&self) -> Result<LocalIdentity> {
        if let Some(identity) = self.keystore.load()? {
            return Ok(identity);
        }

        let identity = LocalIdentity::generate();
        self.keystore.save(&identity)?;
        self.directory
            .publish_local_key(identity.did(), &identity.agreement().public_encoded())?;
        log::info!("created new identity {}", identity.did());
        Ok(identity)
    }

    /// Perform a full challenge-response login with the resident key.
    ///
    /// # Errors
    ///
    /// `SigningKeyMissing` when no identity exists on this device;
    /// `ChallengeRejected` when the server refuses the signature. Any
    /// failure discards the nonce — retrying starts a fresh exchange.
    pub fn sign_in(&self) -> Result<SessionToken> {
        let identity = self.keystore.load()?;
        let did = match &identity {
            Some(identity) => identity.did().clone(),
            None => return Err(IdentityError::SigningKeyMissing),
        };

        let mut authenticator = ChallengeAuthenticator::new();
        let challenge = self.auth.issue_challenge(&did)?;
        authenticator.challenge_received(challenge)?;

        let (nonce, signature) =
            match authenticator.sign_challenge(identity.as_ref().map(|i| i.signing())) {
                Ok(signed) => signed,
                Err(e) => {
                    authenticator.failed();
                    return Err(e);
                }
            };

        match self.auth.verify_challenge(&did, &nonce, &signature) {
            Ok(token) => {
                authenticator.verified();
                log::debug!("signed in as {did}");
                Ok(token)
            }
            Err(e) => {
                authenticator.failed();
                Err(e)
            }
        }
    }

    /// Restore an identity from a recovery bundle file, replacing any
    /// existing local identity and publishing a fresh key-agreement
    /// public key.
    pub fn import_identity_from_file(&self, path: &Path) -> Result<LocalIdentity> {
        let signing = recovery::import_from_file(path)?;
        let identity = LocalIdentity::from_signing_pair(signing)?;
        self.keystore.save(&identity)?;
        self.directory
            .publish_local_key(identity.did(), &identity.agreement().public_encoded())?;
        log::info!("imported identity {}", identity.did());
        Ok(identity)
    }

    /// Archive the resident identity to a recovery bundle file.
    pub fn export_identity_to_file(
        &self,
        path: &Path,
        owner_username: &str,
        owner_server: &str,
    ) -> Result<()> {
        let identity = self
            .keystore
            .load()?
            .ok_or(IdentityError::SigningKeyMissing)?;
        recovery::export_to_file(&identity, owner_username, owner_server, path)
    }

    /// Derive the conversation session for a thread against a peer.
    ///
    /// Re-invoke when the active thread changes or the local keys
    /// rotate; the returned session is an independent value.
    pub fn conversation_session(&self, thread_id: &str, peer: &str) -> Result<ConversationSession> {
        let identity = self.keystore.load()?;
        let peer_key = self.directory.fetch_peer_key(peer)?;
        Ok(ConversationSession::establish(
            thread_id,
            identity.as_ref().map(|i| i.agreement()),
            peer_key,
        ))
    }

    /// Encrypt an outgoing message into the packed wire string.
    ///
    /// # Errors
    ///
    /// `SessionNotReady` unless the session has a derived secret. The
    /// caller decides what to do with an unencryptable thread; this
    /// method never silently sends plaintext.
    pub fn encrypt_outgoing(&self, text: &str, session: &ConversationSession) -> Result<String> {
        let secret = session
            .secret()
            .ok_or(IdentityError::SessionNotReady(session.status()))?;
        let envelope = crate::message::CiphertextEnvelope::seal(text, secret)?;
        Ok(envelope.pack())
    }

    /// Resolve an incoming message body against a session, decrypting
    /// at most once (see [`IncomingMessage::body`]).
    pub fn decrypt_incoming<'m>(
        &self,
        message: &'m IncomingMessage,
        session: &ConversationSession,
    ) -> &'m MessageBody {
        message.body(session)
    }

    /// Wipe all persisted key material (logout).
    pub fn wipe_identity(&self) -> Result<()> {
        self.keystore.erase()
    }
}
