//! Incoming message handling — wire classification and the
//! decrypt-once cache.
//!
//! Decryption of one message is attempted at most once; the outcome
//! (plaintext or a failure marker) is cached on the message so repeated
//! UI re-renders never re-decrypt or re-attempt a failed decryption
//! with stale inputs. The cache write is serialized per message via
//! `OnceLock`; decryption across messages can run in parallel.

pub mod envelope;

use std::sync::OnceLock;

pub use envelope::{classify, CiphertextEnvelope, WireMessage};

use crate::session::ConversationSession;

/// Why a message body could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndecryptableReason {
    /// The wire string claimed to be an envelope but did not parse.
    InvalidFormat,
    /// No shared secret is available for the conversation.
    MissingSession,
    /// AEAD authentication failed (wrong key, corruption, tampering).
    BadCiphertext,
}

impl std::fmt::Display for UndecryptableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat => write!(f, "invalid format"),
            Self::MissingSession => write!(f, "no session key"),
            Self::BadCiphertext => write!(f, "could not decrypt"),
        }
    }
}

/// The resolved body of an incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Legacy plaintext message, shown as-is.
    Clear(String),
    /// Successfully decrypted ciphertext.
    Decrypted(String),
    /// Failure marker; the UI shows the reason, never raw ciphertext.
    Undecryptable(UndecryptableReason),
}

/// One received message with its cached decryption outcome.
pub struct IncomingMessage {
    wire: String,
    decrypted: OnceLock<MessageBody>,
}

impl IncomingMessage {
    /// Wrap a raw wire string as received from the transport.
    pub fn new(wire: impl Into<String>) -> Self {
        Self {
            wire: wire.into(),
            decrypted: OnceLock::new(),
        }
    }

    /// The raw wire string.
    pub fn wire(&self) -> &str {
        &self.wire
    }

    /// Resolve the message body, decrypting at most once.
    ///
    /// The first call classifies and (if needed) decrypts; every later
    /// call returns the cached outcome regardless of the session passed
    /// in, so a failed decryption is never retried with stale inputs.
    pub fn body(&self, session: &ConversationSession) -> &MessageBody {
        self.decrypted.get_or_init(|| resolve(&self.wire, session))
    }

    /// The cached outcome, if the body has been resolved already.
    pub fn cached(&self) -> Option<&MessageBody> {
        self.decrypted.get()
    }
}

fn resolve(wire: &str, session: &ConversationSession) -> MessageBody {
    let envelope = match classify(wire) {
        Ok(WireMessage::Plaintext) => return MessageBody::Clear(wire.to_string()),
        Ok(WireMessage::Encrypted(envelope)) => envelope,
        Err(_) => return MessageBody::Undecryptable(UndecryptableReason::InvalidFormat),
    };

    let secret = match session.secret() {
        Some(secret) => secret,
        None => return MessageBody::Undecryptable(UndecryptableReason::MissingSession),
    };

    match envelope.open(secret) {
        Ok(plaintext) => MessageBody::Decrypted(plaintext),
        Err(crate::error::IdentityError::MalformedEnvelope(_)) => {
            MessageBody::Undecryptable(UndecryptableReason::InvalidFormat)
        }
        Err(_) => MessageBody::Undecryptable(UndecryptableReason::BadCiphertext),
    }
}
