//! Murmur identity core — decentralized identity and end-to-end
//! encrypted direct messaging for the Murmur client.
//!
//! Provides key custody, DID derivation, challenge-response
//! authentication, per-conversation key agreement, authenticated
//! message encryption, and a portable recovery bundle format.
//! The page/UI layer talks to this crate exclusively through
//! [`client::MessagingClient`].

pub mod auth;
pub mod client;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod message;
pub mod session;
pub mod storage;
pub mod time;

// Re-export primary types
pub use auth::{AuthState, Challenge, ChallengeAuthenticator};
pub use client::{AuthService, DirectoryService, MessagingClient, SessionToken};
pub use error::{IdentityError, Result};
pub use identity::{Did, LocalIdentity, RecoveryBundle};
pub use message::{CiphertextEnvelope, IncomingMessage, MessageBody, UndecryptableReason, WireMessage};
pub use session::{ConversationSession, SessionStatus};
