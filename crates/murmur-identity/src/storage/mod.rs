//! Persistence for the local identity.
//!
//! The default root is `~/.murmur/`, holding a single
//! `identity.json` keystore file:
//!
//! ```text
//! ~/.murmur/
//! └── identity.json
//! ```
//!
//! Conversation secrets are deliberately never persisted; they are
//! recomputed per process lifetime from the long-term keys.

pub mod keystore;

pub use keystore::KeyStore;
