//! Cryptographic primitives for the Murmur identity core.
//!
//! This module provides:
//! - Ed25519 key generation, signing, and verification (authentication)
//! - X25519 Diffie-Hellman key agreement (confidentiality)
//! - HKDF-SHA256 derivation of per-conversation message keys
//! - ChaCha20-Poly1305 authenticated encryption
//! - Cryptographically secure random number generation
//!
//! Signing keys and key-agreement keys are algorithmically independent;
//! an Ed25519 key is never reused for Diffie-Hellman and vice versa.

pub mod agreement;
pub mod cipher;
pub mod keys;
pub mod random;
pub mod signing;
