//! The ciphertext envelope wire format.
//!
//! The transport layer carries exactly one opaque string per message,
//! so ciphertext and IV are packed into a single version-tagged JSON
//! object:
//!
//! ```json
//! {"v":1,"iv":"<base64-12-bytes>","ct":"<base64-ciphertext>"}
//! ```
//!
//! Classification is explicit, not heuristic: any JSON object carrying
//! the `v` tag is an envelope attempt and is either unpacked or
//! rejected as malformed — it is never downgraded to plaintext. A wire
//! string that is not such an object is a legacy plaintext message.

use serde::{Deserialize, Serialize};

use crate::crypto::agreement::SharedSecret;
use crate::crypto::cipher;
use crate::error::{IdentityError, Result};

const ENVELOPE_VERSION: u32 = 1;

/// One encrypted message: ciphertext plus IV, both base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextEnvelope {
    /// Base64 ciphertext (includes the authentication tag).
    pub ciphertext: String,
    /// Base64 12-byte IV.
    pub iv: String,
}

/// Serialized form of the envelope.
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    v: u32,
    iv: String,
    ct: String,
}

/// Result of classifying an incoming wire string.
pub enum WireMessage {
    /// Legacy unencrypted message; the wire string is the body.
    Plaintext,
    /// A packed ciphertext envelope.
    Encrypted(CiphertextEnvelope),
}

impl CiphertextEnvelope {
    /// Encrypt plaintext into an envelope. The IV is sampled freshly
    /// inside the cipher on every call.
    pub fn seal(plaintext: &str, secret: &SharedSecret) -> Result<Self> {
        let (nonce, ciphertext) = cipher::encrypt(secret, plaintext.as_bytes())?;
        Ok(Self {
            ciphertext: base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                ciphertext,
            ),
            iv: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, nonce),
        })
    }

    /// Decrypt the envelope back to plaintext.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` when the fields do not decode (bad base64,
    /// wrong IV length, non-UTF-8 plaintext); `Decryption` when AEAD
    /// authentication fails.
    pub fn open(&self, secret: &SharedSecret) -> Result<String> {
        let iv = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &self.iv)
            .map_err(|e| IdentityError::MalformedEnvelope(format!("invalid IV base64: {e}")))?;
        let ciphertext =
            base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &self.ciphertext)
                .map_err(|e| {
                    IdentityError::MalformedEnvelope(format!("invalid ciphertext base64: {e}"))
                })?;

        let plaintext = cipher::decrypt(secret, &iv, &ciphertext)?;
        String::from_utf8(plaintext)
            .map_err(|_| IdentityError::MalformedEnvelope("plaintext is not valid UTF-8".into()))
    }

    /// Pack into the single opaque wire string.
    pub fn pack(&self) -> String {
        let wire = WireEnvelope {
            v: ENVELOPE_VERSION,
            iv: self.iv.clone(),
            ct: self.ciphertext.clone(),
        };
        // Serializing three strings cannot fail.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Unpack a wire string known to be an envelope.
    ///
    /// # Errors
    ///
    /// `MalformedEnvelope` for anything that is not a well-formed,
    /// version-1 envelope.
    pub fn unpack(wire: &str) -> Result<Self> {
        let parsed: WireEnvelope = serde_json::from_str(wire)
            .map_err(|e| IdentityError::MalformedEnvelope(format!("invalid format: {e}")))?;

        if parsed.v != ENVELOPE_VERSION {
            return Err(IdentityError::MalformedEnvelope(format!(
                "unsupported envelope version {}",
                parsed.v
            )));
        }

        Ok(Self {
            ciphertext: parsed.ct,
            iv: parsed.iv,
        })
    }
}

/// Decide whether a wire string is a legacy plaintext message or a
/// packed envelope.
///
/// # Errors
///
/// `MalformedEnvelope` when the string claims to be an envelope (a
/// JSON object with a `v` field) but does not unpack. Such messages
/// are surfaced as "invalid format", never silently shown as text.
pub fn classify(wire: &str) -> Result<WireMessage> {
    let looks_tagged = matches!(
        serde_json::from_str::<serde_json::Value>(wire),
        Ok(serde_json::Value::Object(map)) if map.contains_key("v")
    );

    if !looks_tagged {
        return Ok(WireMessage::Plaintext);
    }

    CiphertextEnvelope::unpack(wire).map(WireMessage::Encrypted)
}
