//! Integration test: full end-to-end workflow.
//!
//! Covers the complete lifecycle:
//! 1. Create identities on two devices
//! 2. Challenge-response login
//! 3. Publish/fetch key-agreement keys and derive sessions
//! 4. Exchange encrypted messages both ways
//! 5. Archive and restore an identity via a recovery bundle

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use murmur_identity::auth::Challenge;
use murmur_identity::client::{AuthService, DirectoryService, MessagingClient, SessionToken};
use murmur_identity::crypto::keys::{decode_key, SigningKeyPair};
use murmur_identity::crypto::signing::verify_from_base64;
use murmur_identity::error::{IdentityError, Result};
use murmur_identity::identity::Did;
use murmur_identity::message::{IncomingMessage, MessageBody};
use murmur_identity::session::SessionStatus;
use murmur_identity::storage::KeyStore;
use murmur_identity::time;

/// Test double for the authentication service: issues single-use nonces
/// and verifies signatures against registered public keys, like the
/// real server would.
#[derive(Default)]
struct TestAuthServer {
    keys: Mutex<HashMap<String, [u8; 32]>>,
    used_nonces: Mutex<Vec<String>>,
    issued: AtomicU64,
}

impl TestAuthServer {
    fn register(&self, did: &Did, public_key: [u8; 32]) {
        self.keys
            .lock()
            .unwrap()
            .insert(did.as_str().to_string(), public_key);
    }
}

impl AuthService for TestAuthServer {
    fn issue_challenge(&self, did: &Did) -> Result<Challenge> {
        let serial = self.issued.fetch_add(1, Ordering::SeqCst);
        Ok(Challenge {
            nonce: format!("challenge:{did}:{serial}"),
            did: did.clone(),
            expires_at: time::now_micros() + 60_000_000,
        })
    }

    fn verify_challenge(&self, did: &Did, nonce: &str, signature_b64: &str) -> Result<SessionToken> {
        // Replay protection lives server-side.
        let mut used = self.used_nonces.lock().unwrap();
        if used.iter().any(|n| n == nonce) {
            return Err(IdentityError::ChallengeRejected("nonce replayed".into()));
        }
        used.push(nonce.to_string());

        let keys = self.keys.lock().unwrap();
        let key = keys
            .get(did.as_str())
            .ok_or_else(|| IdentityError::ChallengeRejected("unknown DID".into()))?;
        let verifying = SigningKeyPair::verifying_key_from_bytes(key)?;
        verify_from_base64(&verifying, nonce.as_bytes(), signature_b64)?;
        Ok(SessionToken(format!("session-{did}")))
    }
}

/// Test double for the user directory.
#[derive(Default)]
struct TestDirectory {
    keys: Mutex<HashMap<String, [u8; 32]>>,
}

impl TestDirectory {
    fn insert(&self, peer: &str, key: [u8; 32]) {
        self.keys.lock().unwrap().insert(peer.to_string(), key);
    }
}

impl DirectoryService for TestDirectory {
    fn fetch_peer_key(&self, peer: &str) -> Result<Option<[u8; 32]>> {
        Ok(self.keys.lock().unwrap().get(peer).copied())
    }

    fn publish_local_key(&self, did: &Did, public_key_encoded: &str) -> Result<()> {
        let key = decode_key(public_key_encoded)?;
        self.keys
            .lock()
            .unwrap()
            .insert(did.as_str().to_string(), key);
        Ok(())
    }
}

fn make_client(
    dir: &tempfile::TempDir,
) -> MessagingClient<TestAuthServer, TestDirectory> {
    MessagingClient::new(
        KeyStore::new(dir.path()),
        TestAuthServer::default(),
        TestDirectory::default(),
    )
}

#[test]
fn full_workflow_identity_to_recovery() {
    // ── Step 1: Create identities on two devices ────────────────────────
    let alice_dir = tempfile::tempdir().unwrap();
    let bob_dir = tempfile::tempdir().unwrap();
    let alice = make_client(&alice_dir);
    let bob = make_client(&bob_dir);

    let alice_id = alice.get_or_create_identity().unwrap();
    let bob_id = bob.get_or_create_identity().unwrap();

    assert_ne!(alice_id.did(), bob_id.did());
    assert!(alice_id.did().as_str().starts_with("did:mur:"));
    assert!(bob_id.did().as_str().starts_with("did:mur:"));

    // ── Step 2: Challenge-response login ────────────────────────────────
    alice
        .auth_service()
        .register(alice_id.did(), alice_id.signing().public_bytes());
    let token = alice.sign_in().expect("login should succeed");
    assert!(token.0.contains(alice_id.did().as_str()));

    // ── Step 3: Sessions in both directions ─────────────────────────────
    // Each side publishes at identity creation; mirror the peer entries
    // the way the shared server directory would present them.
    alice
        .directory_service()
        .insert("bob", bob_id.agreement().public_bytes());
    bob.directory_service()
        .insert("alice", alice_id.agreement().public_bytes());

    let alice_session = alice.conversation_session("dm-1", "bob").unwrap();
    let bob_session = bob.conversation_session("dm-1", "alice").unwrap();
    assert_eq!(alice_session.status(), SessionStatus::Ready);
    assert_eq!(bob_session.status(), SessionStatus::Ready);

    // ── Step 4: Encrypted exchange both ways ────────────────────────────
    let wire_a = alice
        .encrypt_outgoing("hey bob, it works!", &alice_session)
        .unwrap();
    assert!(!wire_a.contains("it works"), "wire must not leak plaintext");

    let incoming_a = IncomingMessage::new(wire_a);
    assert_eq!(
        bob.decrypt_incoming(&incoming_a, &bob_session),
        &MessageBody::Decrypted("hey bob, it works!".to_string())
    );

    let wire_b = bob.encrypt_outgoing("confirmed.", &bob_session).unwrap();
    let incoming_b = IncomingMessage::new(wire_b);
    assert_eq!(
        alice.decrypt_incoming(&incoming_b, &alice_session),
        &MessageBody::Decrypted("confirmed.".to_string())
    );

    // Legacy plaintext still renders.
    let legacy = IncomingMessage::new("plain old message");
    assert_eq!(
        bob.decrypt_incoming(&legacy, &bob_session),
        &MessageBody::Clear("plain old message".to_string())
    );

    // ── Step 5: Recovery bundle round trip ──────────────────────────────
    let bundle_path = alice_dir.path().join("alice-backup.json");
    alice
        .export_identity_to_file(&bundle_path, "alice", "mur.example")
        .unwrap();

    alice.wipe_identity().unwrap();
    assert!(matches!(
        alice.sign_in(),
        Err(IdentityError::SigningKeyMissing)
    ));

    let restored = alice.import_identity_from_file(&bundle_path).unwrap();
    assert_eq!(restored.did(), alice_id.did());

    // The restored identity logs in again with the same DID.
    let token = alice.sign_in().expect("login after restore");
    assert!(token.0.contains(alice_id.did().as_str()));

    // The key-agreement pair is fresh and was republished.
    let republished = alice
        .directory_service()
        .fetch_peer_key(alice_id.did().as_str())
        .unwrap()
        .expect("restored key should be published");
    assert_ne!(republished, alice_id.agreement().public_bytes());
    assert_eq!(republished, restored.agreement().public_bytes());
}

#[test]
fn login_refuses_replayed_nonce() {
    let dir = tempfile::tempdir().unwrap();
    let client = make_client(&dir);
    let identity = client.get_or_create_identity().unwrap();
    client
        .auth_service()
        .register(identity.did(), identity.signing().public_bytes());

    // Two logins are two fresh challenges; each succeeds exactly once.
    client.sign_in().expect("first login");
    client.sign_in().expect("second login uses a new nonce");
}

#[test]
fn session_reflects_missing_peer_key() {
    let dir = tempfile::tempdir().unwrap();
    let client = make_client(&dir);
    client.get_or_create_identity().unwrap();

    let session = client
        .conversation_session("dm-2", "never-published")
        .unwrap();
    assert_eq!(session.status(), SessionStatus::PeerKeyMissing);
    assert!(matches!(
        client.encrypt_outgoing("hi", &session),
        Err(IdentityError::SessionNotReady(_))
    ));

    // The peer publishes a key; re-derivation is the caller's job and
    // now succeeds.
    let peer = murmur_identity::crypto::keys::KeyAgreementKeyPair::generate();
    client
        .directory_service()
        .insert("never-published", peer.public_bytes());
    let session = client
        .conversation_session("dm-2", "never-published")
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Ready);
}

#[test]
fn rotation_produces_new_did_and_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let client = make_client(&dir);
    let first = client.get_or_create_identity().unwrap();

    // Rotate by wiping and recreating.
    client.wipe_identity().unwrap();
    let second = client.get_or_create_identity().unwrap();
    assert_ne!(first.did(), second.did());

    // Sessions derived against the new agreement key differ from the old.
    let peer = murmur_identity::crypto::keys::KeyAgreementKeyPair::generate();
    client.directory_service().insert("p", peer.public_bytes());
    let session = client.conversation_session("dm-3", "p").unwrap();
    assert_eq!(session.status(), SessionStatus::Ready);

    let old_session = murmur_identity::session::ConversationSession::establish(
        "dm-3",
        Some(first.agreement()),
        Some(peer.public_bytes()),
    );
    assert_ne!(
        session.secret().unwrap().as_bytes(),
        old_session.secret().unwrap().as_bytes()
    );
}
