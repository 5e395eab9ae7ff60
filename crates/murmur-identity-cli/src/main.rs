//! Murmur identity CLI — `murid` command.
//!
//! Manages the device's cryptographic identity: generate and inspect
//! keys, export/import recovery bundles, sign login challenges, and
//! encrypt/decrypt messages against a peer's published key.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use murmur_identity::crypto::keys::decode_key;
use murmur_identity::identity::{recovery, LocalIdentity};
use murmur_identity::message::{classify, CiphertextEnvelope, WireMessage};
use murmur_identity::session::{ConversationSession, SessionStatus};
use murmur_identity::storage::KeyStore;
use murmur_identity::time;

// ── Directory helpers ─────────────────────────────────────────────────────────

fn murmur_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MURMUR_HOME") {
        return PathBuf::from(dir);
    }
    let home = std::env::var("HOME").expect("HOME not set");
    PathBuf::from(home).join(".murmur")
}

fn keystore() -> KeyStore {
    KeyStore::new(murmur_dir())
}

fn load_identity_or_hint(store: &KeyStore) -> Result<LocalIdentity> {
    store
        .load()?
        .ok_or_else(|| anyhow!("no identity found on this device; run `murid init` or `murid import`"))
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// Murmur identity CLI — manage the local cryptographic identity and
/// end-to-end encrypted messages.
#[derive(Parser, Debug)]
#[command(
    name = "murid",
    about = "Murmur identity CLI",
    version,
    long_about = "murid — Murmur identity CLI\n\nGenerate and inspect the device identity, archive it to a recovery\nbundle, sign login challenges, and encrypt/decrypt direct messages."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new identity (rotates any existing one)
    Init {
        /// Replace an existing identity without asking
        #[arg(long)]
        force: bool,
    },

    /// Show the resident identity
    Show,

    /// Export the identity to a recovery bundle file
    Export {
        /// Output path for the bundle
        #[arg(long, short, default_value = "murmur-recovery.json")]
        output: PathBuf,

        /// Username to record as provenance
        #[arg(long, default_value = "")]
        username: String,

        /// Home server to record as provenance
        #[arg(long, default_value = "")]
        server: String,
    },

    /// Import an identity from a recovery bundle file
    Import {
        /// Path to the bundle
        file: PathBuf,
    },

    /// Erase all persisted key material (logout)
    Wipe,

    /// Sign a login challenge nonce with the resident signing key
    SignChallenge {
        /// The server-issued nonce
        nonce: String,
    },

    /// Encrypt a message for a peer
    Encrypt {
        /// The peer's base64 key-agreement public key
        #[arg(long)]
        peer_key: String,

        /// Message text
        text: String,
    },

    /// Decrypt a wire message from a peer
    Decrypt {
        /// The peer's base64 key-agreement public key
        #[arg(long)]
        peer_key: String,

        /// The opaque wire string
        wire: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    match cli.command {
        Commands::Init { force } => cmd_init(force),
        Commands::Show => cmd_show(),
        Commands::Export {
            output,
            username,
            server,
        } => cmd_export(&output, &username, &server),
        Commands::Import { file } => cmd_import(&file),
        Commands::Wipe => cmd_wipe(),
        Commands::SignChallenge { nonce } => cmd_sign_challenge(&nonce),
        Commands::Encrypt { peer_key, text } => cmd_encrypt(&peer_key, &text),
        Commands::Decrypt { peer_key, wire } => cmd_decrypt(&peer_key, &wire),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_init(force: bool) -> Result<()> {
    let store = keystore();
    if store.exists() && !force {
        bail!(
            "an identity already exists; re-run with --force to rotate it \
             (export a recovery bundle first or the current DID is lost)"
        );
    }

    let identity = LocalIdentity::generate();
    store.save(&identity)?;

    println!("Created identity");
    println!("  DID:            {}", identity.did());
    println!("  Signing key:    {}", identity.signing().public_encoded());
    println!("  Agreement key:  {}", identity.agreement().public_encoded());
    println!();
    println!("Publish the agreement key to your server profile so peers can message you.");
    Ok(())
}

fn cmd_show() -> Result<()> {
    let identity = load_identity_or_hint(&keystore())?;
    println!("DID:            {}", identity.did());
    println!("Signing key:    {}", identity.signing().public_encoded());
    println!("Agreement key:  {}", identity.agreement().public_encoded());
    println!(
        "Created:        {}",
        time::micros_to_rfc3339(identity.created_at())
    );
    Ok(())
}

fn cmd_export(output: &PathBuf, username: &str, server: &str) -> Result<()> {
    let identity = load_identity_or_hint(&keystore())?;
    recovery::export_to_file(&identity, username, server, output)
        .with_context(|| format!("writing recovery bundle to {}", output.display()))?;
    println!("Exported {} to {}", identity.did(), output.display());
    println!("Keep this file secret — it contains your private key.");
    Ok(())
}

fn cmd_import(file: &PathBuf) -> Result<()> {
    let signing = recovery::import_from_file(file)
        .with_context(|| format!("reading recovery bundle {}", file.display()))?;
    let identity = LocalIdentity::from_signing_pair(signing)?;
    keystore().save(&identity)?;

    println!("Imported identity {}", identity.did());
    println!("A fresh key-agreement pair was generated; republish it to your profile:");
    println!("  {}", identity.agreement().public_encoded());
    Ok(())
}

fn cmd_wipe() -> Result<()> {
    keystore().erase()?;
    println!("All persisted key material erased.");
    Ok(())
}

fn cmd_sign_challenge(nonce: &str) -> Result<()> {
    let identity = load_identity_or_hint(&keystore())?;
    let signature = murmur_identity::crypto::signing::sign_to_base64(
        identity.signing().signing_key(),
        nonce.as_bytes(),
    );
    println!("{signature}");
    Ok(())
}

fn session_with(peer_key_b64: &str) -> Result<(LocalIdentity, ConversationSession)> {
    let identity = load_identity_or_hint(&keystore())?;
    let peer = decode_key(peer_key_b64).context("peer key must be 32 bytes of base64")?;
    let session = ConversationSession::establish("cli", Some(identity.agreement()), Some(peer));
    if session.status() != SessionStatus::Ready {
        bail!("could not derive a session: {:?}", session.status());
    }
    Ok((identity, session))
}

fn cmd_encrypt(peer_key_b64: &str, text: &str) -> Result<()> {
    let (_, session) = session_with(peer_key_b64)?;
    let secret = session.secret().expect("ready session has a secret");
    let envelope = CiphertextEnvelope::seal(text, secret)?;
    println!("{}", envelope.pack());
    Ok(())
}

fn cmd_decrypt(peer_key_b64: &str, wire: &str) -> Result<()> {
    let (_, session) = session_with(peer_key_b64)?;
    let secret = session.secret().expect("ready session has a secret");

    match classify(wire)? {
        WireMessage::Plaintext => {
            println!("(unencrypted) {wire}");
        }
        WireMessage::Encrypted(envelope) => {
            let plaintext = envelope.open(secret).context("decryption failed")?;
            println!("{plaintext}");
        }
    }
    Ok(())
}
