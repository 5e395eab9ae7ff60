//! Integration tests for the CLI binary.
//!
//! Exercises the `murid` binary end to end against a scratch
//! MURMUR_HOME: identity lifecycle, recovery bundles, challenge
//! signing, and message encryption between two homes.
//!
//! This test is registered as a [[test]] in the murmur-identity-cli
//! crate so that CARGO_BIN_EXE_murid is available.

use std::path::Path;
use std::process::{Command, Output};

/// Get a Command pointing to the `murid` binary with its home pinned
/// to a scratch directory.
fn murid(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_murid"));
    cmd.env("MURMUR_HOME", home);
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    murid(home)
        .args(args)
        .output()
        .expect("failed to execute murid")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Pull a labelled value ("Label:   value") out of `murid show` output.
fn field(stdout: &str, label: &str) -> String {
    stdout
        .lines()
        .find(|l| l.trim_start().starts_with(label))
        .unwrap_or_else(|| panic!("missing field {label} in: {stdout}"))
        .split_once(':')
        .unwrap()
        .1
        .trim()
        .to_string()
}

#[test]
fn cli_responds_to_help() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--help"]);
    assert_success(&output, "murid --help");

    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("murid") || stdout.contains("Usage"),
        "murid --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--version"]);
    assert_success(&output, "murid --version");

    let stdout = stdout_of(&output);
    assert!(
        stdout.contains("0.2") || stdout.contains("murid"),
        "murid --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let home = tempfile::tempdir().unwrap();
    let output = run(home.path(), &["--nonexistent-flag"]);
    assert!(
        !output.status.success(),
        "murid with unknown flag should exit with error"
    );
}

#[test]
fn init_show_wipe_lifecycle() {
    let home = tempfile::tempdir().unwrap();

    // No identity yet.
    let output = run(home.path(), &["show"]);
    assert!(!output.status.success(), "show before init should fail");

    let output = run(home.path(), &["init"]);
    assert_success(&output, "murid init");
    let did = field(&stdout_of(&output), "DID:");
    assert!(did.starts_with("did:mur:"), "got DID {did}");

    // Show reports the same DID.
    let output = run(home.path(), &["show"]);
    assert_success(&output, "murid show");
    assert_eq!(field(&stdout_of(&output), "DID:"), did);

    // A second init without --force refuses to clobber the identity.
    let output = run(home.path(), &["init"]);
    assert!(!output.status.success(), "init over an identity should fail");

    // With --force it rotates to a fresh DID.
    let output = run(home.path(), &["init", "--force"]);
    assert_success(&output, "murid init --force");
    assert_ne!(field(&stdout_of(&output), "DID:"), did);

    let output = run(home.path(), &["wipe"]);
    assert_success(&output, "murid wipe");
    let output = run(home.path(), &["show"]);
    assert!(!output.status.success(), "show after wipe should fail");
}

#[test]
fn export_import_restores_the_same_did() {
    let home = tempfile::tempdir().unwrap();
    let bundle = home.path().join("backup.json");

    let output = run(home.path(), &["init"]);
    assert_success(&output, "murid init");
    let did = field(&stdout_of(&output), "DID:");

    let output = run(
        home.path(),
        &[
            "export",
            "--output",
            bundle.to_str().unwrap(),
            "--username",
            "carol",
            "--server",
            "mur.example",
        ],
    );
    assert_success(&output, "murid export");
    assert!(bundle.exists());

    let output = run(home.path(), &["wipe"]);
    assert_success(&output, "murid wipe");

    let output = run(home.path(), &["import", bundle.to_str().unwrap()]);
    assert_success(&output, "murid import");
    assert!(stdout_of(&output).contains(&did), "import should restore {did}");
}

#[test]
fn sign_challenge_is_deterministic_per_nonce() {
    let home = tempfile::tempdir().unwrap();
    run(home.path(), &["init"]);

    let a = run(home.path(), &["sign-challenge", "nonce-123"]);
    let b = run(home.path(), &["sign-challenge", "nonce-123"]);
    let c = run(home.path(), &["sign-challenge", "nonce-456"]);
    assert_success(&a, "sign-challenge");

    // Ed25519 is deterministic: same key, same nonce, same signature.
    assert_eq!(stdout_of(&a), stdout_of(&b));
    assert_ne!(stdout_of(&a), stdout_of(&c));
}

#[test]
fn encrypt_and_decrypt_between_two_homes() {
    let alice_home = tempfile::tempdir().unwrap();
    let bob_home = tempfile::tempdir().unwrap();

    let alice_init = run(alice_home.path(), &["init"]);
    let bob_init = run(bob_home.path(), &["init"]);
    assert_success(&alice_init, "alice init");
    assert_success(&bob_init, "bob init");

    let alice_key = field(&stdout_of(&alice_init), "Agreement key:");
    let bob_key = field(&stdout_of(&bob_init), "Agreement key:");

    let output = run(
        alice_home.path(),
        &["encrypt", "--peer-key", &bob_key, "secret hello"],
    );
    assert_success(&output, "murid encrypt");
    let wire = stdout_of(&output).trim().to_string();
    assert!(!wire.contains("secret hello"), "wire leaks plaintext: {wire}");

    let output = run(
        bob_home.path(),
        &["decrypt", "--peer-key", &alice_key, &wire],
    );
    assert_success(&output, "murid decrypt");
    assert_eq!(stdout_of(&output).trim(), "secret hello");

    // A third party cannot read it.
    let eve_home = tempfile::tempdir().unwrap();
    run(eve_home.path(), &["init"]);
    let output = run(
        eve_home.path(),
        &["decrypt", "--peer-key", &alice_key, &wire],
    );
    assert!(!output.status.success(), "eve should not decrypt the wire");
}
