use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::tempdir;

const PEPPER: &str = "test-pepper";

fn bare() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pepperbox"));
    cmd.env_remove("PEPPERBOX_PEPPER")
        .env_remove("PEPPERBOX_PEPPER_FILE")
        .env_remove("PEPPERBOX_PASSWORD")
        .env_remove("PEPPERBOX_NEW_PASSWORD")
        .env_remove("PEPPERBOX_STORE")
        .env_remove("PEPPERBOX_MAX_DERIVATIONS");
    cmd
}

// cheap parameters keep the suite fast; records carry their own params
fn bin(store: &Path) -> Command {
    let mut cmd = bare();
    cmd.env("PEPPERBOX_PEPPER", PEPPER)
        .arg("--store")
        .arg(store)
        .args(["--argon-mem", "256", "--argon-parallelism", "1"]);
    cmd
}

fn register(store: &Path, user: &str, password: &str) {
    bin(store)
        .env("PEPPERBOX_PASSWORD", password)
        .args(["register", user])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("registered '{user}'")));
}

#[test]
fn register_creates_store_file() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");

    register(&store, "john_doe", "my-super-secret-password-123");

    assert!(store.exists());
}

#[test]
fn register_and_login_roundtrip() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "john_doe", "my-super-secret-password-123");

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "my-super-secret-password-123")
        .args(["login", "john_doe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("authenticated"));
}

#[test]
fn wrong_password_and_unknown_user_look_the_same() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "john_doe", "my-super-secret-password-123");

    let wrong = bin(&store)
        .env("PEPPERBOX_PASSWORD", "wrong-password")
        .args(["login", "john_doe"])
        .assert()
        .failure()
        .get_output()
        .clone();

    let unknown = bin(&store)
        .env("PEPPERBOX_PASSWORD", "some-password")
        .args(["login", "jane_doe"])
        .assert()
        .failure()
        .get_output()
        .clone();

    assert_eq!(wrong.stdout, b"authentication failed\n");
    assert_eq!(wrong.stdout, unknown.stdout);
    assert_eq!(wrong.status.code(), unknown.status.code());
}

#[test]
fn register_existing_user_fails_generically() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "A", "pw");

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "pw2")
        .args(["register", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("registration failed"))
        .stderr(predicate::str::contains("already exists").not());
}

#[test]
fn missing_pepper_aborts_startup() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");

    bare()
        .arg("--store")
        .arg(&store)
        .env("PEPPERBOX_PASSWORD", "pw")
        .args(["register", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load pepper"));

    assert!(!store.exists());
}

#[test]
fn pepper_can_come_from_file() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    let pepper_file = dir.path().join("pepper");
    std::fs::write(&pepper_file, format!("{PEPPER}\n")).unwrap();

    bare()
        .arg("--store")
        .arg(&store)
        .arg("--pepper-file")
        .arg(&pepper_file)
        .args(["--argon-mem", "256", "--argon-parallelism", "1"])
        .env("PEPPERBOX_PASSWORD", "pw")
        .args(["register", "A"])
        .assert()
        .success();

    // same secret through the environment verifies the same record
    bin(&store)
        .env("PEPPERBOX_PASSWORD", "pw")
        .args(["login", "A"])
        .assert()
        .success();
}

#[test]
fn different_pepper_cannot_login() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "A", "pw");

    bin(&store)
        .env("PEPPERBOX_PEPPER", "another-pepper")
        .env("PEPPERBOX_PASSWORD", "pw")
        .args(["login", "A"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("authentication failed"));
}

#[test]
fn passwd_replaces_password() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "A", "old");

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "old")
        .env("PEPPERBOX_NEW_PASSWORD", "new")
        .args(["passwd", "A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("password changed"));

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "new")
        .args(["login", "A"])
        .assert()
        .success();

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "old")
        .args(["login", "A"])
        .assert()
        .failure();
}

#[test]
fn passwd_with_wrong_current_password_fails() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "A", "old");

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "nope")
        .env("PEPPERBOX_NEW_PASSWORD", "new")
        .args(["passwd", "A"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("password change failed"));
}

#[test]
fn piped_registration_requires_matching_confirmation() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");

    bin(&store)
        .args(["register", "A"])
        .write_stdin("one\ntwo\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("passwords do not match"));

    bin(&store)
        .args(["register", "A"])
        .write_stdin("same\nsame\n")
        .assert()
        .success();

    bin(&store)
        .args(["login", "A"])
        .write_stdin("same\n")
        .assert()
        .success();
}

#[test]
fn store_file_holds_no_secrets() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "A", "plaintext-password");

    let contents = std::fs::read_to_string(&store).unwrap();
    assert!(contents.contains("\"A\""));
    assert!(!contents.contains("plaintext-password"));
    assert!(!contents.contains(PEPPER));
}

#[test]
fn login_upgrades_old_parameters() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("users.json");
    register(&store, "A", "pw");
    let before = std::fs::read_to_string(&store).unwrap();

    bare()
        .env("PEPPERBOX_PEPPER", PEPPER)
        .arg("--store")
        .arg(&store)
        .args(["--argon-mem", "512", "--argon-parallelism", "1"])
        .env("PEPPERBOX_PASSWORD", "pw")
        .args(["login", "A"])
        .assert()
        .success();

    let after = std::fs::read_to_string(&store).unwrap();
    assert_ne!(before, after);

    bin(&store)
        .env("PEPPERBOX_PASSWORD", "pw")
        .args(["login", "A"])
        .assert()
        .success();
}

#[test]
fn params_shows_defaults() {
    bare()
        .arg("params")
        .assert()
        .success()
        .stdout(predicate::str::contains("65536 KiB"))
        .stdout(predicate::str::contains("parallelism:      4"))
        .stdout(predicate::str::contains("32 bytes"));
}

#[test]
fn invalid_params_are_rejected() {
    bare()
        .args(["--argon-parallelism", "0", "params"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid Argon2 parameters"));
}

#[test]
fn demo_walks_through_scenario() {
    bare()
        .env("PEPPERBOX_PEPPER", PEPPER)
        .args(["--argon-mem", "256", "--argon-parallelism", "1", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registration succeeded."))
        .stdout(predicate::str::contains("Stored salt: 16 bytes, digest: 32 bytes"))
        .stdout(predicate::str::contains("Authentication succeeded."))
        .stdout(predicate::str::contains("Authentication failed."))
        .stdout(predicate::str::contains("no record for 'jane_doe'"));
}
