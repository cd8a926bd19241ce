use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn inkp() -> Command {
    let mut cmd = Command::cargo_bin("inkp").unwrap();
    cmd.env_remove("INKPRESS_URL")
        .env_remove("INKPRESS_CONTENT_DB")
        .env_remove("INKPRESS_USER_DB")
        .env_remove("INKPRESS_PORT")
        .env_remove("INKPRESS_LOG_DIR");
    cmd
}

#[test]
fn test_cli_help() {
    inkp()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Inkpress CLI"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("health"));
}

#[test]
fn test_cli_version() {
    inkp()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("inkp"));
}

#[test]
fn test_serve_help_lists_store_options() {
    inkp()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--content-db"))
        .stdout(predicate::str::contains("--user-db"))
        .stdout(predicate::str::contains("--log-dir"));
}

#[test]
fn test_seed_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let content_db = temp_dir.path().join("content.db");
    let user_db = temp_dir.path().join("users.db");

    inkp()
        .current_dir(temp_dir.path())
        .arg("seed")
        .arg("--content-db")
        .arg(&content_db)
        .arg("--user-db")
        .arg(&user_db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Super admin:"))
        .stdout(predicate::str::contains("Demo content created"));

    inkp()
        .current_dir(temp_dir.path())
        .arg("seed")
        .arg("--content-db")
        .arg(&content_db)
        .arg("--user-db")
        .arg(&user_db)
        .assert()
        .success()
        .stdout(predicate::str::contains("already present"));

    assert!(content_db.exists());
    assert!(user_db.exists());
}

#[test]
fn test_health_offline_text() {
    inkp()
        .args(["health", "--url", "http://127.0.0.1:9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Inkpress Health Check"))
        .stdout(predicate::str::contains("OFFLINE"));
}

#[test]
fn test_health_offline_json() {
    let output = inkp()
        .args(["health", "--url", "http://127.0.0.1:9", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "offline");
    assert_eq!(report["components"]["api"]["status"], "offline");
}

#[test]
fn test_unknown_subcommand() {
    inkp()
        .arg("publish")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
