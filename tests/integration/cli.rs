use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// The binary with an isolated, empty config location.
fn tsupdate(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tsupdate").unwrap();
    cmd.env("TSUPDATE_CONFIG", home.path().join("config.toml"))
        .env("TSUPDATE_NO_PROGRESS", "1")
        .env_remove("TS_UPDATE_WIN_MSI")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_and_track_together_rejected() {
    let home = TempDir::new().unwrap();
    tsupdate(&home)
        .args(["update", "--version", "1.45.3", "--track", "stable"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot specify both --version and --track"));
}

#[test]
fn test_unknown_track_rejected() {
    let home = TempDir::new().unwrap();
    tsupdate(&home)
        .args(["update", "--track", "beta", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown track \"beta\""));
}

#[test]
fn test_malformed_version_rejected() {
    let home = TempDir::new().unwrap();
    tsupdate(&home)
        .args(["update", "--version", "abc.def", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed version \"abc.def\""));
}

#[test]
fn test_version_prints_crate_version() {
    let home = TempDir::new().unwrap();
    tsupdate(&home)
        .arg("version")
        .assert()
        .success()
        .stdout(format!("{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_json() {
    let home = TempDir::new().unwrap();
    let output = tsupdate(&home).args(["version", "--json"]).assert().success();
    let value: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(value["short"], env!("CARGO_PKG_VERSION"));
    assert_eq!(value["track"], "stable");
    assert!(value.get("latest").is_none());
}

#[test]
fn test_malformed_config_reported() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("config.toml"), "[distribution\nbase_url = 1").unwrap();
    tsupdate(&home)
        .args(["version", "--with-latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}
