//! Smoke tests -- verify the binary runs and key subcommands behave.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

/// 15 quiet minutes of `failed=3` followed by a spike of 40.
fn write_fixture(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let mut tx = String::from("timestamp,status,count\n");
    let mut auth = String::from("timestamp,auth_code,count\n");
    for m in 0..16 {
        let failed = if m == 15 { 40 } else { 3 };
        tx.push_str(&format!("2024-01-01 10:{:02}:00,approved,120\n", m));
        tx.push_str(&format!("2024-01-01 10:{:02}:00,failed,{}\n", m, failed));
        auth.push_str(&format!("2024-01-01 10:{:02}:00,0,120\n", m));
    }

    let tx_path = dir.join("transactions.csv");
    let auth_path = dir.join("transactions_auth_codes.csv");
    let config_path = dir.join("txpulse.toml");
    std::fs::write(&tx_path, tx).unwrap();
    std::fs::write(&auth_path, auth).unwrap();
    std::fs::write(&config_path, "[pacing]\ntick_ms = 0\n").unwrap();
    (tx_path, auth_path, config_path)
}

#[test]
fn test_cli_help() {
    Command::cargo_bin("txpulse")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("volume spike monitoring"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("txpulse")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("txpulse"));
}

#[test]
fn test_run_subcommand_exists() {
    Command::cargo_bin("txpulse")
        .unwrap()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--window-size"));
}

#[test]
fn test_check_config_rejects_zero_window() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "[window]\nsize = 0\n").unwrap();

    Command::cargo_bin("txpulse")
        .unwrap()
        .args(["check-config", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("window.size must be a positive"));
}

#[test]
fn test_check_config_prints_effective_settings() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, _, config) = write_fixture(dir.path());

    Command::cargo_bin("txpulse")
        .unwrap()
        .args(["check-config", "--config"])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("tick_ms = 0"))
        .stdout(predicate::str::contains("configuration OK"));
}

#[test]
fn test_run_raises_spike_and_writes_snapshots() {
    let dir = tempfile::TempDir::new().unwrap();
    let (tx, auth, config) = write_fixture(dir.path());
    let log = dir.path().join("out/snapshots.jsonl");

    Command::cargo_bin("txpulse")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("--transactions")
        .arg(&tx)
        .arg("--auth-codes")
        .arg(&auth)
        .arg("--snapshot-log")
        .arg(&log)
        .args(["--alert-sink", "json", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key":"failed""#))
        .stdout(predicate::str::contains(r#""current_value":40"#))
        .stdout(predicate::str::contains(
            "Processed 16 minute(s), raised 1 anomaly signal(s)",
        ));

    let content = std::fs::read_to_string(&log).unwrap();
    assert_eq!(content.lines().count(), 16);

    Command::cargo_bin("txpulse")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["snapshots", "--limit", "3", "--path"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Latest snapshot (2024-01-01 10:15:00)"))
        .stdout(predicate::str::contains("(16 snapshot(s) total)"));
}

#[test]
fn test_run_with_missing_input_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    let (_, auth, config) = write_fixture(dir.path());

    Command::cargo_bin("txpulse")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("--transactions")
        .arg(dir.path().join("missing.csv"))
        .arg("--auth-codes")
        .arg(&auth)
        .arg("--snapshot-log")
        .arg(dir.path().join("snapshots.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.csv"));
}

#[test]
fn test_unparsable_env_config_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[window]\nsize = \"thirty\"\n").unwrap();

    Command::cargo_bin("txpulse")
        .unwrap()
        .current_dir(dir.path())
        .env("TXPULSE_CONFIG", &config)
        .arg("check-config")
        .assert()
        .failure()
        .stdout(predicate::str::contains("configuration OK").not())
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn test_unparsable_local_config_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("txpulse.toml"), "[window\nsize = ").unwrap();

    Command::cargo_bin("txpulse")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("TXPULSE_CONFIG")
        .arg("check-config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("txpulse.toml"));
}

#[test]
fn test_dashboard_stays_off_stdout() {
    let dir = tempfile::TempDir::new().unwrap();
    let (tx, auth, config) = write_fixture(dir.path());

    Command::cargo_bin("txpulse")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .arg("run")
        .arg("--transactions")
        .arg(&tx)
        .arg("--auth-codes")
        .arg(&auth)
        .arg("--snapshot-log")
        .arg(dir.path().join("snapshots.jsonl"))
        .args(["--alert-sink", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key":"failed""#))
        .stdout(predicate::str::contains("SNAPSHOT").not())
        .stderr(predicate::str::contains("========= SNAPSHOT ========="));
}
