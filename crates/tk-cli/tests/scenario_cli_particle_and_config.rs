use assert_cmd::prelude::*;
use chrono::Local;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tk_store::SeriesFile;

const TOKEN_ENV: &str = "TARKKA_TEST_PARTICLE_TOKEN";

fn write_today(dir: &Path, prices: Vec<f64>) -> PathBuf {
    let path = dir.join("prices.json");
    let file = SeriesFile::for_day(Local::now().date_naive(), prices).unwrap();
    tk_store::save(&path, &file).unwrap();
    path
}

/// Overlay pointing the token lookup at a variable the tests control.
fn token_overlay(dir: &Path) -> PathBuf {
    let path = dir.join("particle.yaml");
    std::fs::write(
        &path,
        format!("particle:\n  token_env: \"{TOKEN_ENV}\"\n  base_url: \"http://127.0.0.1:9\"\n"),
    )
    .unwrap();
    path
}

fn tarkka(dir: &Path, file: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tarkka").unwrap();
    cmd.env_remove(TOKEN_ENV)
        .arg("--config")
        .arg(token_overlay(dir))
        .arg("--file")
        .arg(file);
    cmd
}

#[test]
fn publish_without_match_reports_hour_and_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_today(dir.path(), vec![5.0; 24]);

    tarkka(dir.path(), &file)
        .args(["publish", "over", "1000", "--event", "tarkka-peak"])
        .assert()
        .success()
        .stdout(predicate::str::contains("did not match query"));
}

#[test]
fn call_on_match_requires_token_and_names_the_variable() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_today(dir.path(), vec![5.0; 24]);

    tarkka(dir.path(), &file)
        .args([
            "call", "over", "0", "--device", "boiler", "--function", "relay",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(TOKEN_ENV));
}

#[test]
fn call_with_literal_hour_miss_skips_device() {
    let dir = tempfile::tempdir().unwrap();
    // Only hour 0 is over the limit.
    let mut prices = vec![1.0; 24];
    prices[0] = 50.0;
    let file = write_today(dir.path(), prices);

    tarkka(dir.path(), &file)
        .args([
            "call", "over", "10", "--device", "boiler", "--function", "relay", "--hour", "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hour 5 did not match query 'over'."));
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("unused.json");

    let out = tarkka(dir.path(), &file).arg("config-hash").output().unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let mut lines = stdout.lines();
    let hash = lines
        .next()
        .unwrap()
        .strip_prefix("config_hash=")
        .unwrap()
        .to_string();
    assert_eq!(hash.len(), 64);

    let canonical: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
    assert_eq!(canonical["particle"]["token_env"], TOKEN_ENV);
}

#[test]
fn literal_token_in_config_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("bad.yaml");
    std::fs::write(
        &cfg,
        "particle:\n  token_env: \"0123456789abcdef0123456789abcdef01234567\"\n",
    )
    .unwrap();

    Command::cargo_bin("tarkka")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .arg("config-hash")
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"));
}
