//! End-to-end tests against the built `memory-cli` binary: each test
//! gets its own database file and config, pointed at an embedding oracle
//! that is never actually reachable (port 0 on loopback refuses
//! instantly), so these run without any network dependency.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

struct Fixture {
    _dir: tempfile::TempDir,
    config_path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("memory.db");
        let config_path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            "db_path = {:?}\nembed_url = \"http://127.0.0.1:0\"\n",
            db_path.to_str().unwrap()
        )
        .unwrap();
        Self { _dir: dir, config_path }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("memory-cli").unwrap();
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }
}

#[test]
fn init_creates_and_migrates_the_database() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));
}

#[test]
fn stats_on_a_fresh_store_reports_zero_counts() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("active=0"))
        .stdout(predicate::str::contains("deprecated=0"));
}

#[test]
fn top_on_an_empty_store_reports_no_memories() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("top")
        .assert()
        .success()
        .stdout(predicate::str::contains("no memories"));
}

#[test]
fn low_activation_on_an_empty_store_reports_none() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("low-activation")
        .assert()
        .success()
        .stdout(predicate::str::contains("no low-activation memories"));
}

#[test]
fn decay_on_an_empty_store_affects_zero_rows() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("decay")
        .assert()
        .success()
        .stdout(predicate::str::contains("decayed 0 rows"));
}

#[test]
fn deprecate_with_an_unknown_old_id_fails_cleanly() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("init")
        .assert()
        .success();
    fx.cmd()
        .args(["deprecate", "missing-old", "missing-new"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("memory not found"));
}

#[test]
fn correct_with_an_unknown_corrected_id_fails_cleanly() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("init")
        .assert()
        .success();
    fx.cmd()
        .args(["correct", "missing-fix", "missing-orig"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("memory not found"));
}

#[test]
fn query_against_an_unreachable_embedding_oracle_degrades_instead_of_erroring() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("init")
        .assert()
        .success();
    fx.cmd()
        .args(["query", "anything at all"])
        .assert()
        .success();
}

#[test]
fn json_format_emits_a_single_json_object_for_stats() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["--format", "json", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}
