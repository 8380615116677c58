use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

const UID_ONE: &str = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
const UID_TWO: &str = "01BX5ZZKBKACTAV9WEVGEMMVRY";

fn kinship(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kinship").unwrap();
    cmd.env("KINSHIP_CONFIG", dir.join("config.toml"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"));
    cmd
}

fn run(dir: &Path, args: &[&str]) {
    kinship(dir).args(args).assert().success();
}

fn json(dir: &Path, args: &[&str]) -> Value {
    let output = kinship(dir).args(["--format", "json"]).args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn edge_lifecycle() {
    let dir = tempfile::tempdir().unwrap();

    kinship(dir.path())
        .args(["edge", "add", "1", "friend", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added edge 1"));
    kinship(dir.path())
        .args(["edge", "exists", "1", "friend", "2"])
        .assert()
        .success()
        .stdout("true\n");

    kinship(dir.path())
        .args(["edge", "remove", "1", "friend", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));
    kinship(dir.path())
        .args(["edge", "exists", "1", "friend", "2"])
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn edge_save_replaces_by_id() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["edge", "add", "1", "member_of", "2"]);

    let saved = json(dir.path(), &["edge", "save", "1", "admin_of", "2", "--id", "1"]);
    let new_id = saved["id"].as_i64().unwrap();
    assert_ne!(new_id, 1);

    kinship(dir.path())
        .args(["edge", "get", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Edge 1 not found"));

    let listed = json(dir.path(), &["edge", "list", "1"]);
    let edges = listed.as_array().unwrap();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["relationship"], "admin_of");
}

#[test]
fn edge_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();

    kinship(dir.path())
        .args(["edge", "add", "0", "friend", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("guid must be positive"));
    kinship(dir.path())
        .args(["edge", "add", "1", ";'", "2"])
        .assert()
        .failure();
}

#[test]
fn relationship_query() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["entity", "put", "42", "-t", "user", "--access", "2"]);
    run(dir.path(), &["entity", "put", "10", "-t", "group", "--access", "2"]);
    run(dir.path(), &["entity", "put", "11", "-t", "group", "--access", "9"]);
    run(dir.path(), &["edge", "add", "42", "member_of", "10"]);
    run(dir.path(), &["edge", "add", "42", "member_of", "11"]);

    let found = json(
        dir.path(),
        &["query", "member_of", "42", "--type", "group", "--access", "2"],
    );
    let guids: Vec<i64> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["guid"].as_i64().unwrap())
        .collect();
    assert_eq!(guids, vec![10]);

    let inverse = json(
        dir.path(),
        &["query", "member_of", "10", "--inverse", "--access", "2"],
    );
    assert_eq!(inverse[0]["guid"], 42);
}

#[test]
fn query_order_is_restricted() {
    let dir = tempfile::tempdir().unwrap();

    kinship(dir.path())
        .args(["query", "friend", "1", "--order", "guid; DROP TABLE entities"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid ordering"));
}

#[test]
fn export_import_round_trip() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let file = source.path().join("export.json");

    run(source.path(), &["entity", "put", "1", "-t", "user", "--uid", UID_ONE]);
    run(source.path(), &["entity", "put", "2", "-t", "group", "--uid", UID_TWO]);
    run(source.path(), &["edge", "add", "1", "member_of", "2"]);
    kinship(source.path())
        .args(["export", "1", "-o"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 relationship(s)"));

    // Same portable identifiers under different local guids
    run(target.path(), &["entity", "put", "7", "-t", "user", "--uid", UID_ONE]);
    run(target.path(), &["entity", "put", "8", "-t", "group", "--uid", UID_TWO]);
    kinship(target.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 relationship(s), skipped 0"));

    kinship(target.path())
        .args(["edge", "exists", "7", "member_of", "8"])
        .assert()
        .success()
        .stdout("true\n");
}

#[test]
fn import_skips_unknown_endpoints() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let file = source.path().join("export.json");

    run(source.path(), &["entity", "put", "1", "-t", "user", "--uid", UID_ONE]);
    run(source.path(), &["entity", "put", "2", "-t", "group", "--uid", UID_TWO]);
    run(source.path(), &["edge", "add", "1", "member_of", "2"]);
    kinship(source.path()).args(["export", "1", "-o"]).arg(&file).assert().success();

    run(target.path(), &["entity", "put", "7", "-t", "user", "--uid", UID_ONE]);
    kinship(target.path())
        .arg("import")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 0 relationship(s), skipped 1"));
}

#[test]
fn import_rejects_other_versions() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("doc.json");
    std::fs::write(&file, r#"{"name": "relationship", "elements": []}"#).unwrap();

    kinship(dir.path())
        .arg("import")
        .arg(&file)
        .args(["--version", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported version 2"));
}

#[test]
fn export_raw_rows() {
    let dir = tempfile::tempdir().unwrap();
    run(dir.path(), &["edge", "add", "5", "follows", "6"]);
    run(dir.path(), &["edge", "add", "6", "follows", "5"]);

    let output = kinship(dir.path()).args(["export", "5", "--rows"]).output().unwrap();
    assert!(output.status.success());
    let rows: Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["guid_one"], 5);
    assert_eq!(rows[0]["relationship"], "follows");
}

#[cfg(unix)]
#[test]
fn export_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("export.json");
    run(dir.path(), &["edge", "add", "5", "follows", "6"]);
    kinship(dir.path()).args(["export", "5", "-o"]).arg(&file).assert().success();

    let mode = std::fs::metadata(&file).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn redb_backend() {
    let dir = tempfile::tempdir().unwrap();
    kinship(dir.path())
        .args(["--backend", "redb", "edge", "add", "1", "friend", "2"])
        .assert()
        .success();
    kinship(dir.path())
        .args(["--backend", "redb", "edge", "exists", "1", "friend", "2"])
        .assert()
        .success()
        .stdout("true\n");

    assert!(dir.path().join("data").join("kinship.redb").exists());
}

#[test]
fn config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();

    run(dir.path(), &["config", "set", "backend", "redb"]);
    kinship(dir.path())
        .args(["config", "get", "backend"])
        .assert()
        .success()
        .stdout("redb\n");

    kinship(dir.path())
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key"));

    kinship(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn completions() {
    let dir = tempfile::tempdir().unwrap();
    kinship(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("kinship"));
}
