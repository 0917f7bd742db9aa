use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const SNAPSHOT: &str = r#"{
    "tag": "body",
    "children": [
        { "tag": "h1", "children": ["Pricing"] },
        { "tag": "ul", "attrs": { "id": "plans" }, "children": [
            { "tag": "li", "children": ["Basic $10"] },
            { "tag": "li", "children": ["Pro $20"] }
        ] }
    ]
}"#;

const STORED: &str = r#"{
    "version": 1,
    "records": [
        {"url": "https://shop.test/pricing", "xpath": "body/h1[1]", "type": "text",
         "newContent": "Plans", "originalContent": "Pricing"},
        {"url": "https://shop.test/pricing", "xpath": "id(\"plans\")/li[2]", "type": "text",
         "newContent": "Pro $15", "originalContent": "Pro $20"},
        {"url": "https://other.test/", "xpath": "body/p[1]", "type": "text",
         "newContent": "Elsewhere", "originalContent": "Here"}
    ]
}"#;

fn pagepatch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pagepatch").unwrap();
    cmd.env("PAGEPATCH_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("PAGEPATCH_LOG");
    cmd
}

fn seed(home: &Path) {
    fs::write(home.join("patches.json"), STORED).unwrap();
}

#[test]
fn test_list_empty_store() {
    let temp_dir = tempfile::tempdir().unwrap();
    pagepatch(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored edits."));
}

#[test]
fn test_list_filters_by_page() {
    let temp_dir = tempfile::tempdir().unwrap();
    seed(temp_dir.path());

    pagepatch(temp_dir.path())
        .args(["list", "--page", "https://shop.test/pricing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plans"))
        .stdout(predicate::str::contains("Pro $15"))
        .stdout(predicate::str::contains("Elsewhere").not());

    pagepatch(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Elsewhere"));
}

#[test]
fn test_clear_then_list() {
    let temp_dir = tempfile::tempdir().unwrap();
    seed(temp_dir.path());

    pagepatch(temp_dir.path())
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Storage cleared (3 edits removed)"));

    pagepatch(temp_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No stored edits."));
}

#[test]
fn test_prefs_round_trip() {
    let temp_dir = tempfile::tempdir().unwrap();

    pagepatch(temp_dir.path())
        .arg("prefs")
        .assert()
        .success()
        .stdout(predicate::str::contains("show-edits = on"))
        .stdout(predicate::str::contains("settle-delay-ms = 800"));

    pagepatch(temp_dir.path())
        .args(["prefs", "show-edits", "off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show-edits set to false"));

    pagepatch(temp_dir.path())
        .args(["prefs", "show-edits"])
        .assert()
        .success()
        .stdout(predicate::str::contains("show-edits = false"));

    pagepatch(temp_dir.path())
        .args(["prefs", "text-editing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("text-editing = true"));
}

#[test]
fn test_prefs_rejects_bad_toggle() {
    let temp_dir = tempfile::tempdir().unwrap();
    pagepatch(temp_dir.path())
        .args(["prefs", "show-edits", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: "));
}

#[test]
fn test_config_file_is_honoured() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("config.json"),
        r#"{"settle_delay_ms": 1500}"#,
    )
    .unwrap();

    pagepatch(temp_dir.path())
        .arg("prefs")
        .assert()
        .success()
        .stdout(predicate::str::contains("settle-delay-ms = 1500"));
}

#[test]
fn test_malformed_config_file_fails_loudly() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(
        temp_dir.path().join("config.json"),
        r#"{"settle_delay_ms": "soon"#,
    )
    .unwrap();

    pagepatch(temp_dir.path())
        .arg("prefs")
        .assert()
        .failure()
        .stdout(predicate::str::contains("settle-delay-ms").not())
        .stderr(predicate::str::contains("Error: Serialization error"));
}

#[test]
fn test_replay_writes_patched_snapshot() {
    let temp_dir = tempfile::tempdir().unwrap();
    seed(temp_dir.path());
    let snapshot = temp_dir.path().join("page.json");
    let output = temp_dir.path().join("patched.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    pagepatch(temp_dir.path())
        .arg("replay")
        .arg(&snapshot)
        .args(["--page", "https://shop.test/pricing", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Applied 2 edit(s) and 0 overlay(s) to https://shop.test/pricing",
        ));

    let patched = fs::read_to_string(&output).unwrap();
    assert!(patched.contains("Plans"));
    assert!(patched.contains("Pro $15"));
    assert!(!patched.contains("Elsewhere"));
}

#[test]
fn test_replay_to_stdout_keeps_messages_off_stdout() {
    let temp_dir = tempfile::tempdir().unwrap();
    seed(temp_dir.path());
    let snapshot = temp_dir.path().join("page.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    pagepatch(temp_dir.path())
        .arg("replay")
        .arg(&snapshot)
        .args(["--page", "https://shop.test/pricing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Pro $15\""))
        .stdout(predicate::str::contains("Applied").not())
        .stderr(predicate::str::contains("Applied 2 edit(s)"));
}

#[test]
fn test_locate_reports_canonical_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let snapshot = temp_dir.path().join("page.json");
    fs::write(&snapshot, SNAPSHOT).unwrap();

    pagepatch(temp_dir.path())
        .arg("locate")
        .arg(&snapshot)
        .arg("body/ul[1]/li[2]")
        .assert()
        .success()
        .stdout(predicate::str::contains("id(\"plans\")/li[2]"))
        .stdout(predicate::str::contains("Pro $20"));

    pagepatch(temp_dir.path())
        .arg("locate")
        .arg(&snapshot)
        .arg("body/ol[1]")
        .assert()
        .success()
        .stdout(predicate::str::contains("No element at body/ol[1]"));
}

#[test]
fn test_missing_snapshot_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    pagepatch(temp_dir.path())
        .args(["locate", "does-not-exist.json", "body"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: IO error"));
}
