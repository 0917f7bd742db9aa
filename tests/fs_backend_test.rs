use pagepatch::config::{PreferenceUpdate, Preferences};
use pagepatch::error::PatchError;
use pagepatch::model::{EditKind, PatchRecord};
use pagepatch::store::{FsBackend, PatchStore, StorageBackend};
use std::fs;
use tempfile::TempDir;

const PAGE: &str = "https://shop.test/pricing";

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().join("data"));
    (dir, backend)
}

fn text_record(path: &str, value: &str, original: &str) -> PatchRecord {
    PatchRecord::text(PAGE.into(), path.parse().unwrap(), value, original)
}

#[test]
fn test_missing_files_read_as_empty() {
    let (_dir, backend) = setup();
    assert!(backend.load_patches().unwrap().is_empty());
    assert_eq!(backend.load_preferences().unwrap(), None);
}

#[test]
fn test_atomic_write_artifacts() {
    let (_dir, backend) = setup();
    backend
        .save_patches(&[text_record("body/h1[1]", "Plans", "Pricing")])
        .unwrap();

    let on_disk = fs::read_to_string(backend.patches_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["records"][0]["xpath"], "body/h1[1]");
    assert_eq!(value["records"][0]["newContent"], "Plans");

    for entry in fs::read_dir(backend.root()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_records_survive_a_new_store() {
    let (dir, backend) = setup();
    let store = PatchStore::with_backend(backend);
    store
        .upsert(text_record("body/h1[1]", "Plans", "Pricing"))
        .unwrap();
    store
        .upsert(text_record("body/h1[1]", "Our plans", "Plans"))
        .unwrap();

    let reopened = PatchStore::with_backend(FsBackend::new(dir.path().join("data")));
    let records = reopened.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].new_value, "Our plans");
    assert_eq!(records[0].original_value.as_deref(), Some("Pricing"));
}

#[test]
fn test_legacy_array_is_migrated_on_next_write() {
    let (_dir, backend) = setup();
    fs::create_dir_all(backend.root()).unwrap();
    fs::write(
        backend.patches_path(),
        r#"[
            {"url": "https://shop.test/pricing", "xpath": "body/h1[1]", "type": "text",
             "newContent": "Plans", "originalContent": "Pricing"},
            {"url": "https://shop.test/pricing", "xpath": "body/h1[1]", "type": "text",
             "newContent": "Later", "originalContent": "Plans"},
            {"url": "https://shop.test/pricing", "type": "overlay",
             "rect": "{\"x\":1,\"y\":2,\"width\":3,\"height\":4}"}
        ]"#,
    )
    .unwrap();

    let store = PatchStore::with_backend(backend);
    let records = store.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].new_value, "Plans");
    assert_eq!(records[1].kind, EditKind::Overlay);

    store
        .upsert(text_record("body/p[1]", "Hi", "Hello"))
        .unwrap();
    let on_disk = fs::read_to_string(store.backend().patches_path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["records"].as_array().unwrap().len(), 3);
}

#[test]
fn test_newer_schema_is_refused() {
    let (_dir, backend) = setup();
    fs::create_dir_all(backend.root()).unwrap();
    fs::write(backend.patches_path(), r#"{"version": 7, "records": []}"#).unwrap();

    match backend.load_patches() {
        Err(PatchError::UnsupportedSchema { found, supported }) => {
            assert_eq!(found, 7);
            assert_eq!(supported, 1);
        }
        other => panic!("expected UnsupportedSchema, got {:?}", other),
    }
}

#[test]
fn test_corrupt_record_is_dropped_not_fatal() {
    let (_dir, backend) = setup();
    fs::create_dir_all(backend.root()).unwrap();
    fs::write(
        backend.patches_path(),
        r#"{"version": 1, "records": [
            {"url": "https://shop.test/pricing", "type": "text", "newContent": "no locator"},
            {"url": "https://shop.test/pricing", "xpath": "body/p[1]", "type": "text",
             "newContent": "kept", "originalContent": "old"}
        ]}"#,
    )
    .unwrap();

    let records = backend.load_patches().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].new_value, "kept");
}

#[test]
fn test_preferences_round_trip_on_disk() {
    let (dir, backend) = setup();
    let store = PatchStore::with_backend(backend);
    assert_eq!(store.preferences().unwrap(), Preferences::default());

    store
        .update_preferences(&PreferenceUpdate {
            image_editing_enabled: Some(false),
            ..PreferenceUpdate::default()
        })
        .unwrap();

    let reopened = FsBackend::new(dir.path().join("data"));
    let raw = fs::read_to_string(reopened.preferences_path()).unwrap();
    assert!(raw.contains("\"imageEditingEnabled\": false"));
    let prefs = reopened.load_preferences().unwrap().unwrap();
    assert!(!prefs.image_editing_enabled);
    assert!(prefs.text_editing_enabled);
}

#[test]
fn test_clear_empties_file_for_every_page() {
    let (_dir, backend) = setup();
    let store = PatchStore::with_backend(backend);
    store
        .upsert(text_record("body/h1[1]", "Plans", "Pricing"))
        .unwrap();
    store
        .upsert(PatchRecord::overlay("https://other.test/".into(), "{}"))
        .unwrap();

    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.backend().load_patches().unwrap().is_empty());
}
