//! Integration tests for history export and import.
//!
//! Covers the file-level rules (extension, root shape), the export/import
//! round trip through a real directory, and the size property of imports.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use decision_genie::adapters::storage::{FileLocalStorage, InMemoryLocalStorage};
use decision_genie::application::{ErrorKind, HistoryStore};
use decision_genie::domain::foundation::Timestamp;
use decision_genie::ports::{LocalStorage, DECISION_HISTORY_KEY};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn record(id: &str) -> Value {
    json!({
        "id": id,
        "savedAt": "2024-05-01T12:00:00Z",
        "problemDescription": format!("고민 {id}"),
        "questions": [
            {"id": "q1", "text": "배고프세요?", "options": ["네", "아니요"]}
        ],
        "answers": {"q1": "네"},
        "decisionData": {
            "decision": "김치찌개를 드세요",
            "reasoning": "따뜻하고 든든한 음식이 필요해 보여요.",
            "decisionStrength": "매우 확신해요!",
            "pros": ["든든해요"],
            "cons": ["매워요"]
        }
    })
}

fn broken_record(id: &str) -> Value {
    json!({
        "id": id,
        "savedAt": "2024-05-01T12:00:00Z",
        "problemDescription": "decisionData 없음",
        "questions": [],
        "answers": {}
    })
}

fn store() -> (HistoryStore, Arc<InMemoryLocalStorage>) {
    let storage = Arc::new(InMemoryLocalStorage::new());
    (HistoryStore::new(storage.clone()), storage)
}

fn seeded_store(ids: &[&str]) -> HistoryStore {
    let (mut store, _) = store();
    let seed = Value::Array(ids.iter().map(|id| record(id)).collect());
    store.import_json(&seed.to_string()).unwrap();
    store
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn object_root_is_rejected_and_history_unchanged() {
    let (mut store, storage) = store();
    store.import_json(&json!([record("1")]).to_string()).unwrap();
    let persisted = storage.peek(DECISION_HISTORY_KEY);

    let err = store.import_json(r#"{"foo":1}"#).unwrap_err();

    assert_eq!(err.kind, ErrorKind::ImportValidationError);
    assert_eq!(store.len(), 1);
    assert_eq!(storage.peek(DECISION_HISTORY_KEY), persisted);
}

#[test]
fn file_of_only_invalid_records_is_rejected() {
    let mut store = seeded_store(&["1"]);

    let err = store
        .import_json(&json!([broken_record("2"), 42]).to_string())
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ImportValidationError);
    assert!(err.user_message().starts_with("기록 가져오기 중 오류 발생: "));
    assert_eq!(store.len(), 1);
}

#[test]
fn non_json_extension_is_rejected_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.txt");
    std::fs::write(&path, json!([record("1")]).to_string()).unwrap();
    let (mut store, _) = store();

    let err = store.import_file(&path).unwrap_err();

    assert_eq!(err.kind, ErrorKind::ImportValidationError);
    assert!(store.is_empty());
}

#[test]
fn empty_array_is_a_no_op_with_a_notice() {
    let mut store = seeded_store(&["1"]);

    let report = store.import_json("[]").unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.total, 0);
    assert_eq!(report.summary(), "가져온 파일에 결정 기록이 없습니다.");
    assert_eq!(store.len(), 1);
}

// =============================================================================
// Mixed Imports
// =============================================================================

#[test]
fn mixed_file_imports_valid_new_records_only() {
    let mut store = seeded_store(&["1"]);
    let file = json!([record("1"), record("2"), broken_record("3"), record("2"), record("4")]);

    let report = store.import_json(&file.to_string()).unwrap();

    assert_eq!(report.total, 5);
    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.skipped_duplicate, 2);
    assert_eq!(store.len(), 3);
    assert!(report.summary().ends_with("(중복된 2개 항목 제외)"));
    assert!(report.invalid_notice().is_some());
}

// =============================================================================
// Round Trip
// =============================================================================

#[test]
fn exported_file_reimports_as_all_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let storage: Arc<dyn LocalStorage> =
        Arc::new(FileLocalStorage::in_dir(dir.path().join("data")));
    let mut store = HistoryStore::new(storage.clone());
    store
        .import_json(&json!([record("1"), record("2")]).to_string())
        .unwrap();

    let export = store.export_all(&Timestamp::now()).unwrap();
    assert!(export.file_name.starts_with("decision_genie_history_"));
    assert!(export.file_name.ends_with(".json"));
    let path = export.write_to(dir.path()).unwrap();

    let report = store.import_file(&path).unwrap();

    assert_eq!(report.imported, 0);
    assert_eq!(report.skipped_duplicate, 2);
    assert_eq!(report.summary(), "가져온 모든 기록이 이미 존재합니다.");
    assert_eq!(store.len(), 2);

    let mut reloaded = HistoryStore::new(storage);
    reloaded.load().unwrap();
    assert_eq!(reloaded.records(), store.records());
}

#[test]
fn exporting_nothing_is_an_error() {
    let (store, _) = store();

    let err = store.export_all(&Timestamp::now()).unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn import_grows_history_by_valid_unique_records(
        existing in prop::collection::hash_set(0u8..10, 0..5),
        incoming in prop::collection::vec((0u8..10, any::<bool>()), 0..12),
    ) {
        let existing_ids: Vec<String> = existing.iter().map(|n| n.to_string()).collect();
        let seed: Vec<&str> = existing_ids.iter().map(String::as_str).collect();
        let mut store = if seed.is_empty() { store().0 } else { seeded_store(&seed) };
        let before = store.len();

        let file: Vec<Value> = incoming
            .iter()
            .map(|(n, valid)| {
                let id = n.to_string();
                if *valid { record(&id) } else { broken_record(&id) }
            })
            .collect();

        let mut seen: HashSet<String> = existing_ids.iter().cloned().collect();
        let expected_new = incoming
            .iter()
            .filter(|(_, valid)| *valid)
            .filter(|(n, _)| seen.insert(n.to_string()))
            .count();

        let result = store.import_json(&Value::Array(file).to_string());

        prop_assert_eq!(store.len(), before + expected_new);
        if let Ok(report) = result {
            prop_assert_eq!(report.imported, expected_new);
            prop_assert_eq!(report.total, incoming.len());
        }
    }
}
