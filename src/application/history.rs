//! Local history of saved decisions.
//!
//! The whole list lives under one storage key as a JSON array, in insertion
//! order. Every mutation is written through immediately; a failed write
//! leaves the in-memory list as it was before the call.

use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::errors::GenieError;
use crate::domain::decision::{AnswerMap, DecisionData, Question, SavedDecision};
use crate::domain::foundation::{SavedDecisionId, Timestamp};
use crate::ports::{LocalStorage, DECISION_HISTORY_KEY};

const LOAD_FAILED: &str = "기록을 불러오는 중 오류가 발생했습니다. 기록이 손상되었을 수 있습니다.";
const SAVE_FAILED: &str = "결정 내용을 저장하는 중 오류가 발생했습니다.";
const DELETE_FAILED: &str = "결정 기록 삭제 중 오류가 발생했습니다.";
const NOTHING_TO_EXPORT: &str = "내보낼 결정 기록이 없습니다.";
const EXPORT_FAILED: &str = "기록 내보내기 중 오류가 발생했습니다.";
const NOT_A_JSON_FILE: &str = "JSON 파일만 가져올 수 있습니다. (.json)";
const READ_FAILED: &str = "파일을 읽는 중 오류가 발생했습니다.";
const EMPTY_FILE: &str = "파일 내용을 읽을 수 없습니다.";
const ROOT_NOT_ARRAY: &str = "가져온 파일의 형식이 올바르지 않습니다. 최상위는 배열이어야 합니다.";
const NO_VALID_RECORDS: &str =
    "가져온 파일에서 유효한 결정 기록을 찾을 수 없습니다. 파일 내용을 확인해주세요.";

/// Outcome of an import that did not fail outright.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records appended to the history.
    pub imported: usize,
    /// Elements that failed structural validation.
    pub skipped_invalid: usize,
    /// Valid records whose id already existed.
    pub skipped_duplicate: usize,
    /// Elements in the imported array.
    pub total: usize,
}

impl ImportReport {
    /// Main message for this import.
    pub fn summary(&self) -> String {
        if self.total == 0 {
            return "가져온 파일에 결정 기록이 없습니다.".to_string();
        }
        if self.imported == 0 {
            return "가져온 모든 기록이 이미 존재합니다.".to_string();
        }
        let mut message = format!(
            "{}개의 새로운 결정 기록을 성공적으로 가져왔습니다.",
            self.imported
        );
        if self.skipped_duplicate > 0 {
            message.push_str(&format!(" (중복된 {}개 항목 제외)", self.skipped_duplicate));
        }
        message
    }

    /// Warning about invalid elements, if any were skipped.
    pub fn invalid_notice(&self) -> Option<String> {
        (self.skipped_invalid > 0).then(|| {
            format!(
                "총 {}개 중 {}개의 항목이 유효하지 않아 가져오지 못했습니다. 파일 구조를 확인해주세요.",
                self.total, self.skipped_invalid
            )
        })
    }
}

/// A serialized history ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryExport {
    pub file_name: String,
    pub contents: String,
}

impl HistoryExport {
    /// Writes the export into `dir` and returns the file path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, GenieError> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.contents).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to write history export");
            GenieError::storage(EXPORT_FAILED)
        })?;
        tracing::info!(path = %path.display(), "history exported");
        Ok(path)
    }
}

/// Insertion-ordered list of saved decisions backed by [`LocalStorage`].
pub struct HistoryStore {
    storage: Arc<dyn LocalStorage>,
    records: Vec<SavedDecision>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("records", &self.records.len())
            .finish()
    }
}

impl HistoryStore {
    /// Creates an empty store; call [`HistoryStore::load`] to read persisted records.
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            records: Vec::new(),
        }
    }

    /// Reads the persisted history.
    ///
    /// Unreadable or corrupt data leaves the store empty and returns an
    /// error; the stored value is not touched until the next write.
    pub fn load(&mut self) -> Result<(), GenieError> {
        self.records.clear();
        let stored = match self.storage.get_item(DECISION_HISTORY_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!(error = %e, "failed to read decision history");
                return Err(GenieError::storage(LOAD_FAILED));
            }
        };
        let Some(raw) = stored.filter(|raw| !raw.trim().is_empty()) else {
            return Ok(());
        };
        match serde_json::from_str::<Vec<SavedDecision>>(&raw) {
            Ok(records) => {
                tracing::debug!(count = records.len(), "decision history loaded");
                self.records = records;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "stored decision history is corrupt");
                Err(GenieError::storage(LOAD_FAILED))
            }
        }
    }

    /// True when a history value exists in storage, even an empty one.
    pub fn has_stored_history(&self) -> bool {
        !self.records.is_empty()
            || matches!(self.storage.get_item(DECISION_HISTORY_KEY), Ok(Some(_)))
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[SavedDecision] {
        &self.records
    }

    /// Records ordered by save time, newest first.
    pub fn newest_first(&self) -> Vec<&SavedDecision> {
        let mut sorted: Vec<&SavedDecision> = self.records.iter().collect();
        sorted.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        sorted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&SavedDecision> {
        self.records.iter().find(|r| r.id.as_str() == id)
    }

    /// Time-derived id for a record saved at `at`, unique in this store.
    pub fn next_id(&self, at: &Timestamp) -> SavedDecisionId {
        SavedDecisionId::unique_from_timestamp(at, |candidate| {
            self.records.iter().any(|r| &r.id == candidate)
        })
    }

    /// Builds a record for a finished session and saves it.
    pub fn record_decision(
        &mut self,
        problem: &str,
        questions: &[Question],
        answers: &AnswerMap,
        decision: &DecisionData,
        at: Timestamp,
    ) -> Result<SavedDecision, GenieError> {
        let record = SavedDecision {
            id: self.next_id(&at),
            saved_at: at,
            problem_description: problem.to_string(),
            questions: questions.to_vec(),
            answers: answers.clone(),
            decision_data: decision.clone(),
        };
        self.save(record.clone())?;
        Ok(record)
    }

    /// Appends a record and persists the list.
    pub fn save(&mut self, record: SavedDecision) -> Result<(), GenieError> {
        let id = record.id.clone();
        self.records.push(record);
        if let Err(e) = self.persist() {
            self.records.pop();
            tracing::error!(error = %e, id = %id, "failed to save decision");
            return Err(GenieError::storage(SAVE_FAILED));
        }
        tracing::info!(id = %id, "decision saved to history");
        Ok(())
    }

    /// Removes the record with `id`. Returns whether one was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, GenieError> {
        let before = self.records.clone();
        self.records.retain(|r| r.id.as_str() != id);
        if self.records.len() == before.len() {
            return Ok(false);
        }
        if let Err(e) = self.persist() {
            self.records = before;
            tracing::error!(error = %e, id = %id, "failed to delete decision");
            return Err(GenieError::storage(DELETE_FAILED));
        }
        tracing::info!(id = %id, "decision deleted from history");
        Ok(true)
    }

    /// Serializes the whole history, pretty-printed, named after `today`.
    pub fn export_all(&self, today: &Timestamp) -> Result<HistoryExport, GenieError> {
        if self.records.is_empty() {
            return Err(GenieError::invalid_input(NOTHING_TO_EXPORT));
        }
        let contents = serde_json::to_string_pretty(&self.records).map_err(|e| {
            tracing::error!(error = %e, "failed to serialize history export");
            GenieError::storage(EXPORT_FAILED)
        })?;
        Ok(HistoryExport {
            file_name: format!("decision_genie_history_{}.json", today.date_string()),
            contents,
        })
    }

    /// Imports records from a `.json` file on disk.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<ImportReport, GenieError> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if !is_json {
            return Err(GenieError::import_validation(NOT_A_JSON_FILE));
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            tracing::error!(error = %e, path = %path.display(), "failed to read import file");
            GenieError::import_validation(READ_FAILED)
        })?;
        self.import_json(&contents)
    }

    /// Imports records from the text of an exported history file.
    ///
    /// Valid records whose id is already present (in the history or earlier
    /// in the same file) are skipped. The history is unchanged on error.
    pub fn import_json(&mut self, contents: &str) -> Result<ImportReport, GenieError> {
        if contents.trim().is_empty() {
            return Err(import_failure(EMPTY_FILE));
        }
        let parsed: Value = serde_json::from_str(contents).map_err(|e| {
            tracing::warn!(error = %e, "import file is not valid JSON");
            import_failure(&e.to_string())
        })?;
        let Value::Array(items) = parsed else {
            return Err(import_failure(ROOT_NOT_ARRAY));
        };

        let mut report = ImportReport {
            total: items.len(),
            ..ImportReport::default()
        };
        let mut valid = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            match SavedDecision::from_value(item) {
                Ok(record) => valid.push(record),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping invalid history record");
                    report.skipped_invalid += 1;
                }
            }
        }

        if valid.is_empty() {
            if report.total > 0 {
                return Err(import_failure(NO_VALID_RECORDS));
            }
            return Ok(report);
        }

        let mut known: HashSet<SavedDecisionId> =
            self.records.iter().map(|r| r.id.clone()).collect();
        let fresh: Vec<SavedDecision> = valid
            .into_iter()
            .filter(|record| {
                let is_new = known.insert(record.id.clone());
                if !is_new {
                    report.skipped_duplicate += 1;
                }
                is_new
            })
            .collect();
        report.imported = fresh.len();

        if fresh.is_empty() {
            return Ok(report);
        }

        let before = self.records.len();
        self.records.extend(fresh);
        if let Err(e) = self.persist() {
            self.records.truncate(before);
            tracing::error!(error = %e, "failed to persist imported history");
            return Err(GenieError::storage(format!(
                "기록 가져오기 중 오류 발생: {SAVE_FAILED}"
            )));
        }

        tracing::info!(
            imported = report.imported,
            skipped_invalid = report.skipped_invalid,
            skipped_duplicate = report.skipped_duplicate,
            "history imported"
        );
        Ok(report)
    }

    fn persist(&self) -> Result<(), GenieError> {
        let serialized = serde_json::to_string(&self.records)
            .map_err(|e| GenieError::storage(e.to_string()))?;
        self.storage.set_item(DECISION_HISTORY_KEY, &serialized)?;
        Ok(())
    }
}

fn import_failure(reason: &str) -> GenieError {
    GenieError::import_validation(format!("기록 가져오기 중 오류 발생: {reason}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryLocalStorage;
    use crate::application::errors::ErrorKind;
    use serde_json::json;

    fn decision() -> DecisionData {
        DecisionData {
            decision: "산책을 다녀오세요".into(),
            reasoning: "가벼운 야외 활동이 기분 전환에 가장 좋기 때문입니다.".into(),
            decision_strength: "좋은 선택이에요!".into(),
            additional_info: None,
            pros: Some(vec!["상쾌함".into()]),
            cons: None,
        }
    }

    fn questions() -> Vec<Question> {
        vec![Question::new("q1", "기분은?", vec!["좋음".into(), "나쁨".into()]).unwrap()]
    }

    fn answers() -> AnswerMap {
        let mut answers = AnswerMap::new();
        answers.record("q1", "좋음");
        answers
    }

    fn at(millis: i64) -> Timestamp {
        Timestamp::from_unix_millis(millis).unwrap()
    }

    fn record_json(id: &str) -> Value {
        json!({
            "id": id,
            "savedAt": "2024-05-01T10:00:00.000Z",
            "problemDescription": "주말 계획",
            "questions": [{"id": "q1", "text": "누구와?", "options": ["혼자", "친구"]}],
            "answers": {"q1": "혼자"},
            "decisionData": {
                "decision": "등산",
                "reasoning": "혼자만의 시간이 필요하다고 하셨습니다.",
                "decisionStrength": "확신해요"
            }
        })
    }

    fn store() -> (HistoryStore, InMemoryLocalStorage) {
        let storage = InMemoryLocalStorage::new();
        (HistoryStore::new(Arc::new(storage.clone())), storage)
    }

    #[test]
    fn records_decision_and_persists() {
        let (mut history, storage) = store();

        let saved = history
            .record_decision("기분 전환", &questions(), &answers(), &decision(), at(1_700_000_000_000))
            .unwrap();

        assert_eq!(saved.id.as_str(), "1700000000000");
        assert_eq!(history.len(), 1);
        assert!(storage.peek(DECISION_HISTORY_KEY).unwrap().contains("기분 전환"));

        let mut reloaded = HistoryStore::new(Arc::new(storage));
        reloaded.load().unwrap();
        assert_eq!(reloaded.records(), history.records());
    }

    #[test]
    fn ids_in_the_same_millisecond_are_bumped() {
        let (mut history, _) = store();
        let first = history
            .record_decision("a", &questions(), &answers(), &decision(), at(5))
            .unwrap();
        let second = history
            .record_decision("b", &questions(), &answers(), &decision(), at(5))
            .unwrap();

        assert_eq!(first.id.as_str(), "5");
        assert_eq!(second.id.as_str(), "6");
    }

    #[test]
    fn failed_save_rolls_back() {
        let (mut history, storage) = store();
        storage.set_fail_writes(true);

        let err = history
            .record_decision("a", &questions(), &answers(), &decision(), at(1))
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::StorageError);
        assert_eq!(err.user_message(), SAVE_FAILED);
        assert!(history.is_empty());
    }

    #[test]
    fn delete_removes_and_reports() {
        let (mut history, storage) = store();
        history
            .record_decision("a", &questions(), &answers(), &decision(), at(1))
            .unwrap();

        assert!(!history.delete("missing").unwrap());
        storage.set_fail_writes(true);
        assert!(history.delete("1").is_err());
        assert_eq!(history.len(), 1);

        storage.set_fail_writes(false);
        assert!(history.delete("1").unwrap());
        assert!(history.is_empty());
        assert_eq!(storage.peek(DECISION_HISTORY_KEY).as_deref(), Some("[]"));
    }

    #[test]
    fn corrupt_history_loads_empty_without_overwriting() {
        let storage = InMemoryLocalStorage::new().with_item(DECISION_HISTORY_KEY, "[{broken");
        let mut history = HistoryStore::new(Arc::new(storage.clone()));

        let err = history.load().unwrap_err();

        assert_eq!(err.user_message(), LOAD_FAILED);
        assert!(history.is_empty());
        assert_eq!(storage.peek(DECISION_HISTORY_KEY).as_deref(), Some("[{broken"));
        assert!(history.has_stored_history());
    }

    #[test]
    fn newest_first_orders_by_saved_at() {
        let (mut history, _) = store();
        for (problem, millis) in [("old", 1_000), ("new", 3_000), ("mid", 2_000)] {
            history
                .record_decision(problem, &questions(), &answers(), &decision(), at(millis))
                .unwrap();
        }
        let order: Vec<_> = history
            .newest_first()
            .iter()
            .map(|r| r.problem_description.as_str())
            .collect();
        assert_eq!(order, vec!["new", "mid", "old"]);
    }

    #[test]
    fn export_requires_records_and_names_file_by_date() {
        let (mut history, _) = store();
        let today = Timestamp::parse("2024-06-30T23:00:00Z").unwrap();

        let err = history.export_all(&today).unwrap_err();
        assert_eq!(err.user_message(), NOTHING_TO_EXPORT);

        history
            .record_decision("a", &questions(), &answers(), &decision(), at(1))
            .unwrap();
        let export = history.export_all(&today).unwrap();
        assert_eq!(export.file_name, "decision_genie_history_2024-06-30.json");
        assert!(export.contents.starts_with("[\n"));
    }

    #[test]
    fn import_appends_valid_and_counts_skips() {
        let (mut history, _) = store();
        history.import_json(&json!([record_json("1")]).to_string()).unwrap();

        let file = json!([record_json("1"), record_json("2"), {"id": 3}, record_json("2")]);
        let report = history.import_json(&file.to_string()).unwrap();

        assert_eq!(
            report,
            ImportReport {
                imported: 1,
                skipped_invalid: 1,
                skipped_duplicate: 2,
                total: 4
            }
        );
        assert_eq!(history.len(), 2);
        assert_eq!(
            report.summary(),
            "1개의 새로운 결정 기록을 성공적으로 가져왔습니다. (중복된 2개 항목 제외)"
        );
        assert_eq!(
            report.invalid_notice().unwrap(),
            "총 4개 중 1개의 항목이 유효하지 않아 가져오지 못했습니다. 파일 구조를 확인해주세요."
        );
    }

    #[test]
    fn import_rejects_non_array_root() {
        let (mut history, _) = store();
        let err = history.import_json(r#"{"foo":1}"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImportValidationError);
        assert!(err.user_message().ends_with(ROOT_NOT_ARRAY));
        assert!(history.is_empty());
    }

    #[test]
    fn import_rejects_files_without_valid_records() {
        let (mut history, _) = store();
        let err = history.import_json(r#"[{"id": 1}, 2]"#).unwrap_err();
        assert!(err.user_message().ends_with(NO_VALID_RECORDS));

        let err = history.import_json("not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ImportValidationError);
    }

    #[test]
    fn empty_array_imports_nothing() {
        let (mut history, _) = store();
        let report = history.import_json("[]").unwrap();
        assert_eq!(report.imported, 0);
        assert_eq!(report.summary(), "가져온 파일에 결정 기록이 없습니다.");
    }

    #[test]
    fn reimporting_an_export_adds_nothing() {
        let (mut history, _) = store();
        history
            .record_decision("a", &questions(), &answers(), &decision(), at(1))
            .unwrap();
        let export = history.export_all(&at(1)).unwrap();

        let report = history.import_json(&export.contents).unwrap();

        assert_eq!(report.imported, 0);
        assert_eq!(report.skipped_duplicate, 1);
        assert_eq!(report.summary(), "가져온 모든 기록이 이미 존재합니다.");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn import_file_checks_extension_and_reads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let (mut history, _) = store();

        let txt = dir.path().join("history.txt");
        std::fs::write(&txt, "[]").unwrap();
        let err = history.import_file(&txt).unwrap_err();
        assert_eq!(err.user_message(), NOT_A_JSON_FILE);

        let missing = dir.path().join("missing.json");
        assert_eq!(history.import_file(&missing).unwrap_err().user_message(), READ_FAILED);

        let good = dir.path().join("history.JSON");
        std::fs::write(&good, json!([record_json("9")]).to_string()).unwrap();
        assert_eq!(history.import_file(&good).unwrap().imported, 1);
    }

    #[test]
    fn export_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (mut history, _) = store();
        history
            .record_decision("a", &questions(), &answers(), &decision(), at(1))
            .unwrap();

        let path = history.export_all(&at(1)).unwrap().write_to(dir.path()).unwrap();

        assert!(path.ends_with("decision_genie_history_1970-01-01.json"));
        let written = std::fs::read_to_string(path).unwrap();
        assert!(written.contains("\"problemDescription\": \"a\""));
    }
}
