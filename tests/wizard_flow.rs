//! Integration tests for the decision wizard.
//!
//! These tests drive the public API end to end:
//! 1. Problem entry and question generation
//! 2. Answering, dynamic questions and the decision
//! 3. Regeneration and follow-up caps
//! 4. API key failures surfacing through the wizard
//! 5. History browsing, import and save failures
//!
//! Uses the mock provider and in-memory storage, so no network is touched.

use std::sync::Arc;

use decision_genie::adapters::ai::{MockAIProvider, MockConnector, MockError};
use decision_genie::adapters::storage::InMemoryLocalStorage;
use decision_genie::adapters::terminal::{Command, TerminalSession};
use decision_genie::application::{
    DecisionAiClient, DecisionWizard, ErrorKind, ErrorStage, HistoryStore, KeySource,
};
use decision_genie::domain::wizard::{SessionLimits, StepKind, WizardStep};
use decision_genie::ports::{DECISION_HISTORY_KEY, USER_API_KEY_STORAGE_KEY};

// =============================================================================
// Test Infrastructure
// =============================================================================

const SUGGESTIONS: &str = r#"["오늘 저녁 뭐 먹을까요?", "주말에 뭐 할까요?"]"#;

const DINNER_QUESTIONS: &str = r#"```json
[
  {"id": "q1", "text": "지금 얼마나 배고프세요?", "options": ["조금", "보통", "많이"]},
  {"id": "q2", "text": "매운 음식은 어떠세요?", "options": ["좋아요", "괜찮아요", "싫어요"]},
  {"id": "q3", "text": "요리할 시간이 있나요?", "options": ["있어요", "없어요"]},
  {"id": "q4", "text": "혼자 드시나요?", "options": ["혼자", "가족과", "친구와"]}
]
```"#;

const DECISION: &str = r#"{
  "decision": "따끈한 김치찌개를 끓여 드세요",
  "reasoning": "많이 배고프고 매운 음식을 좋아하시니, 금방 만들 수 있는 든든한 찌개가 지금 가장 잘 맞아요.",
  "decisionStrength": "매우 확신해요!",
  "links": [{"title": "김치찌개 레시피", "uri": "https://example.com/kimchi"}],
  "pros": ["든든해요", "재료가 간단해요"],
  "cons": ["설거지가 생겨요"]
}"#;

const OTHER_DECISION: &str = r#"{
  "decision": "근처 분식집에서 떡볶이를 드세요",
  "reasoning": "요리할 시간이 부족하다면 매콤한 분식으로 빠르게 배를 채우는 것도 좋은 선택이에요.",
  "decisionStrength": "한번 시도해볼 만해요!",
  "links": [],
  "pros": ["빨라요"],
  "cons": ["조금 짤 수 있어요"]
}"#;

const SAVED_RECORD: &str = r#"[{"id": "7", "savedAt": "2024-05-01T12:00:00Z", "problemDescription": "이사를 갈까요?", "questions": [{"id": "q1", "text": "출퇴근이 힘드세요?", "options": ["네", "아니요"]}], "answers": {"q1": "네"}, "decisionData": {"decision": "회사 근처로 이사하세요", "reasoning": "매일 왕복 세 시간은 생활 전체를 지치게 만들어요.", "decisionStrength": "매우 확신해요!", "pros": ["시간 절약"], "cons": ["이사 비용"]}}]"#;

struct Harness {
    wizard: Arc<DecisionWizard>,
    provider: MockAIProvider,
    storage: Arc<InMemoryLocalStorage>,
}

fn harness_with(
    provider: MockAIProvider,
    storage: InMemoryLocalStorage,
    env_key: Option<&str>,
    limits: SessionLimits,
) -> Harness {
    let storage = Arc::new(storage);
    let connector = MockConnector::new(provider.clone());
    let client = DecisionAiClient::new(
        Arc::new(connector),
        storage.clone(),
        env_key.map(str::to_string),
    );
    let wizard = DecisionWizard::new(Arc::new(client), HistoryStore::new(storage.clone()), limits);
    Harness {
        wizard: Arc::new(wizard),
        provider,
        storage,
    }
}

fn harness(provider: MockAIProvider) -> Harness {
    harness_with(
        provider,
        InMemoryLocalStorage::new(),
        Some("env-key"),
        SessionLimits::default(),
    )
}

/// Walks from the welcome screen to the questionnaire for the dinner problem.
async fn reach_questions(h: &Harness) {
    h.wizard.start().await.unwrap();
    h.wizard.choose_manual_input().unwrap();
    h.wizard.submit_problem("오늘 저녁 뭐 먹을까요?").await.unwrap();
    assert_eq!(h.wizard.step_kind(), StepKind::AnsweringQuestions);
}

fn answer_all(h: &Harness) {
    let WizardStep::AnsweringQuestions(session) = h.wizard.snapshot().step else {
        panic!("not answering questions");
    };
    for question in &session.questions {
        h.wizard
            .record_answer(&question.id, &question.options[0])
            .unwrap();
    }
}

// =============================================================================
// Happy Path
// =============================================================================

#[tokio::test]
async fn dinner_problem_reaches_a_decision_with_one_decision_call() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION),
    );
    reach_questions(&h).await;

    let WizardStep::AnsweringQuestions(session) = h.wizard.snapshot().step else {
        panic!("not answering questions");
    };
    let ids: Vec<_> = session.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q1", "q2", "q3", "q4"]);

    answer_all(&h);
    h.wizard.submit_answers().await.unwrap();

    // suggestions + questions + decision
    assert_eq!(h.provider.call_count(), 3);
    let decision_call = h.provider.last_call().unwrap();
    assert!(decision_call.search_grounding);

    let WizardStep::ShowingDecision { outcome, .. } = h.wizard.snapshot().step else {
        panic!("no decision shown");
    };
    assert!(outcome.decision.decision.chars().count() >= 5);
    assert!(outcome.decision.reasoning.chars().count() >= 20);
    assert_eq!(outcome.decision.links().len(), 1);
    assert_eq!(outcome.regenerations, 0);
}

#[tokio::test]
async fn unanswered_questions_block_the_decision_without_calling_the_ai() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS),
    );
    reach_questions(&h).await;
    h.wizard.record_answer("q1", "조금").unwrap();

    let err = h.wizard.submit_answers().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_eq!(h.wizard.step_kind(), StepKind::AnsweringQuestions);
    assert_eq!(h.provider.call_count(), 2);
}

#[tokio::test]
async fn saved_decision_is_persisted_once() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION),
    );
    reach_questions(&h).await;
    answer_all(&h);
    h.wizard.submit_answers().await.unwrap();

    h.wizard.save_current_decision().unwrap();
    h.wizard.save_current_decision().unwrap();

    let snap = h.wizard.snapshot();
    assert_eq!(snap.history.len(), 1);
    assert_eq!(snap.history[0].problem_description, "오늘 저녁 뭐 먹을까요?");
    assert!(h.storage.peek(DECISION_HISTORY_KEY).is_some());
    assert!(snap.has_stored_history);
}

#[tokio::test]
async fn failed_save_stays_on_the_decision_and_can_be_retried() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION),
    );
    reach_questions(&h).await;
    answer_all(&h);
    h.wizard.submit_answers().await.unwrap();
    h.storage.set_fail_writes(true);

    let err = h.wizard.save_current_decision().unwrap_err();

    assert_eq!(err.kind, ErrorKind::StorageError);
    let snap = h.wizard.snapshot();
    let WizardStep::ShowingDecision { outcome, .. } = &snap.step else {
        panic!("left the decision screen");
    };
    assert!(!outcome.saved);
    assert_eq!(snap.error.as_ref().unwrap().stage, ErrorStage::Save);
    assert!(snap.history.is_empty());
    assert!(h.storage.peek(DECISION_HISTORY_KEY).is_none());

    h.storage.set_fail_writes(false);
    h.wizard.clear_error();
    assert_eq!(h.wizard.step_kind(), StepKind::ShowingDecision);
    h.wizard.save_current_decision().unwrap();
    assert_eq!(h.wizard.snapshot().history.len(), 1);
}

#[tokio::test]
async fn empty_question_list_returns_to_problem_entry_with_a_notice() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response("[]"),
    );
    h.wizard.start().await.unwrap();
    h.wizard.choose_manual_input().unwrap();

    let err = h.wizard.submit_problem("오늘 저녁 뭐 먹을까요?").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::EmptyResponse);
    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::AskingProblem);
    let error = snap.error.unwrap();
    assert_eq!(error.stage, ErrorStage::Questions);
    assert_eq!(
        error.error.user_message(),
        "질문을 생성하지 못했습니다. 다른 고민으로 다시 시도해주세요."
    );
}

#[tokio::test]
async fn empty_suggestion_list_goes_straight_to_problem_entry() {
    let h = harness(MockAIProvider::new().with_response("[]"));

    h.wizard.start().await.unwrap();

    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::AskingProblem);
    assert!(snap.suggestions.is_empty());
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn back_to_suggestions_reuses_the_cached_list() {
    let h = harness(MockAIProvider::new().with_response(SUGGESTIONS));
    h.wizard.start().await.unwrap();
    h.wizard.choose_manual_input().unwrap();

    h.wizard.back_to_suggestions().await.unwrap();

    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingSuggestions);
    assert_eq!(snap.suggestions.len(), 2);
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn back_to_suggestions_refetches_when_nothing_is_cached() {
    let h = harness(
        MockAIProvider::new()
            .with_response("[]")
            .with_response(SUGGESTIONS),
    );
    h.wizard.start().await.unwrap();
    assert_eq!(h.wizard.step_kind(), StepKind::AskingProblem);

    h.wizard.back_to_suggestions().await.unwrap();

    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingSuggestions);
    assert_eq!(snap.suggestions[0], "오늘 저녁 뭐 먹을까요?");
    assert_eq!(h.provider.call_count(), 2);
}

// =============================================================================
// Dynamic Questions
// =============================================================================

#[tokio::test]
async fn empty_object_marks_no_more_questions_without_error() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response("{}"),
    );
    reach_questions(&h).await;

    h.wizard.add_additional_question().await.unwrap();

    let snap = h.wizard.snapshot();
    let WizardStep::AnsweringQuestions(session) = &snap.step else {
        panic!("left the questionnaire");
    };
    assert!(session.no_more_questions);
    assert_eq!(session.questions.len(), 4);
    assert!(snap.error.is_none());
    assert!(!snap.can_add_question());
}

#[tokio::test]
async fn dynamic_question_cap_is_a_no_op_without_ai_calls() {
    let dynamic = |n: u32| {
        format!(r#"{{"id": "whatever", "text": "추가 질문 {n}?", "options": ["예", "아니요"]}}"#)
    };
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(dynamic(1))
            .with_response(dynamic(2)),
    );
    reach_questions(&h).await;

    h.wizard.add_additional_question().await.unwrap();
    h.wizard.add_additional_question().await.unwrap();
    let calls = h.provider.call_count();

    h.wizard.add_additional_question().await.unwrap();

    assert_eq!(h.provider.call_count(), calls);
    let WizardStep::AnsweringQuestions(session) = h.wizard.snapshot().step else {
        panic!("left the questionnaire");
    };
    assert_eq!(session.dynamic_added, 2);
    let ids: Vec<_> = session.questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, vec!["q1", "q2", "q3", "q4", "dyn_q_1", "dyn_q_2"]);
}

// =============================================================================
// Regeneration and Follow-ups
// =============================================================================

#[tokio::test]
async fn regeneration_stops_at_the_configured_maximum() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION)
            .with_response(OTHER_DECISION),
    );
    reach_questions(&h).await;
    answer_all(&h);
    h.wizard.submit_answers().await.unwrap();
    assert!(h.wizard.can_regenerate());

    h.wizard.regenerate_decision().await.unwrap();

    let snap = h.wizard.snapshot();
    let WizardStep::ShowingDecision { outcome, .. } = &snap.step else {
        panic!("no decision shown");
    };
    assert_eq!(outcome.regenerations, 1);
    assert!(outcome.decision.decision.contains("떡볶이"));
    assert!(outcome.decision.additional_info.is_none());
    assert!(!snap.can_regenerate());

    let calls = h.provider.call_count();
    let err = h.wizard.regenerate_decision().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_eq!(h.provider.call_count(), calls);
}

#[tokio::test]
async fn follow_ups_beyond_the_cap_are_rejected_locally() {
    let h = harness_with(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION)
            .with_response("네, 조금 매울 수 있어요."),
        InMemoryLocalStorage::new(),
        Some("env-key"),
        SessionLimits {
            max_follow_ups: 1,
            ..SessionLimits::default()
        },
    );
    reach_questions(&h).await;
    answer_all(&h);
    h.wizard.submit_answers().await.unwrap();

    h.wizard.ask_follow_up("많이 맵나요?").await.unwrap();
    let calls = h.provider.call_count();

    let err = h.wizard.ask_follow_up("다른 메뉴는요?").await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert_eq!(h.provider.call_count(), calls);
    let WizardStep::ShowingDecision { outcome, .. } = h.wizard.snapshot().step else {
        panic!("no decision shown");
    };
    assert_eq!(outcome.follow_up.count, 1);
    assert_eq!(
        outcome.follow_up.last_answer.as_deref(),
        Some("네, 조금 매울 수 있어요.")
    );
}

#[tokio::test]
async fn follow_up_failure_stays_on_the_decision() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION)
            .with_error(MockError::Network {
                message: "connection reset".into(),
            }),
    );
    reach_questions(&h).await;
    answer_all(&h);
    h.wizard.submit_answers().await.unwrap();

    assert!(h.wizard.ask_follow_up("맵나요?").await.is_err());

    let snap = h.wizard.snapshot();
    let WizardStep::ShowingDecision { outcome, .. } = &snap.step else {
        panic!("left the decision screen");
    };
    assert!(outcome.follow_up.last_error.is_some());
    assert_eq!(outcome.follow_up.count, 0);
    assert!(snap.error.is_none());
}

// =============================================================================
// API Keys
// =============================================================================

#[tokio::test]
async fn invalid_saved_key_is_removed_and_reported() {
    let h = harness_with(
        MockAIProvider::new().with_error(MockError::AuthenticationFailed),
        InMemoryLocalStorage::new(),
        None,
        SessionLimits::default(),
    );
    assert_eq!(h.wizard.snapshot().key_source, KeySource::None);

    assert!(h.wizard.save_api_key("  user-key  ").unwrap());
    assert_eq!(
        h.storage.peek(USER_API_KEY_STORAGE_KEY).as_deref(),
        Some("user-key")
    );

    let err = h.wizard.start().await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::KeyInvalid);
    assert!(h.storage.peek(USER_API_KEY_STORAGE_KEY).is_none());
    let snap = h.wizard.snapshot();
    assert!(!snap.ai_ready);
    assert_eq!(snap.key_source, KeySource::None);
    assert_eq!(snap.error.unwrap().error.kind, ErrorKind::KeyInvalid);
}

#[tokio::test]
async fn missing_key_is_reported_before_any_call() {
    let h = harness_with(
        MockAIProvider::new(),
        InMemoryLocalStorage::new(),
        None,
        SessionLimits::default(),
    );

    let err = h.wizard.start().await.unwrap_err();

    assert_eq!(
        err.kind,
        ErrorKind::KeyNotConfigured {
            key_source: KeySource::None
        }
    );
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn environment_key_shadows_a_saved_key() {
    let h = harness_with(
        MockAIProvider::new(),
        InMemoryLocalStorage::new().with_item(USER_API_KEY_STORAGE_KEY, "local-key"),
        Some("env-key"),
        SessionLimits::default(),
    );

    let snap = h.wizard.snapshot();
    assert!(snap.ai_ready);
    assert_eq!(snap.key_source, KeySource::Env);
    assert!(snap.env_key_overrides_local);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn unknown_history_id_stays_on_the_list_with_a_history_error() {
    let h = harness(MockAIProvider::new());
    h.wizard.show_history().unwrap();

    let err = h.wizard.show_history_detail("missing").unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingHistory);
    assert_eq!(snap.history_error.as_deref(), Some("선택한 기록을 찾을 수 없습니다."));
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn deleting_the_viewed_record_returns_to_the_list() {
    let h = harness(MockAIProvider::new());
    h.wizard.import_history_json(SAVED_RECORD).unwrap();
    h.wizard.show_history().unwrap();
    h.wizard.show_history_detail("7").unwrap();
    assert_eq!(h.wizard.step_kind(), StepKind::ShowingHistoryDetail);

    h.wizard.delete_history_item("7").unwrap();

    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingHistory);
    assert!(snap.history.is_empty());
    assert!(snap.history_error.is_none());
}

#[tokio::test]
async fn failed_delete_keeps_the_record_and_reports_it() {
    let h = harness(MockAIProvider::new());
    h.wizard.import_history_json(SAVED_RECORD).unwrap();
    h.wizard.show_history().unwrap();
    h.wizard.show_history_detail("7").unwrap();
    h.storage.set_fail_writes(true);

    assert!(h.wizard.delete_history_item("7").is_err());

    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingHistoryDetail);
    assert_eq!(snap.history.len(), 1);
    assert!(snap.history_error.is_some());
    assert!(snap.error.is_none());
}

#[tokio::test]
async fn import_failures_use_the_history_channel_only() {
    let h = harness(MockAIProvider::new().with_response(SUGGESTIONS));

    let err = h.wizard.import_history_json(r#"{"foo": 1}"#).unwrap_err();

    assert_eq!(err.kind, ErrorKind::ImportValidationError);
    let snap = h.wizard.snapshot();
    assert!(snap.history_error.is_some());
    assert!(snap.error.is_none());
    assert_eq!(snap.step.kind(), StepKind::Welcome);

    h.wizard.start().await.unwrap();
    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingSuggestions);
    assert!(snap.history_error.is_none());
}

#[tokio::test]
async fn import_from_a_file_reports_through_the_wizard() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("backup.json");
    let wrong_type = dir.path().join("backup.txt");
    std::fs::write(&good, SAVED_RECORD).unwrap();
    std::fs::write(&wrong_type, SAVED_RECORD).unwrap();
    let h = harness(MockAIProvider::new());
    h.wizard.show_history().unwrap();

    assert!(h.wizard.import_history_file(&wrong_type).is_err());
    assert!(h.wizard.snapshot().history_error.is_some());

    let report = h.wizard.import_history_file(&good).unwrap();

    assert_eq!(report.imported, 1);
    let snap = h.wizard.snapshot();
    assert!(snap.history_error.is_none());
    assert_eq!(snap.last_import, Some(report));
    assert_eq!(snap.history[0].problem_description, "이사를 갈까요?");
    assert!(snap.error.is_none());
}

// =============================================================================
// Terminal Session
// =============================================================================

#[tokio::test]
async fn terminal_session_runs_a_scripted_flow() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS)
            .with_response(DECISION),
    );
    let export_dir = tempfile::tempdir().unwrap();
    let session = TerminalSession::new(h.wizard.clone(), export_dir.path());

    let script = "\n1\n1\n1\n1\n1\ns\nw\n:q\n";
    let mut output = Vec::new();
    session.run(script.as_bytes(), &mut output).await.unwrap();

    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("이런 고민은 어때요?"));
    assert!(text.contains("질문 1/4"));
    assert!(text.contains("따끈한 김치찌개를 끓여 드세요"));
    assert!(text.contains("이 결정 저장됨"));
    assert_eq!(h.wizard.snapshot().history.len(), 1);
}

#[tokio::test]
async fn unknown_commands_are_ignored() {
    let h = harness(MockAIProvider::new());
    let session = TerminalSession::new(h.wizard.clone(), ".");

    let (_, notice) = session.apply(Command::parse("zzz")).await;

    assert!(notice.is_none());
    assert_eq!(h.wizard.step_kind(), StepKind::Welcome);
    assert_eq!(h.provider.call_count(), 0);
}

#[tokio::test]
async fn problem_text_that_looks_like_a_command_is_submitted() {
    let h = harness(
        MockAIProvider::new()
            .with_response(SUGGESTIONS)
            .with_response(DINNER_QUESTIONS),
    );
    let session = TerminalSession::new(h.wizard.clone(), ".");
    h.wizard.start().await.unwrap();
    h.wizard.choose_manual_input().unwrap();

    let (_, notice) = session.apply_line("i can't decide what to eat tonight").await;

    assert!(notice.is_none());
    let snap = h.wizard.snapshot();
    let WizardStep::AnsweringQuestions(question_session) = &snap.step else {
        panic!("problem was not submitted");
    };
    assert_eq!(question_session.problem, "i can't decide what to eat tonight");
    assert!(h
        .provider
        .last_call()
        .unwrap()
        .prompt
        .contains("i can't decide what to eat tonight"));
}

#[tokio::test]
async fn colon_b_on_problem_entry_goes_back_to_suggestions() {
    let h = harness(MockAIProvider::new().with_response(SUGGESTIONS));
    let session = TerminalSession::new(h.wizard.clone(), ".");
    h.wizard.start().await.unwrap();
    h.wizard.choose_manual_input().unwrap();

    session.apply_line(":b").await;

    assert_eq!(h.wizard.step_kind(), StepKind::ShowingSuggestions);
    assert_eq!(h.provider.call_count(), 1);
}

#[tokio::test]
async fn detail_screen_deletes_the_record_on_d() {
    let h = harness(MockAIProvider::new());
    let session = TerminalSession::new(h.wizard.clone(), ".");
    h.wizard.import_history_json(SAVED_RECORD).unwrap();
    h.wizard.show_history().unwrap();

    session.apply_line("v 1").await;
    assert_eq!(h.wizard.step_kind(), StepKind::ShowingHistoryDetail);
    session.apply_line("d").await;

    let snap = h.wizard.snapshot();
    assert_eq!(snap.step.kind(), StepKind::ShowingHistory);
    assert!(snap.history.is_empty());
}

#[tokio::test]
async fn pasted_json_on_the_history_screen_is_imported() {
    let h = harness(MockAIProvider::new());
    let session = TerminalSession::new(h.wizard.clone(), ".");
    h.wizard.show_history().unwrap();

    let (_, notice) = session.apply_line(SAVED_RECORD).await;

    assert!(notice.is_some());
    assert_eq!(h.wizard.snapshot().history.len(), 1);
}
