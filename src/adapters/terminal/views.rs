//! Screen rendering.
//!
//! Every screen is a pure function of a [`WizardSnapshot`], so the same
//! snapshot always renders the same text.

use crate::application::{ErrorStage, KeySource, WizardSnapshot};
use crate::domain::decision::{DecisionData, SavedDecision};
use crate::domain::wizard::{DecisionOutcome, QuestionSession, WizardStep};

pub const KEY_SAVED: &str = "API 키가 저장되고 서비스가 활성화되었습니다.";
pub const KEY_SAVE_FAILED: &str = "입력된 API 키로 서비스 초기화에 실패했습니다. 키가 유효한지, Gemini API가 활성화되어 있는지 확인해주세요.";
pub const KEY_CLEARED: &str = "저장된 API 키가 삭제되었습니다.";
pub const KEY_ENV_OVERRIDES: &str = "환경 변수에 설정된 API 키가 우선 사용됩니다.";

const RULE: &str = "──────────────────────────────────────────";

/// Renders the whole screen: error panel, current step, key footer.
pub fn render(snapshot: &WizardSnapshot) -> String {
    let mut out = String::new();

    if let Some(panel) = error_panel(snapshot) {
        out.push_str(&panel);
    }

    let body = match &snapshot.step {
        WizardStep::Welcome => welcome(snapshot),
        WizardStep::ShowingSuggestions if snapshot.busy.suggestions => loading(snapshot),
        WizardStep::ShowingSuggestions => suggestions(snapshot),
        WizardStep::AskingProblem => problem_input(snapshot),
        WizardStep::GeneratingQuestions { .. }
        | WizardStep::GeneratingDecision(_)
        | WizardStep::RegeneratingDecision { .. } => loading(snapshot),
        WizardStep::AnsweringQuestions(session) => questionnaire(snapshot, session),
        WizardStep::ShowingDecision { session, outcome } => decision(snapshot, session, outcome),
        WizardStep::ShowingHistory => history_list(snapshot),
        WizardStep::ShowingHistoryDetail(saved) => history_detail(saved),
    };
    out.push_str(&body);
    out.push_str(&key_status(snapshot));
    out
}

fn welcome(snapshot: &WizardSnapshot) -> String {
    let mut section = String::from("🔮 결정 마법사\n\n");
    section.push_str("혼자 결정하기 어려운 고민이 있나요?\n");
    section.push_str("마법사가 몇 가지 질문으로 당신에게 맞는 결정을 찾아드려요.\n\n");
    section.push_str("  [Enter] 마법 시작하기 ✨\n");
    if snapshot.has_stored_history {
        section.push_str("  [h] 나의 결정 기록 보기\n");
    }
    section
}

fn suggestions(snapshot: &WizardSnapshot) -> String {
    let mut section = String::from("이런 고민은 어때요?\n\n");
    for (i, text) in snapshot.suggestions.iter().enumerate() {
        section.push_str(&format!("  [{}] {}\n", i + 1, text));
    }
    section.push_str("\n  [m] 직접 고민 입력하기\n");
    section
}

fn problem_input(snapshot: &WizardSnapshot) -> String {
    let mut section = String::from("어떤 고민이 있으신가요?\n\n");
    if !snapshot.problem_draft.is_empty() {
        section.push_str(&format!("  (입력 중: {})\n\n", snapshot.problem_draft));
    }
    section.push_str("  고민을 입력하고 Enter를 누르세요.\n");
    section.push_str("  [:b] 다른 고민 제안 보기\n");
    section
}

fn loading(snapshot: &WizardSnapshot) -> String {
    let mut section = String::from("마법사가 열심히 생각하고 있어요! 🤔\n");
    let detail = match &snapshot.step {
        WizardStep::GeneratingQuestions { problem } => {
            format!("\"{}\"에 대한 질문을 준비하는 중", problem)
        }
        WizardStep::GeneratingDecision(_) => "답변을 바탕으로 결정을 내리는 중".to_string(),
        WizardStep::RegeneratingDecision { .. } => "다른 결정을 찾아보는 중".to_string(),
        _ => "고민 제안을 불러오는 중".to_string(),
    };
    section.push_str(&format!("{}... 잠시만 기다려주세요...\n", detail));
    section
}

fn questionnaire(snapshot: &WizardSnapshot, session: &QuestionSession) -> String {
    let mut section = String::from("몇 가지 질문에 답해주세요\n");
    section.push_str(&format!("고민: {}\n\n", session.problem));

    let total = session.questions.len();
    let answered = session.answers.len();

    match session.answers.unanswered(&session.questions).first() {
        Some(question) => {
            let position = session
                .questions
                .iter()
                .position(|q| q.id == question.id)
                .map(|i| i + 1)
                .unwrap_or(answered + 1);
            section.push_str(&format!("질문 {}/{}\n", position, total));
            section.push_str(&format!("{}\n", question.text));
            for (i, option) in question.options.iter().enumerate() {
                section.push_str(&format!("  [{}] {}\n", i + 1, option));
            }
        }
        None => {
            section.push_str(&format!("모든 질문({}개)에 답했어요.\n", total));
            section.push_str("  [s] 결정 보기\n");
        }
    }
    section.push('\n');

    if snapshot.busy.dynamic_question {
        section.push_str("  맞춤 질문을 만드는 중...\n");
    } else if session.no_more_questions {
        section.push_str("  더 이상 제공할 맞춤 질문이 없습니다.\n");
    } else if snapshot.can_add_question() {
        section.push_str(&format!(
            "  [+] 더 자세한 맞춤 질문 받기 ({}/{})\n",
            session.dynamic_added, snapshot.limits.max_dynamic_questions
        ));
    }
    section
}

fn decision(
    snapshot: &WizardSnapshot,
    session: &QuestionSession,
    outcome: &DecisionOutcome,
) -> String {
    let mut section = String::from("✨ 마법사의 결정! ✨\n");
    section.push_str(&format!("고민: {}\n\n", session.problem));
    section.push_str(&decision_body(&outcome.decision));

    section.push_str(&format!("{}\n", RULE));
    section.push_str("결정에 대해 더 궁금한 점이 있나요?\n");
    if let Some(answer) = &outcome.follow_up.last_answer {
        section.push_str(&format!("마법사의 답변: {}\n", answer));
    }
    if let Some(err) = &outcome.follow_up.last_error {
        section.push_str(&format!("⚠ {}\n", err));
    }
    if snapshot.busy.follow_up {
        section.push_str("  답변을 준비하는 중...\n");
    } else if snapshot.can_ask_follow_up() {
        let remaining = snapshot
            .limits
            .max_follow_ups
            .saturating_sub(outcome.follow_up.count);
        section.push_str(&format!("  [? 질문] 후속 질문하기 (남은 횟수: {})\n", remaining));
    } else {
        section.push_str("  모든 후속 질문 기회를 사용했어요.\n");
    }
    section.push_str(&format!("{}\n", RULE));

    if snapshot.can_regenerate() {
        section.push_str("  [r] 다른 결정 제안받기\n");
    } else {
        section.push_str("  더 이상 다른 제안이 없어요\n");
    }
    if outcome.saved {
        section.push_str("  ✔ 이 결정 저장됨\n");
    } else {
        section.push_str("  [w] 이 결정 저장하기\n");
    }
    section.push_str("  [n] 새로운 고민 상담하기\n");
    section
}

/// Decision, reasoning, strength, pros, cons and links.
fn decision_body(data: &DecisionData) -> String {
    let mut section = format!("▶ {}\n\n", data.decision);
    section.push_str(&format!("결정 이유는...\n{}\n\n", data.reasoning));
    section.push_str(&format!("마법사의 확신도: {}\n\n", data.decision_strength));

    if let Some(pros) = data.pros.as_deref().filter(|p| !p.is_empty()) {
        section.push_str("👍 이 결정의 좋은 점\n");
        for pro in pros {
            section.push_str(&format!("  - {}\n", pro));
        }
        section.push('\n');
    }
    if let Some(cons) = data.cons.as_deref().filter(|c| !c.is_empty()) {
        section.push_str("🤔 고려할 점\n");
        for con in cons {
            section.push_str(&format!("  - {}\n", con));
        }
        section.push('\n');
    }

    if let Some(info) = &data.additional_info {
        if let Some(text) = &info.text {
            section.push_str(&format!("{}\n", text));
        }
        for link in data.links() {
            section.push_str(&format!("  • {} <{}>\n", link.title, link.uri));
        }
        section.push('\n');
    }
    section
}

fn history_list(snapshot: &WizardSnapshot) -> String {
    let mut section = String::from("📜 나의 결정 기록\n\n");

    if snapshot.history.is_empty() {
        section.push_str("아직 저장된 결정 기록이 없어요.\n\n");
    } else {
        section.push_str(&format!(
            "총 {}개의 결정 기록이 저장되어 있습니다.\n\n",
            snapshot.history.len()
        ));
        for (i, saved) in snapshot.history.iter().enumerate() {
            section.push_str(&format!(
                "  [{}] {} ({})\n      → {}\n",
                i + 1,
                saved.problem_description,
                format_saved_at(saved),
                saved.decision_data.decision
            ));
        }
        section.push_str("\n  [v 번호] 자세히 보기   [d 번호] 삭제\n");
        section.push_str("  [x] 기록 내보내기\n");
    }
    section.push_str("  [i 경로] 기록 가져오기 (.json)   또는 내보낸 JSON을 한 줄로 붙여넣기\n");
    section.push_str("  [l] 시작 화면으로 돌아가기\n");
    section
}

fn history_detail(saved: &SavedDecision) -> String {
    let mut section = String::from("📜 결정 기록 상세\n");
    section.push_str(&format!("저장 일시: {}\n", format_saved_at(saved)));
    section.push_str(&format!("고민: {}\n\n", saved.problem_description));

    section.push_str("나의 답변\n");
    for question in &saved.questions {
        section.push_str(&format!(
            "  Q. {}\n  A. {}\n",
            question.text,
            saved.answers.get(&question.id).unwrap_or("-")
        ));
    }
    section.push('\n');
    section.push_str(&decision_body(&saved.decision_data));
    section.push_str("  [d] 이 기록 삭제   [b] 목록으로 돌아가기\n");
    section
}

fn format_saved_at(saved: &SavedDecision) -> String {
    saved
        .saved_at
        .as_datetime()
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Main-channel error plus the history error, if any.
pub fn error_panel(snapshot: &WizardSnapshot) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(err) = &snapshot.error {
        let title = match err.stage {
            ErrorStage::Save => "저장 오류",
            _ if err.error.is_key_error() => "API 키 오류",
            _ => "오류 발생",
        };
        lines.push(format!("⚠ {}: {}", title, err.message()));
    }
    if let Some(message) = &snapshot.history_error {
        lines.push(format!("ℹ {}", message));
    }
    if lines.is_empty() {
        return None;
    }

    let mut panel = lines.join("\n");
    panel.push_str("\n  [:c] 닫기\n\n");
    Some(panel)
}

/// One-line status of the API key, derived from the snapshot.
pub fn key_status_text(snapshot: &WizardSnapshot) -> &'static str {
    if snapshot.ai_ready {
        return match snapshot.key_source {
            KeySource::Env => "활성 (환경 변수)",
            _ => "활성 (로컬 저장됨)",
        };
    }
    match snapshot.key_source {
        KeySource::None => "설정 필요",
        KeySource::Local => "오류 (저장된 키 확인 필요)",
        KeySource::Env => "오류 (환경 변수 키 확인 필요)",
    }
}

fn key_status(snapshot: &WizardSnapshot) -> String {
    let mut footer = format!("\n{}\nAPI 키 상태: {}", RULE, key_status_text(snapshot));
    if snapshot.env_key_overrides_local {
        footer.push_str(&format!(" ({})", KEY_ENV_OVERRIDES));
    }
    footer.push_str("\n  :key <API 키>  키 저장   :clearkey  키 삭제   :q  종료\n");
    footer
}
