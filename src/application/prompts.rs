//! Prompt templates for each AI request.
//!
//! All user-visible output is requested in Korean.

use crate::domain::decision::{AnswerMap, Question};

const PERSONA: &str = "You are \"결정 마법사\" (Decision Genie), an assistant that helps people make everyday decisions.";

/// Prompt asking for 3-5 everyday dilemmas as a JSON array of strings.
pub fn suggestions_prompt() -> String {
    format!(
        r#"{PERSONA}
The user has not decided yet what they want help with.
Suggest 3 to 5 common, everyday decision problems, phrased as warm and natural questions in Korean.
Keep each suggestion short.

Respond with a JSON array of strings only, for example:
["오늘 저녁, 무엇을 먹으면 기운이 날까요?", "이번 주말에는 어떻게 쉬어볼까요?"]"#
    )
}

/// Prompt asking for the initial batch of 3-4 clarifying questions.
pub fn questions_prompt(problem: &str) -> String {
    format!(
        r#"{PERSONA}
The user's decision problem is: "{problem}"

Write 3 or 4 different multiple-choice questions in Korean that uncover the user's situation and preferences for this problem.
Each question needs 3 or 4 distinct Korean answer options that together cover a sensible range.

Respond with a JSON array only. Each element has this shape:
{{"id": "q1", "text": "질문 (한국어)?", "options": ["옵션 1", "옵션 2", "옵션 3"]}}
Number the ids q1, q2, q3, ... in order."#
    )
}

/// Prompt asking for exactly one new question, or `{}` when nothing useful remains.
pub fn additional_question_prompt(
    problem: &str,
    questions: &[Question],
    answers: &AnswerMap,
    ordinal: u32,
) -> String {
    let transcript = questions
        .iter()
        .map(|q| {
            format!(
                "질문: \"{}\"\n사용자 답변: \"{}\"",
                q.text,
                answers.get(&q.id).unwrap_or("아직 답변하지 않음")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"{PERSONA}
The user's decision problem is: "{problem}"

Questions asked so far and the user's answers:
<<<
{transcript}
>>>

Write EXACTLY ONE new multiple-choice question in Korean that digs deeper than the ones above and does not overlap with them.
Give it 3 or 4 distinct Korean answer options and the id "dyn_q_{ordinal}".

Respond with a single JSON object only:
{{"id": "dyn_q_{ordinal}", "text": "새 질문 (한국어)?", "options": ["옵션 1", "옵션 2", "옵션 3"]}}
If no new, useful question remains, respond with {{}} and nothing else."#
    )
}

/// Prompt asking for the final recommendation.
///
/// `previous` carries the earlier decision text when regenerating, so the
/// model is told to suggest something different.
pub fn decision_prompt(
    problem: &str,
    questions: &[Question],
    answers: &AnswerMap,
    previous: Option<&str>,
) -> String {
    let transcript = questions
        .iter()
        .map(|q| {
            format!(
                "질문: \"{}\"\n선택한 답변: \"{}\"",
                q.text,
                answers.get(&q.id).unwrap_or("답변 없음")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let regeneration = previous
        .map(|text| {
            format!(
                "\nEarlier you suggested: \"{text}\". Give a DIFFERENT decision that still fits the same answers, and do not repeat \"{text}\".\n"
            )
        })
        .unwrap_or_default();

    format!(
        r#"{PERSONA}
Make a clear final decision for the user and explain it in Korean.
The user's problem is: "{problem}"

The user's answers to every question:
<<<
{transcript}
>>>
{regeneration}
Using only the problem and ALL of the answers above:
1. "decision": a concrete, directly actionable choice or next step, warm and encouraging.
2. "reasoning": an empathetic explanation of how the answers led to this decision (at least 70 characters).
3. "decisionStrength": a short phrase expressing your confidence, such as "매우 확신해요!" or "한번 시도해볼 만해요!".
4. "links": 2 or 3 helpful web resources as objects with a Korean "title" and a valid "uri". Always include them, even though web search is available to you.
5. "pros": 2 or 3 short advantages of the decision.
6. "cons": 2 or 3 short drawbacks or things to keep in mind.

Respond with one JSON object with exactly these six keys. All text values must be in Korean."#
    )
}

/// Prompt asking a short free-text answer to a follow-up question.
pub fn follow_up_prompt(problem: &str, decision: &str, reasoning: &str, query: &str) -> String {
    format!(
        r#"{PERSONA}
The user already received a decision and now has a follow-up question.
Problem: "{problem}"
Decision given: "{decision}"
Reasoning given: "{reasoning}"

Follow-up question: "{query}"

Answer the follow-up question directly in Korean, in 1 to 3 sentences, consistent with the decision above.
Only propose an alternative if the question asks for one.
Output plain text only, without markdown or JSON."#
    )
}
