//! Decision AI client.
//!
//! Owns the model handle and the key it was built from, and turns the five
//! wizard requests into provider calls with typed, validated results.
//!
//! # Key precedence
//!
//! An environment key always wins over a key saved in local storage. A
//! missing handle is rebuilt lazily before every call, so saving or clearing
//! a key takes effect on the next request.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use super::errors::{GenieError, KeySource};
use super::json_extract::{extract_json, ExtractedJson};
use super::prompts;
use crate::domain::decision::{
    merge_links, AnswerMap, DecisionData, Link, Question, MIN_OPTIONS,
};
use crate::ports::{
    AIError, AIProvider, FinishReason, GenerateRequest, GenerateResponse, LocalStorage,
    ModelConnector, USER_API_KEY_STORAGE_KEY,
};

pub const SUGGESTIONS_TEMPERATURE: f32 = 0.8;
pub const QUESTIONS_TEMPERATURE: f32 = 0.7;
pub const DYNAMIC_QUESTION_TEMPERATURE: f32 = 0.75;
pub const DECISION_TEMPERATURE: f32 = 0.5;
pub const REGENERATION_TEMPERATURE: f32 = 0.7;
pub const FOLLOW_UP_TEMPERATURE: f32 = 0.6;

const MIN_DECISION_CHARS: usize = 5;
const MIN_REASONING_CHARS: usize = 20;
const MIN_STRENGTH_CHARS: usize = 2;

const MALFORMED_SUGGESTIONS: &str = "AI로부터 유효한 형식의 고민거리 제안을 받지 못했습니다.";
const MALFORMED_QUESTIONS: &str =
    "AI로부터 유효한 형식의 질문을 받지 못했습니다. 질문 형식을 확인해주세요.";
const MALFORMED_DECISION: &str = "AI로부터 유효한 형식의 결정, 이유, 결정 강도, 링크, 장점 또는 단점 정보를 받지 못했습니다. 내용이 충분히 구체적인지, 각 항목의 형식이 올바른지 확인해주세요.";
const EMPTY_FOLLOW_UP: &str = "AI가 후속 질문에 대한 답변을 제공하지 않았습니다.";
const BLOCKED_RESPONSE: &str = "AI가 안전 정책에 따라 응답을 차단했습니다. 고민 내용을 조금 바꿔서 다시 시도해주세요.";

struct ClientState {
    handle: Option<Arc<dyn AIProvider>>,
    active_source: KeySource,
}

/// Client for all decision-related AI requests.
pub struct DecisionAiClient {
    connector: Arc<dyn ModelConnector>,
    storage: Arc<dyn LocalStorage>,
    env_key: Option<Secret<String>>,
    state: Mutex<ClientState>,
}

impl std::fmt::Debug for DecisionAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionAiClient")
            .field("has_env_key", &self.env_key.is_some())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl DecisionAiClient {
    /// Creates the client and attempts a first initialization.
    ///
    /// A blank environment key is treated as absent.
    pub fn new(
        connector: Arc<dyn ModelConnector>,
        storage: Arc<dyn LocalStorage>,
        env_key: Option<String>,
    ) -> Self {
        let env_key = env_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Secret::new);
        let client = Self {
            connector,
            storage,
            env_key,
            state: Mutex::new(ClientState {
                handle: None,
                active_source: KeySource::None,
            }),
        };
        client.initialize();
        client
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn stored_key(&self) -> Option<String> {
        match self.storage.get_item(USER_API_KEY_STORAGE_KEY) {
            Ok(key) => key.filter(|k| !k.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored API key");
                None
            }
        }
    }

    fn remove_stored_key(&self) {
        if let Err(e) = self.storage.remove_item(USER_API_KEY_STORAGE_KEY) {
            tracing::warn!(error = %e, "could not remove stored API key");
        }
    }

    /// Builds the model handle from the best available key.
    ///
    /// Tries the environment key, then the stored key. A stored key that
    /// fails to connect is removed. Returns whether a handle is now set.
    pub fn initialize(&self) -> bool {
        if let Some(env_key) = &self.env_key {
            match self.connector.connect(env_key.expose_secret()) {
                Ok(handle) => {
                    self.install(handle, KeySource::Env);
                    return true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "environment API key failed to initialize");
                }
            }
        }

        if let Some(local_key) = self.stored_key() {
            match self.connector.connect(local_key.trim()) {
                Ok(handle) => {
                    self.install(handle, KeySource::Local);
                    return true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stored API key failed to initialize, removing it");
                    self.remove_stored_key();
                }
            }
        }

        let mut state = self.state();
        state.handle = None;
        state.active_source = KeySource::None;
        false
    }

    fn install(&self, handle: Arc<dyn AIProvider>, source: KeySource) {
        let info = handle.provider_info();
        tracing::info!(source = %source, provider = %info.name, model = %info.model, "AI service initialized");
        let mut state = self.state();
        state.handle = Some(handle);
        state.active_source = source;
    }

    /// Re-runs initialization after the stored key changed.
    pub fn reinitialize_on_key_change(&self) -> bool {
        self.initialize()
    }

    pub fn is_initialized(&self) -> bool {
        self.state().handle.is_some()
    }

    /// Where the key in use comes from, or would come from.
    ///
    /// With a live handle this is the source of its key; otherwise the
    /// source that would be tried first.
    pub fn api_key_source(&self) -> KeySource {
        {
            let state = self.state();
            if state.handle.is_some() {
                return state.active_source;
            }
        }
        if self.env_key.is_some() {
            KeySource::Env
        } else if self.stored_key().is_some() {
            KeySource::Local
        } else {
            KeySource::None
        }
    }

    /// True when a stored key exists but the environment key shadows it.
    pub fn env_key_overrides_local(&self) -> bool {
        self.env_key.is_some() && self.stored_key().is_some()
    }

    /// Stores a user key and re-initializes. Returns whether the client is
    /// now initialized.
    pub fn save_user_key(&self, key: &str) -> Result<bool, GenieError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(GenieError::invalid_input("API 키를 입력해주세요."));
        }
        self.storage.set_item(USER_API_KEY_STORAGE_KEY, key)?;
        Ok(self.reinitialize_on_key_change())
    }

    /// Removes the stored user key and re-initializes.
    pub fn clear_user_key(&self) -> Result<bool, GenieError> {
        self.storage.remove_item(USER_API_KEY_STORAGE_KEY)?;
        Ok(self.reinitialize_on_key_change())
    }

    fn ensure_handle(&self) -> Result<(Arc<dyn AIProvider>, KeySource), GenieError> {
        {
            let state = self.state();
            if let Some(handle) = &state.handle {
                return Ok((Arc::clone(handle), state.active_source));
            }
        }
        tracing::debug!("AI client not ready, re-initializing before call");
        if self.initialize() {
            let state = self.state();
            if let Some(handle) = &state.handle {
                return Ok((Arc::clone(handle), state.active_source));
            }
        }
        Err(GenieError::key_not_configured(self.api_key_source()))
    }

    async fn call(&self, request: GenerateRequest) -> Result<GenerateResponse, GenieError> {
        let (handle, source) = self.ensure_handle()?;
        let response = handle
            .generate(request)
            .await
            .map_err(|e| self.map_ai_error(e, source))?;
        match response.finish_reason {
            FinishReason::Stop => {}
            FinishReason::ContentFilter if response.text.trim().is_empty() => {
                tracing::warn!(model = %response.model, "response blocked by the safety filter");
                return Err(GenieError::empty_response(BLOCKED_RESPONSE));
            }
            reason => {
                tracing::warn!(?reason, model = %response.model, "model stopped early");
            }
        }
        Ok(response)
    }

    fn map_ai_error(&self, err: AIError, source: KeySource) -> GenieError {
        tracing::error!(error = %err, "AI request failed");
        match err {
            AIError::AuthenticationFailed => {
                {
                    let mut state = self.state();
                    state.handle = None;
                    state.active_source = KeySource::None;
                }
                if source == KeySource::Local {
                    tracing::warn!("removing stored API key rejected by the provider");
                    self.remove_stored_key();
                }
                GenieError::key_invalid()
            }
            AIError::QuotaExceeded(_) | AIError::RateLimited { .. } => {
                GenieError::quota_exceeded(err.to_string())
            }
            AIError::Network(_) | AIError::Timeout { .. } => GenieError::network(err.to_string()),
            AIError::Unavailable { .. } | AIError::InvalidRequest(_) | AIError::Parse(_) => {
                GenieError::service(err.to_string())
            }
        }
    }

    /// Asks for a handful of everyday dilemmas to pick from.
    pub async fn suggest_problems(&self) -> Result<Vec<String>, GenieError> {
        let request = GenerateRequest::new(prompts::suggestions_prompt())
            .with_temperature(SUGGESTIONS_TEMPERATURE)
            .expecting_json();
        let response = self.call(request).await?;

        let suggestions = match extract_json(&response.text) {
            ExtractedJson::Value(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>(),
            _ => None,
        };

        match suggestions {
            Some(list) => Ok(list.into_iter().filter(|s| !s.is_empty()).collect()),
            None => {
                tracing::warn!(raw = %response.text, "invalid suggestion format");
                Err(GenieError::malformed(MALFORMED_SUGGESTIONS))
            }
        }
    }

    /// Generates the initial clarifying questions for a problem.
    ///
    /// Missing or repeated ids are replaced with `q{index+1}`. An empty array
    /// comes back as an empty list; the caller decides what that means.
    pub async fn generate_questions(&self, problem: &str) -> Result<Vec<Question>, GenieError> {
        let request = GenerateRequest::new(prompts::questions_prompt(problem))
            .with_temperature(QUESTIONS_TEMPERATURE)
            .expecting_json();
        let response = self.call(request).await?;

        let parsed = match extract_json(&response.text) {
            ExtractedJson::Value(Value::Array(items)) => parse_question_list(items),
            _ => None,
        };
        parsed.ok_or_else(|| {
            tracing::warn!(raw = %response.text, "invalid question format");
            GenieError::malformed(MALFORMED_QUESTIONS)
        })
    }

    /// Generates one more question, or `None` when the model has nothing
    /// more to ask.
    ///
    /// The returned question's id is always `dyn_q_{ordinal}`.
    pub async fn generate_single_additional_question(
        &self,
        problem: &str,
        questions: &[Question],
        answers: &AnswerMap,
        ordinal: u32,
    ) -> Result<Option<Question>, GenieError> {
        let request = GenerateRequest::new(prompts::additional_question_prompt(
            problem, questions, answers, ordinal,
        ))
        .with_temperature(DYNAMIC_QUESTION_TEMPERATURE)
        .expecting_json();
        let response = self.call(request).await?;

        let value = match extract_json(&response.text) {
            ExtractedJson::Value(value) => value,
            ExtractedJson::EmptyObject | ExtractedJson::Unparseable => {
                tracing::info!("model returned no additional question");
                return Ok(None);
            }
        };

        let id = format!("dyn_q_{ordinal}");
        match parse_question(&value, &id) {
            Some(question) => Ok(Some(question)),
            None => {
                tracing::warn!(raw = %response.text, "invalid additional question format");
                Ok(None)
            }
        }
    }

    /// Produces the recommendation for a fully answered session.
    ///
    /// Web-search grounding is enabled; grounding citations are merged
    /// ahead of the model's own links.
    pub async fn make_decision(
        &self,
        problem: &str,
        answers: &AnswerMap,
        questions: &[Question],
        is_regeneration: bool,
        previous_decision: Option<&str>,
    ) -> Result<DecisionData, GenieError> {
        let previous = previous_decision.filter(|_| is_regeneration);
        let temperature = if is_regeneration {
            REGENERATION_TEMPERATURE
        } else {
            DECISION_TEMPERATURE
        };
        let request =
            GenerateRequest::new(prompts::decision_prompt(problem, questions, answers, previous))
                .with_temperature(temperature)
                .with_search_grounding();
        let response = self.call(request).await?;

        let raw = extract_json(&response.text)
            .into_value()
            .and_then(|value| serde_json::from_value::<RawDecision>(value).ok())
            .filter(RawDecision::is_well_formed)
            .ok_or_else(|| {
                tracing::warn!(raw = %response.text, "invalid decision format");
                GenieError::malformed(MALFORMED_DECISION)
            })?;

        let citations = response
            .citations
            .into_iter()
            .map(|c| {
                let title = c.title.unwrap_or_else(|| c.uri.clone());
                Link::new(title, c.uri)
            })
            .collect();
        let curated = raw
            .links
            .into_iter()
            .map(|l| Link::new(l.title, l.uri))
            .collect();

        Ok(DecisionData {
            decision: raw.decision,
            reasoning: raw.reasoning,
            decision_strength: raw.decision_strength,
            additional_info: merge_links(citations, curated),
            pros: Some(raw.pros),
            cons: Some(raw.cons),
        })
    }

    /// Answers a free-text question about the current decision.
    pub async fn ask_follow_up(
        &self,
        problem: &str,
        decision: &str,
        reasoning: &str,
        query: &str,
    ) -> Result<String, GenieError> {
        let request =
            GenerateRequest::new(prompts::follow_up_prompt(problem, decision, reasoning, query))
                .with_temperature(FOLLOW_UP_TEMPERATURE);
        let response = self.call(request).await?;

        let answer = response.text.trim();
        if answer.is_empty() {
            tracing::warn!("model returned an empty follow-up answer");
            return Err(GenieError::empty_response(EMPTY_FOLLOW_UP));
        }
        Ok(answer.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecision {
    decision: String,
    reasoning: String,
    decision_strength: String,
    links: Vec<RawLink>,
    pros: Vec<String>,
    cons: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    title: String,
    uri: String,
}

impl RawDecision {
    fn is_well_formed(&self) -> bool {
        self.decision.chars().count() >= MIN_DECISION_CHARS
            && self.reasoning.chars().count() >= MIN_REASONING_CHARS
            && self.decision_strength.chars().count() >= MIN_STRENGTH_CHARS
            && self
                .links
                .iter()
                .all(|l| !l.title.is_empty() && !l.uri.is_empty())
    }
}

/// Parses one question object, using `id` when the model's id is unusable.
fn parse_question(value: &Value, fallback_id: &str) -> Option<Question> {
    let object = value.as_object()?;
    let text = object.get("text")?.as_str()?.trim();
    let options = object
        .get("options")?
        .as_array()?
        .iter()
        .map(|o| o.as_str().map(|s| s.trim().to_string()))
        .collect::<Option<Vec<_>>>()?;
    if options.len() < MIN_OPTIONS {
        return None;
    }
    Question::new(fallback_id, text, options).ok()
}

/// Parses the initial question array, normalizing ids.
fn parse_question_list(items: Vec<Value>) -> Option<Vec<Question>> {
    let mut seen = HashSet::new();
    let mut questions = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let model_id = item
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let id = match model_id {
            Some(id) if !seen.contains(id) => id.to_string(),
            _ => unique_id(format!("q{}", index + 1), &seen),
        };
        let question = parse_question(item, &id)?;
        seen.insert(question.id.clone());
        questions.push(question);
    }
    Some(questions)
}

fn unique_id(base: String, seen: &HashSet<String>) -> String {
    if !seen.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !seen.contains(candidate))
        .unwrap_or(base)
}
