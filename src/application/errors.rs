//! Application-level errors with localized, user-facing messages.
//!
//! Every failure carries an [`ErrorKind`] set where it happens. Routing and
//! display decisions match on the kind; they never inspect message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::ValidationError;
use crate::domain::wizard::StepKind;
use crate::ports::StorageError;

/// Where the active API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Env,
    Local,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Env => "env",
            KeySource::Local => "local",
            KeySource::None => "none",
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant for [`GenieError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No usable API key. `key_source` is where the user should look.
    KeyNotConfigured { key_source: KeySource },
    /// The provider rejected a key that used to work.
    KeyInvalid,
    QuotaExceeded,
    NetworkError,
    /// The model answered, but not in the expected shape.
    MalformedResponse,
    EmptyResponse,
    StorageError,
    ImportValidationError,
    /// Any other provider failure.
    Service,
    /// A client-side guard refused the action.
    InvalidInput,
    /// The action is not available on the current step.
    InvalidState { action: &'static str, step: StepKind },
}

/// Error surfaced by the AI client, the history store and the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {detail}")]
pub struct GenieError {
    pub kind: ErrorKind,
    /// Developer-facing detail; may be empty.
    pub detail: String,
}

impl GenieError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn key_not_configured(key_source: KeySource) -> Self {
        Self::new(ErrorKind::KeyNotConfigured { key_source }, "")
    }

    pub fn key_invalid() -> Self {
        Self::new(ErrorKind::KeyInvalid, "")
    }

    pub fn quota_exceeded(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::QuotaExceeded, detail)
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, detail)
    }

    pub fn empty_response(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyResponse, detail)
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::StorageError, detail)
    }

    pub fn import_validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ImportValidationError, detail)
    }

    pub fn service(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Service, detail)
    }

    pub fn invalid_input(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, detail)
    }

    pub fn invalid_state(action: &'static str, step: StepKind) -> Self {
        Self::new(ErrorKind::InvalidState { action, step }, "")
    }

    /// True for errors the user fixes in key management.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::KeyNotConfigured { .. } | ErrorKind::KeyInvalid
        )
    }

    /// Localized message for display.
    ///
    /// Kinds whose wording depends on the action (malformed or empty AI
    /// output, import problems, guards) return the recorded detail.
    pub fn user_message(&self) -> String {
        match &self.kind {
            ErrorKind::KeyNotConfigured { key_source } => match key_source {
                KeySource::Env => "환경 변수에 설정된 API 키로 AI 서비스 초기화에 실패했습니다. 키가 올바른지 확인해주세요.",
                KeySource::Local => "저장된 API 키로 AI 서비스 초기화에 실패했습니다. API 키 관리자에서 키를 확인하거나 새로 입력해주세요.",
                KeySource::None => "API 키가 설정되지 않았습니다. 화면 하단의 API 키 관리자에서 키를 설정해주세요.",
            }
            .to_string(),
            ErrorKind::KeyInvalid => {
                "API 키가 더 이상 유효하지 않습니다. API 키 관리자에서 키를 업데이트해주세요. (기존 키 삭제됨)".to_string()
            }
            ErrorKind::QuotaExceeded => {
                "API 사용 할당량을 초과했습니다. 잠시 후 다시 시도하거나 사용량을 확인해주세요.".to_string()
            }
            ErrorKind::NetworkError => {
                "네트워크 오류가 발생했습니다. 인터넷 연결을 확인하고 다시 시도해주세요.".to_string()
            }
            ErrorKind::Service => format!(
                "Gemini API 호출 중 오류 발생: {}",
                if self.detail.is_empty() { "알 수 없는 오류" } else { &self.detail }
            ),
            ErrorKind::InvalidState { .. } => "지금은 이 작업을 할 수 없습니다.".to_string(),
            ErrorKind::MalformedResponse
            | ErrorKind::EmptyResponse
            | ErrorKind::StorageError
            | ErrorKind::ImportValidationError
            | ErrorKind::InvalidInput => self.detail.clone(),
        }
    }
}

impl From<StorageError> for GenieError {
    fn from(err: StorageError) -> Self {
        GenieError::storage(err.to_string())
    }
}

impl From<ValidationError> for GenieError {
    fn from(err: ValidationError) -> Self {
        GenieError::invalid_input(err.to_string())
    }
}

/// The wizard activity an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorStage {
    Suggestions,
    Questions,
    DynamicQuestion,
    Decision,
    Regeneration,
    FollowUp,
    Save,
}

/// An error recorded on the wizard's main error channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    pub stage: ErrorStage,
    pub error: GenieError,
}

impl StageError {
    pub fn new(stage: ErrorStage, error: GenieError) -> Self {
        Self { stage, error }
    }

    /// Message shown to the user, prefixed with what was being attempted.
    ///
    /// Key errors and guard rejections are shown unprefixed.
    pub fn message(&self) -> String {
        let base = self.error.user_message();
        if self.error.is_key_error()
            || matches!(
                self.error.kind,
                ErrorKind::InvalidInput | ErrorKind::InvalidState { .. }
            )
        {
            return base;
        }
        match self.stage {
            ErrorStage::Suggestions => {
                "고민거리 제안을 불러오는 중 문제가 발생했어요. 직접 입력해주세요.".to_string()
            }
            ErrorStage::Questions => {
                format!("질문 생성 중 오류 발생: {base}. 잠시 후 다시 시도해주세요.")
            }
            ErrorStage::DynamicQuestion => format!("추가 질문 생성 중 오류 발생: {base}."),
            ErrorStage::Decision => {
                format!("결정 생성 중 오류 발생: {base}. 잠시 후 다시 시도해주세요.")
            }
            ErrorStage::Regeneration => {
                format!("결정 재생성 중 오류 발생: {base}. 잠시 후 다시 시도해주세요.")
            }
            ErrorStage::FollowUp => format!("후속 질문 처리 중 오류: {base}"),
            ErrorStage::Save => base,
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
