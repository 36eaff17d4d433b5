use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failures crossing the skill core boundary.
///
/// `NoResults`, `StaleIndex`, `InvalidCommand` and `Catalog` are recovered
/// into spoken responses by the core. `MissingTemplate` and `Config` are
/// deployment defects and propagate to the transport.
#[derive(Debug, Error)]
pub enum SkillError {
    #[error("query returned no results")]
    NoResults,
    #[error("start index {start_index} is past the end of a {total}-item list")]
    StaleIndex { start_index: usize, total: usize },
    #[error("invalid navigation command: {0}")]
    InvalidCommand(String),
    #[error("missing response template: {0}")]
    MissingTemplate(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("catalog query failed: {0}")]
    Catalog(String),
}

impl SkillError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingTemplate(_) | Self::Config(_))
    }
}

impl From<SkillError> for ApiError {
    fn from(value: SkillError) -> Self {
        let code = match value {
            SkillError::NoResults => ErrorCode::NotFound,
            SkillError::StaleIndex { .. } | SkillError::InvalidCommand(_) => ErrorCode::Validation,
            SkillError::MissingTemplate(_) | SkillError::Config(_) | SkillError::Catalog(_) => {
                ErrorCode::Internal
            }
        };
        Self {
            code,
            message: value.to_string(),
        }
    }
}
