//! Error taxonomy for the performer pipeline
//!
//! Every failure crossing the pipeline boundary is a [`PerformerError`]. The
//! four kinds map one-to-one onto the stage that failed; callers decide on
//! retries, the pipeline never does.

use crate::config::ConfigurationError;
use crate::dispatch::DispatchError;
use crate::intake::{IntakeRejection, TaskRejection};
use crate::verification::ResultRejection;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

const MAX_REPORT_MESSAGE_LEN: usize = 500;

static SECRET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(api[-_]?key|password|token|secret|credential)[=:]\s*\S+")
        .expect("secret pattern is a valid regex")
});

static BEARER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").expect("bearer pattern is a valid regex")
});

/// Main error type for pipeline operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PerformerError {
    #[error("invalid task: {0}")]
    InvalidTask(#[from] TaskRejection),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("dispatch failure: {0}")]
    DispatchFailure(#[from] DispatchError),

    #[error("invalid result: {0}")]
    InvalidResult(#[from] ResultRejection),
}

impl From<IntakeRejection> for PerformerError {
    fn from(rejection: IntakeRejection) -> Self {
        match rejection {
            IntakeRejection::Task(reason) => PerformerError::InvalidTask(reason),
            IntakeRejection::Configuration(reason) => PerformerError::Configuration(reason),
        }
    }
}

/// Coarse error classification reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidTask,
    ConfigurationError,
    DispatchFailure,
    InvalidResult,
}

/// Serializable, sanitized error summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl PerformerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PerformerError::InvalidTask(_) => ErrorKind::InvalidTask,
            PerformerError::Configuration(_) => ErrorKind::ConfigurationError,
            PerformerError::DispatchFailure(_) => ErrorKind::DispatchFailure,
            PerformerError::InvalidResult(_) => ErrorKind::InvalidResult,
        }
    }

    /// Whether the failure happened before any outbound call was attempted
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(
            self,
            PerformerError::InvalidTask(_) | PerformerError::Configuration(_)
        )
    }

    pub fn to_error_report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind(),
            message: sanitize_error_message(&self.to_string()),
        }
    }
}

/// Redact credential-like fragments and cap the message length
fn sanitize_error_message(message: &str) -> String {
    let sanitized = SECRET_PATTERN.replace_all(message, "${1}=***");
    let mut sanitized = BEARER_PATTERN
        .replace_all(&sanitized, "Bearer ***")
        .to_string();

    if sanitized.len() > MAX_REPORT_MESSAGE_LEN {
        let truncate_suffix = "...[truncated]";
        let mut end = MAX_REPORT_MESSAGE_LEN - truncate_suffix.len();
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized.truncate(end);
        sanitized.push_str(truncate_suffix);
    }

    sanitized
}

/// Result type for pipeline operations
pub type PerformerResult<T> = Result<T, PerformerError>;
