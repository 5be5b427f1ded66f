//! Intake validation
//!
//! Screens a [`Task`] before any side-effecting work happens. Checks run from
//! cheapest to most expensive and the first failure is the only one reported:
//!
//! 1. identifier non-empty
//! 2. payload non-empty
//! 3. payload within the size ceiling
//! 4. valid UTF-8, unless the payload embeds a null byte
//! 5. payload not blank after trimming
//! 6. prompt passes the [`ContentScreen`]
//! 7. computation credential and HTTPS endpoint are configured
//!
//! The validator holds no mutable state, so validating the same task twice
//! yields the same outcome.

pub mod screen;

use crate::config::{ComputationEnv, ConfigurationError};
use crate::task::{AcceptedTask, Task, ValidationOutcome};
use std::borrow::Cow;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub use screen::{ContentScreen, DenylistScreen, DEFAULT_DENYLIST};

/// Structural or content rejection of an inbound task
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskRejection {
    #[error("task ID cannot be empty")]
    EmptyIdentifier,
    #[error("task payload cannot be empty")]
    EmptyPayload,
    #[error("task payload size {actual} exceeds maximum allowed size {max}")]
    PayloadTooLarge { actual: usize, max: usize },
    #[error("task payload contains invalid UTF-8 characters")]
    InvalidEncoding,
    #[error("task prompt cannot be empty or whitespace only")]
    BlankPayload,
    #[error("task payload contains potentially malicious content: {pattern}")]
    MaliciousPattern { pattern: String },
}

impl TaskRejection {
    /// The fragment of the payload that triggered the rejection, if any
    pub fn offending_fragment(&self) -> Option<&str> {
        match self {
            TaskRejection::MaliciousPattern { pattern } => Some(pattern),
            _ => None,
        }
    }
}

/// Any reason the intake validator refuses a task
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeRejection {
    #[error(transparent)]
    Task(#[from] TaskRejection),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

pub type IntakeOutcome<'a> = ValidationOutcome<AcceptedTask<'a>, IntakeRejection>;

/// First pipeline stage
#[derive(Clone)]
pub struct IntakeValidator {
    max_payload_bytes: usize,
    screen: Arc<dyn ContentScreen>,
    env: ComputationEnv,
}

impl IntakeValidator {
    pub fn new(max_payload_bytes: usize, screen: Arc<dyn ContentScreen>, env: ComputationEnv) -> Self {
        Self {
            max_payload_bytes,
            screen,
            env,
        }
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Name of the content screen in use
    pub fn screen_name(&self) -> &str {
        self.screen.name()
    }

    /// Validate a task, borrowing it into an [`AcceptedTask`] on success
    pub fn validate<'a>(&self, task: &'a Task) -> IntakeOutcome<'a> {
        info!(
            task_id = %task.id_lossy(),
            payload_size = task.payload.len(),
            "Validating task"
        );

        match self.check(task) {
            Ok(accepted) => {
                info!(
                    task_id = %task.id_lossy(),
                    payload_size = task.payload.len(),
                    "Task validation passed"
                );
                ValidationOutcome::Accepted(accepted)
            }
            Err(rejection) => {
                warn!(
                    task_id = %task.id_lossy(),
                    reason = %rejection,
                    screen = self.screen.name(),
                    "Task validation failed"
                );
                ValidationOutcome::Rejected(rejection)
            }
        }
    }

    fn check<'a>(&self, task: &'a Task) -> Result<AcceptedTask<'a>, IntakeRejection> {
        if task.id.is_empty() {
            return Err(TaskRejection::EmptyIdentifier.into());
        }

        if task.payload.is_empty() {
            return Err(TaskRejection::EmptyPayload.into());
        }

        if task.payload.len() > self.max_payload_bytes {
            return Err(TaskRejection::PayloadTooLarge {
                actual: task.payload.len(),
                max: self.max_payload_bytes,
            }
            .into());
        }

        let prompt = decode_prompt(task)?;

        if prompt.trim().is_empty() {
            return Err(TaskRejection::BlankPayload.into());
        }

        if let Some(pattern) = self.screen.find_match(&prompt) {
            return Err(TaskRejection::MaliciousPattern {
                pattern: pattern.to_string(),
            }
            .into());
        }

        self.env.verify()?;

        Ok(AcceptedTask::new(task, prompt))
    }
}

/// Decode the payload as prompt text.
///
/// Payloads with an embedded null byte skip UTF-8 validation and are decoded
/// lossily.
fn decode_prompt(task: &Task) -> Result<Cow<'_, str>, TaskRejection> {
    if task.has_null_byte() {
        return Ok(String::from_utf8_lossy(&task.payload));
    }

    std::str::from_utf8(&task.payload)
        .map(Cow::Borrowed)
        .map_err(|_| TaskRejection::InvalidEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComputationSection;

    fn validator() -> IntakeValidator {
        let env = ComputationEnv::new(
            &ComputationSection::default(),
            Some("test-key".to_string()),
            Some("https://example.openai.azure.com/chat".to_string()),
        );
        IntakeValidator::new(16, Arc::new(DenylistScreen::default()), env)
    }

    fn rejection(task: &Task) -> IntakeRejection {
        match validator().validate(task) {
            ValidationOutcome::Rejected(reason) => reason,
            ValidationOutcome::Accepted(_) => panic!("expected rejection"),
        }
    }

    #[test]
    fn test_accepts_plain_prompt() {
        let task = Task::new("t", "Is 2+2=4?");
        let outcome = validator().validate(&task);
        let accepted = outcome.into_result().unwrap();
        assert_eq!(accepted.prompt(), "Is 2+2=4?");
        assert_eq!(accepted.task(), &task);
    }

    #[test]
    fn test_empty_identifier_checked_before_payload() {
        let task = Task::new("", "");
        assert_eq!(
            rejection(&task),
            IntakeRejection::Task(TaskRejection::EmptyIdentifier)
        );
    }

    #[test]
    fn test_size_checked_before_encoding() {
        let task = Task::new("t", vec![0xff; 17]);
        assert_eq!(
            rejection(&task),
            IntakeRejection::Task(TaskRejection::PayloadTooLarge {
                actual: 17,
                max: 16
            })
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let task = Task::new("t", vec![b'h', 0xc3, 0x28]);
        assert_eq!(
            rejection(&task),
            IntakeRejection::Task(TaskRejection::InvalidEncoding)
        );
    }

    #[test]
    fn test_null_byte_payload_skips_utf8_check() {
        let task = Task::new("t", vec![b'h', 0, 0xff, b'i']);
        let accepted = validator().validate(&task).into_result().unwrap();
        assert!(accepted.prompt().contains('\u{fffd}'));
    }

    #[test]
    fn test_screen_runs_before_configuration_check() {
        let env = ComputationEnv::new(&ComputationSection::default(), None, None);
        let validator = IntakeValidator::new(64, Arc::new(DenylistScreen::default()), env);
        let task = Task::new("t", "exec(ls)");

        let outcome = validator.validate(&task);
        assert_eq!(
            outcome.rejection(),
            Some(&IntakeRejection::Task(TaskRejection::MaliciousPattern {
                pattern: "exec(".to_string()
            }))
        );
    }

    #[test]
    fn test_offending_fragment_only_for_patterns() {
        let malicious = TaskRejection::MaliciousPattern {
            pattern: "eval(".to_string(),
        };
        assert_eq!(malicious.offending_fragment(), Some("eval("));
        assert_eq!(TaskRejection::BlankPayload.offending_fragment(), None);
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            TaskRejection::PayloadTooLarge {
                actual: 5000,
                max: 4096
            }
            .to_string(),
            "task payload size 5000 exceeds maximum allowed size 4096"
        );
        assert_eq!(
            TaskRejection::MaliciousPattern {
                pattern: "<script>".to_string()
            }
            .to_string(),
            "task payload contains potentially malicious content: <script>"
        );
    }
}
