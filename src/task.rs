//! Task, result and response types shared by every pipeline stage
//!
//! A [`Task`] arrives from the serving layer, is screened by the intake
//! validator into an [`AcceptedTask`], dispatched, and its output is parsed by
//! the result validator into a [`ComputationResult`]. A [`TaskResponse`] pairs
//! the caller's identifier with the serialized result.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Result field holding the model output text
pub const LLM_OUTPUT_FIELD: &str = "llm_output";

/// Result field holding the verification verdict
pub const VERIFIED_FIELD: &str = "verified";

/// An immutable unit of work submitted by the upstream distributor
///
/// The identifier is caller-assigned and never generated or rewritten here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: Bytes,
    pub payload: Bytes,
}

impl Task {
    pub fn new(id: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            id: id.into(),
            payload: payload.into(),
        }
    }

    /// Identifier rendered for logs and error reports
    pub fn id_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.id)
    }

    /// Whether the payload carries an embedded null byte
    pub fn has_null_byte(&self) -> bool {
        self.payload.contains(&0)
    }
}

/// A task that passed intake validation
///
/// Only the intake validator constructs this value, so holding one proves the
/// task was screened. The task is borrowed read-only for the rest of the
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedTask<'a> {
    task: &'a Task,
    prompt: Cow<'a, str>,
}

impl<'a> AcceptedTask<'a> {
    pub(crate) fn new(task: &'a Task, prompt: Cow<'a, str>) -> Self {
        Self { task, prompt }
    }

    pub fn task(&self) -> &'a Task {
        self.task
    }

    /// Decoded payload text sent to the computation as the prompt
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

/// Outcome of a validation stage
///
/// `Accepted` carries the validated value, `Rejected` the typed reason.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<T, R> {
    Accepted(T),
    Rejected(R),
}

impl<T, R> ValidationOutcome<T, R> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    pub fn rejection(&self) -> Option<&R> {
        match self {
            ValidationOutcome::Accepted(_) => None,
            ValidationOutcome::Rejected(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<T, R> {
        match self {
            ValidationOutcome::Accepted(value) => Ok(value),
            ValidationOutcome::Rejected(reason) => Err(reason),
        }
    }
}

impl<T, R> From<Result<T, R>> for ValidationOutcome<T, R> {
    fn from(result: Result<T, R>) -> Self {
        match result {
            Ok(value) => ValidationOutcome::Accepted(value),
            Err(reason) => ValidationOutcome::Rejected(reason),
        }
    }
}

/// Validated output of the downstream computation
///
/// Unknown keys are kept in `extra` so a round-trip does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationResult {
    pub llm_output: String,
    pub verified: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComputationResult {
    pub fn new(llm_output: impl Into<String>, verified: bool) -> Self {
        Self {
            llm_output: llm_output.into(),
            verified,
            extra: Map::new(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Response returned to the serving layer for a successfully handled task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskResponse {
    pub task_id: Bytes,
    pub result: Bytes,
}

impl TaskResponse {
    pub fn task_id_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.task_id)
    }

    pub fn result_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.result)
    }
}
