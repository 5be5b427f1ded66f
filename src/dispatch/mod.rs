//! Outbound computation dispatch
//!
//! A [`Dispatcher`] performs exactly one call to the external computation for
//! an accepted task and returns the serialized result mapping as raw bytes.
//! It never retries; retry policy belongs to whoever invokes the pipeline.

pub mod azure;

use crate::task::{AcceptedTask, ComputationResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

pub use azure::AzureOpenAiDispatcher;

/// Substring whose presence in the output marks it as verified
pub const VERIFICATION_MARKER: &str = "valid";

/// Dispatcher seam for dependency injection and testing
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Dispatcher name used in logs (e.g. "azure-openai")
    fn name(&self) -> &str;

    /// Run the computation for one accepted task
    async fn dispatch(&self, task: &AcceptedTask<'_>) -> Result<Bytes, DispatchError>;
}

/// Reasons the computation call did not produce output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("computation call timed out after {after:?}")]
    Timeout { after: Duration },
    #[error("failed to connect to computation endpoint: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("computation endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed computation response: {0}")]
    MalformedResponse(String),
    #[error("failed to encode computation request or result: {0}")]
    Encode(String),
}

impl DispatchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::Timeout { .. })
    }
}

/// Placeholder verification heuristic carried over from the first performer
/// release: output is verified when it is non-empty and mentions
/// [`VERIFICATION_MARKER`]. Note that "invalid" also matches.
pub fn is_verified(llm_output: &str) -> bool {
    !llm_output.is_empty() && llm_output.contains(VERIFICATION_MARKER)
}

/// Build the serialized result mapping from raw model output
pub fn build_result(llm_output: String) -> Result<Bytes, DispatchError> {
    let verified = is_verified(&llm_output);
    ComputationResult::new(llm_output, verified)
        .to_bytes()
        .map(Bytes::from)
        .map_err(|e| DispatchError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_heuristic() {
        assert!(is_verified("this is valid"));
        assert!(is_verified("invalid")); // substring match, kept as-is
        assert!(!is_verified("yes, 2+2=4"));
        assert!(!is_verified(""));
    }

    #[test]
    fn test_build_result_serializes_both_fields() {
        let bytes = build_result("valid answer".to_string()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["llm_output"], "valid answer");
        assert_eq!(value["verified"], true);
    }

    #[test]
    fn test_build_result_keeps_empty_output_for_result_validation() {
        let bytes = build_result(String::new()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["llm_output"], "");
        assert_eq!(value["verified"], false);
    }

    #[test]
    fn test_dispatch_error_display() {
        let error = DispatchError::Status {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "computation endpoint returned HTTP 503: busy"
        );
        assert!(DispatchError::Timeout {
            after: Duration::from_secs(10)
        }
        .is_timeout());
        assert!(!DispatchError::Connect("refused".to_string()).is_timeout());
    }
}
