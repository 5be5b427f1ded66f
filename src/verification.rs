//! Result validation
//!
//! Last check before a computation result is trusted. Raw bytes are only
//! turned into a [`ComputationResult`] after every check below passes; any
//! violation is a rejection, never a coercion or a default.
//!
//! 1. non-empty
//! 2. within the size ceiling
//! 3. parses as a JSON object
//! 4. `llm_output` and `verified` both present
//! 5. `llm_output` is a string with non-whitespace content
//! 6. `verified` is a JSON boolean

use crate::task::{ComputationResult, ValidationOutcome, LLM_OUTPUT_FIELD, VERIFIED_FIELD};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Contract violation in a computation result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultRejection {
    #[error("result cannot be empty")]
    Empty,
    #[error("result size {actual} exceeds maximum allowed size {max}")]
    TooLarge { actual: usize, max: usize },
    #[error("result is not valid JSON: {0}")]
    NotStructured(String),
    #[error("result missing required field: {0}")]
    MissingField(&'static str),
    #[error("llm_output field must be a string")]
    OutputNotText,
    #[error("llm_output cannot be empty or whitespace only")]
    BlankOutput,
    #[error("verified field must be a boolean")]
    VerifiedNotBoolean,
}

pub type ResultOutcome = ValidationOutcome<ComputationResult, ResultRejection>;

/// Final pipeline stage
#[derive(Debug, Clone, Copy)]
pub struct ResultValidator {
    max_result_bytes: usize,
}

impl ResultValidator {
    pub fn new(max_result_bytes: usize) -> Self {
        Self { max_result_bytes }
    }

    pub fn max_result_bytes(&self) -> usize {
        self.max_result_bytes
    }

    pub fn validate(&self, result_bytes: &[u8]) -> ResultOutcome {
        match self.check(result_bytes) {
            Ok(result) => {
                info!(result_size = result_bytes.len(), "Result validation passed");
                ValidationOutcome::Accepted(result)
            }
            Err(rejection) => {
                warn!(
                    result_size = result_bytes.len(),
                    reason = %rejection,
                    "Result validation failed"
                );
                ValidationOutcome::Rejected(rejection)
            }
        }
    }

    fn check(&self, result_bytes: &[u8]) -> Result<ComputationResult, ResultRejection> {
        if result_bytes.is_empty() {
            return Err(ResultRejection::Empty);
        }

        if result_bytes.len() > self.max_result_bytes {
            return Err(ResultRejection::TooLarge {
                actual: result_bytes.len(),
                max: self.max_result_bytes,
            });
        }

        let mut fields: Map<String, Value> = serde_json::from_slice(result_bytes)
            .map_err(|e| ResultRejection::NotStructured(e.to_string()))?;

        let llm_output = fields
            .remove(LLM_OUTPUT_FIELD)
            .ok_or(ResultRejection::MissingField(LLM_OUTPUT_FIELD))?;
        let verified = fields
            .remove(VERIFIED_FIELD)
            .ok_or(ResultRejection::MissingField(VERIFIED_FIELD))?;

        let llm_output = match llm_output {
            Value::String(text) => text,
            _ => return Err(ResultRejection::OutputNotText),
        };
        if llm_output.trim().is_empty() {
            return Err(ResultRejection::BlankOutput);
        }

        let verified = verified
            .as_bool()
            .ok_or(ResultRejection::VerifiedNotBoolean)?;

        Ok(ComputationResult {
            llm_output,
            verified,
            extra: fields,
        })
    }
}

impl Default for ResultValidator {
    fn default() -> Self {
        Self::new(8192)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reject(bytes: &[u8]) -> ResultRejection {
        ResultValidator::default()
            .validate(bytes)
            .into_result()
            .unwrap_err()
    }

    #[test]
    fn test_accepts_minimal_result() {
        let result = ResultValidator::default()
            .validate(br#"{"llm_output":"this is valid","verified":true}"#)
            .into_result()
            .unwrap();
        assert_eq!(result, ComputationResult::new("this is valid", true));
    }

    #[test]
    fn test_empty_checked_first() {
        assert_eq!(reject(b""), ResultRejection::Empty);
    }

    #[test]
    fn test_size_checked_before_parse() {
        let validator = ResultValidator::new(4);
        assert_eq!(
            validator.validate(b"not json").into_result().unwrap_err(),
            ResultRejection::TooLarge { actual: 8, max: 4 }
        );
    }

    #[test]
    fn test_non_object_json_is_not_structured() {
        assert!(matches!(reject(b"[1,2]"), ResultRejection::NotStructured(_)));
        assert!(matches!(reject(b"\"text\""), ResultRejection::NotStructured(_)));
        assert!(matches!(reject(b"{broken"), ResultRejection::NotStructured(_)));
    }

    #[test]
    fn test_missing_output_reported_before_missing_verified() {
        assert_eq!(
            reject(b"{}"),
            ResultRejection::MissingField("llm_output")
        );
        assert_eq!(
            reject(br#"{"llm_output":"ok"}"#),
            ResultRejection::MissingField("verified")
        );
    }

    #[test]
    fn test_presence_checked_before_types() {
        // llm_output has the wrong type but verified is missing: presence wins
        assert_eq!(
            reject(br#"{"llm_output":5}"#),
            ResultRejection::MissingField("verified")
        );
    }

    #[test]
    fn test_output_type_and_blankness() {
        assert_eq!(
            reject(br#"{"llm_output":null,"verified":true}"#),
            ResultRejection::OutputNotText
        );
        assert_eq!(
            reject(br#"{"llm_output":" \n\t","verified":true}"#),
            ResultRejection::BlankOutput
        );
    }

    #[test]
    fn test_verified_must_be_strict_boolean() {
        for verified in ["\"true\"", "1", "0", "null", "\"false\""] {
            let body = format!(r#"{{"llm_output":"ok","verified":{verified}}}"#);
            assert_eq!(
                reject(body.as_bytes()),
                ResultRejection::VerifiedNotBoolean,
                "verified = {verified}"
            );
        }
    }
}
