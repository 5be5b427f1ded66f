//! Result validation tests
//!
//! Raw computation output is either parsed into a `ComputationResult` with
//! every contract field intact or rejected with a typed reason. Nothing is
//! defaulted or coerced.

use llm_performer::task::{ComputationResult, ValidationOutcome};
use llm_performer::verification::{ResultRejection, ResultValidator};
use serde_json::{json, Value};

fn reject(bytes: &[u8]) -> ResultRejection {
    match ResultValidator::default().validate(bytes) {
        ValidationOutcome::Rejected(reason) => reason,
        ValidationOutcome::Accepted(result) => panic!("expected rejection, got {result:?}"),
    }
}

#[test]
fn test_well_formed_result_round_trips() {
    let raw = br#"{"llm_output":"this is valid","verified":true}"#;
    let result = ResultValidator::default()
        .validate(raw)
        .into_result()
        .unwrap();

    assert_eq!(result.llm_output, "this is valid");
    assert!(result.verified);
    assert!(result.extra.is_empty());

    let reserialized: Value = serde_json::from_slice(&result.to_bytes().unwrap()).unwrap();
    let original: Value = serde_json::from_slice(raw).unwrap();
    assert_eq!(reserialized, original);
}

#[test]
fn test_unverified_result_is_still_accepted() {
    let result = ResultValidator::default()
        .validate(br#"{"llm_output":"no idea","verified":false}"#)
        .into_result()
        .unwrap();
    assert_eq!(result, ComputationResult::new("no idea", false));
}

#[test]
fn test_missing_verified_is_rejected() {
    assert_eq!(
        reject(br#"{"llm_output":"this is valid"}"#),
        ResultRejection::MissingField("verified")
    );
}

#[test]
fn test_verified_as_string_is_rejected() {
    assert_eq!(
        reject(br#"{"llm_output":"this is valid","verified":"true"}"#),
        ResultRejection::VerifiedNotBoolean
    );
}

#[test]
fn test_non_string_output_is_rejected() {
    assert_eq!(
        reject(br#"{"llm_output":["a"],"verified":true}"#),
        ResultRejection::OutputNotText
    );
}

#[test]
fn test_additional_keys_are_preserved() {
    let raw = json!({
        "llm_output": "this is valid",
        "verified": true,
        "model": "gpt-4o",
        "usage": {"total_tokens": 12}
    });
    let result = ResultValidator::default()
        .validate(&serde_json::to_vec(&raw).unwrap())
        .into_result()
        .unwrap();

    assert_eq!(result.extra.len(), 2);
    assert_eq!(result.extra["model"], json!("gpt-4o"));

    let reserialized: Value = serde_json::from_slice(&result.to_bytes().unwrap()).unwrap();
    assert_eq!(reserialized, raw);
}

#[test]
fn test_result_at_size_limit_boundary() {
    let validator = ResultValidator::default();
    let overhead = br#"{"llm_output":"","verified":true}"#.len();

    let fits = format!(
        r#"{{"llm_output":"{}","verified":true}}"#,
        "a".repeat(8192 - overhead)
    );
    assert_eq!(fits.len(), 8192);
    assert!(validator.validate(fits.as_bytes()).is_accepted());

    let too_big = format!(
        r#"{{"llm_output":"{}","verified":true}}"#,
        "a".repeat(8193 - overhead)
    );
    assert_eq!(
        validator.validate(too_big.as_bytes()).into_result().unwrap_err(),
        ResultRejection::TooLarge {
            actual: 8193,
            max: 8192
        }
    );
}

#[test]
fn test_non_utf8_bytes_are_not_structured() {
    assert!(matches!(
        reject(&[0xff, 0xfe, 0x7b]),
        ResultRejection::NotStructured(_)
    ));
}

#[test]
fn test_validation_is_repeatable() {
    let validator = ResultValidator::default();
    let raw = br#"{"llm_output":"  ","verified":true}"#;
    assert_eq!(validator.validate(raw), validator.validate(raw));
    assert_eq!(reject(raw), ResultRejection::BlankOutput);
}
