//! Tests for logging configuration and format parsing
//!
//! Tests the pure functions in the logging module that handle log format,
//! level and verbosity parsing.

use llm_performer::observability::logging::{level_for_verbosity, parse_level, LogFormat};
use llm_performer::observability::{init_logging, task_span};
use tracing::Level;

#[test]
fn test_log_format_parse_json() {
    assert!(matches!(LogFormat::parse("json"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("JSON"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("Json"), LogFormat::Json));
}

#[test]
fn test_log_format_parse_pretty() {
    assert!(matches!(LogFormat::parse("pretty"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("PRETTY"), LogFormat::Pretty));
}

#[test]
fn test_log_format_parse_compact() {
    assert!(matches!(LogFormat::parse("compact"), LogFormat::Compact));
    assert!(matches!(LogFormat::parse("Compact"), LogFormat::Compact));
}

#[test]
fn test_log_format_parse_invalid_defaults_to_json() {
    assert!(matches!(LogFormat::parse("xml"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("yaml"), LogFormat::Json));
    assert!(matches!(LogFormat::parse("123"), LogFormat::Json));
}

#[test]
fn test_log_format_parse_whitespace() {
    assert!(matches!(LogFormat::parse("  json  "), LogFormat::Json));
    assert!(matches!(LogFormat::parse("pretty\n"), LogFormat::Pretty));
    assert!(matches!(LogFormat::parse("\tcompact"), LogFormat::Compact));
}

#[test]
fn test_log_level_parsing() {
    assert_eq!(parse_level("error"), Level::ERROR);
    assert_eq!(parse_level("WARN"), Level::WARN);
    assert_eq!(parse_level("debug"), Level::DEBUG);
    assert_eq!(parse_level("verbose"), Level::INFO);
}

#[test]
fn test_verbosity_overrides_level() {
    assert_eq!(level_for_verbosity(0), None);
    assert_eq!(level_for_verbosity(1), Some(Level::DEBUG));
    assert_eq!(level_for_verbosity(2), Some(Level::TRACE));
}

#[test]
fn test_repeated_initialization_is_harmless() {
    init_logging(Level::INFO, LogFormat::Compact, false);
    init_logging(Level::DEBUG, LogFormat::Json, true);

    let span = task_span!(task_id = "task-1");
    let _guard = span.enter();
    tracing::info!("logging after double init");
}
