//! Observability for the performer pipeline
//!
//! Structured logging only: the pipeline keeps no shared counters, so every
//! signal is a `tracing` event or span.

pub mod logging;

// Re-export for convenience
pub use logging::{init_default_logging, init_logging, LogFormat};

// Span macros for structured logging
pub use logging::{dispatch_span, task_span};
