//! Mock implementations for testing
//!
//! Provides a mock [`Dispatcher`] so pipeline behavior can be tested without
//! a live computation endpoint.

use crate::dispatch::{is_verified, DispatchError, Dispatcher};
use crate::task::AcceptedTask;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(Bytes),
    Fail(DispatchError),
}

/// Mock dispatcher that records every call
///
/// Clones share the call counter and prompt history, so a test can hand one
/// clone to the pipeline and inspect the other.
#[derive(Debug, Clone)]
pub struct MockDispatcher {
    behavior: MockBehavior,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockDispatcher {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with a well-formed result mapping built from `llm_output`
    pub fn with_output(llm_output: &str) -> Self {
        let body = json!({
            "llm_output": llm_output,
            "verified": is_verified(llm_output),
        });
        Self::with_raw(serde_json::to_vec(&body).unwrap_or_default())
    }

    /// Respond with arbitrary bytes, bypassing result construction
    pub fn with_raw(raw: impl Into<Bytes>) -> Self {
        Self::with_behavior(MockBehavior::Respond(raw.into()))
    }

    pub fn with_failure(error: DispatchError) -> Self {
        Self::with_behavior(MockBehavior::Fail(error))
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Dispatcher for MockDispatcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn dispatch(&self, task: &AcceptedTask<'_>) -> Result<Bytes, DispatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(task.prompt().to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            MockBehavior::Respond(raw) => Ok(raw.clone()),
            MockBehavior::Fail(error) => Err(error.clone()),
        }
    }
}
