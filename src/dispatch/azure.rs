//! Azure OpenAI chat-completions dispatcher
//!
//! Posts the prompt as a single user message to the configured endpoint,
//! which already names the deployment and API version, and extracts
//! `choices[0].message.content` as the model output.

use crate::config::DispatchConfig;
use crate::dispatch::{build_result, DispatchError, Dispatcher};
use crate::dispatch_span;
use crate::task::AcceptedTask;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, Instrument};

/// Longest error body kept in a [`DispatchError::Status`]
const MAX_ERROR_BODY_LEN: usize = 512;

/// HTTPS dispatcher for Azure OpenAI deployments
pub struct AzureOpenAiDispatcher {
    config: DispatchConfig,
    client: Client,
}

impl AzureOpenAiDispatcher {
    /// Create a dispatcher whose client enforces the configured timeout
    ///
    /// Redirects are not followed: a 3xx answer is reported as
    /// [`DispatchError::Status`] and the credential never leaves the
    /// configured endpoint.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Build the chat-completions request body (pure function)
    fn build_request<'a>(&self, prompt: &'a str) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Extract the primary output field from a response body (pure function)
    fn extract_output(body: &[u8]) -> Result<String, DispatchError> {
        let response: ChatCompletionResponse = serde_json::from_slice(body)
            .map_err(|e| DispatchError::MalformedResponse(e.to_string()))?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }

    /// Map a reqwest failure onto a dispatch error kind (pure function)
    fn classify_error(&self, e: &reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout {
                after: self.config.timeout,
            }
        } else if e.is_connect() {
            DispatchError::Connect(e.to_string())
        } else {
            DispatchError::Transport(e.to_string())
        }
    }

    /// Single outbound request (impure I/O)
    async fn send(&self, request: &ChatCompletionRequest<'_>) -> Result<Bytes, DispatchError> {
        let response = self
            .client
            .post(self.config.endpoint.clone())
            .header("Content-Type", "application/json")
            .header("api-key", &self.config.credential)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify_error(&e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify_error(&e))?;

        if !status.is_success() {
            let body = truncate(&String::from_utf8_lossy(&body), MAX_ERROR_BODY_LEN);
            debug!(status = status.as_u16(), "Computation endpoint returned an error status");
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl Dispatcher for AzureOpenAiDispatcher {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn dispatch(&self, task: &AcceptedTask<'_>) -> Result<Bytes, DispatchError> {
        let span = dispatch_span!(
            task_id = %task.task().id_lossy(),
            dispatcher = self.name()
        );

        async {
            let request = self.build_request(task.prompt());
            debug!(
                prompt_len = task.prompt().len(),
                max_tokens = request.max_tokens,
                temperature = request.temperature,
                "Dispatching task to computation endpoint"
            );

            let started = Instant::now();
            let body = self.send(&request).await?;
            let llm_output = Self::extract_output(&body)?;
            debug!(
                elapsed_ms = elapsed_ms(started),
                output_len = llm_output.len(),
                "Computation call completed"
            );

            build_result(llm_output)
        }
        .instrument(span)
        .await
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Truncate on a char boundary
fn truncate(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut end = max_len;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &text[..end])
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
