//! Shartnoma LLM Provider Layer
//!
//! Pluggable generative model backends for the legal review stage.
//!
//! # Architecture
//!
//! This crate provides implementations of the `LlmProvider` trait from
//! `shartnoma-domain`. Every provider speaks the same async interface; the
//! orchestrator owns timeouts and retries around it.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//! - `OpenAiProvider`: OpenAI-compatible chat completions API
//! - `FallbackProvider`: Primary provider with a secondary on failure
//!
//! # Examples
//!
//! ```
//! use shartnoma_llm::MockProvider;
//! use shartnoma_domain::traits::LlmProvider;
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("[]");
//! let result = provider.generate("test prompt").await.unwrap();
//! assert_eq!(result, "[]");
//! # });
//! ```

#![warn(missing_docs)]

pub mod fallback;
pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use shartnoma_domain::traits::LlmProvider as LlmProviderTrait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use fallback::FallbackProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Request took too long
    #[error("Request timed out")]
    Timeout,

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether the same request may succeed when retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::RateLimitExceeded | LlmError::Timeout
        )
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error(LlmError),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without any network calls. Responses are
/// keyed by a fragment that must occur in the prompt, so tests can target one
/// section of a document without rebuilding the whole prompt.
///
/// # Examples
///
/// ```
/// use shartnoma_llm::MockProvider;
/// use shartnoma_domain::traits::LlmProvider;
///
/// # tokio_test::block_on(async {
/// let mut provider = MockProvider::default();
/// provider.add_response("JAVOBGARLIK", "[]");
/// assert_eq!(provider.generate("... JAVOBGARLIK ...").await.unwrap(), "[]");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<Mutex<usize>>,
    transient_failures: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            transient_failures: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Answer prompts containing `fragment` with `response`
    pub fn add_response(&mut self, fragment: impl Into<String>, response: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((fragment.into(), MockReply::Text(response.into())));
        }
    }

    /// Configure a permanent error for prompts containing `fragment`
    pub fn add_error(&mut self, fragment: impl Into<String>) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push((
                fragment.into(),
                MockReply::Error(LlmError::ModelNotAvailable("mock".to_string())),
            ));
        }
    }

    /// Fail the next `count` calls with a transient communication error
    pub fn fail_next(&self, count: usize) {
        if let Ok(mut failures) = self.transient_failures.lock() {
            *failures = count;
        }
    }

    /// Sleep before answering (to exercise timeouts)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times the provider was called
    pub fn call_count(&self) -> usize {
        self.call_count.lock().map(|c| *c).unwrap_or(0)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        if let Ok(mut count) = self.call_count.lock() {
            *count = 0;
        }
    }

    fn reply_for(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut count) = self.call_count.lock() {
            *count += 1;
        }

        if let Ok(mut failures) = self.transient_failures.lock() {
            if *failures > 0 {
                *failures -= 1;
                return Err(LlmError::Communication("Mock transient failure".to_string()));
            }
        }

        let responses = self
            .responses
            .lock()
            .map_err(|e| LlmError::Other(format!("Mock lock poisoned: {}", e)))?;
        for (fragment, reply) in responses.iter() {
            if prompt.contains(fragment.as_str()) {
                return match reply {
                    MockReply::Text(text) => Ok(text.clone()),
                    MockReply::Error(err) => Err(err.clone()),
                };
            }
        }

        Ok(self.default_response.clone())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply_for(prompt)
    }

    async fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt).await
    }

    fn is_retryable(&self, error: &Self::Error) -> bool {
        error.is_transient()
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
