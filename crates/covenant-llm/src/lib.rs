//! Covenant Provider Layer
//!
//! Generation and embedding capability implementations, plus the generic
//! retry wrapper used around every external call.
//!
//! # Architecture
//!
//! This crate implements the `GenerationProvider` and `EmbeddingProvider`
//! traits from `covenant-domain` against an OpenAI-compatible HTTP API.
//! Providers classify every failure into the transient/permanent taxonomy
//! and never retry internally - retries belong exclusively to
//! [`RetryingCaller`].
//!
//! # Providers
//!
//! - `MockProvider`: deterministic scripted provider for testing
//! - `ChatApiProvider`: `/chat/completions` client (Mistral-compatible)
//! - `EmbeddingApiProvider`: `/embeddings` client
//!
//! # Examples
//!
//! ```
//! use covenant_llm::MockProvider;
//! use covenant_domain::{GenerationProvider, Prompt};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("Hello from the model");
//! let prompt = Prompt::new("system", "user");
//! let result = provider.generate(&prompt, 0.0, 64).await.unwrap();
//! assert_eq!(result, "Hello from the model");
//! # });
//! ```

#![warn(missing_docs)]

pub mod chat;
pub mod embeddings;
pub mod retry;

use async_trait::async_trait;
use covenant_domain::{CallError, GenerationProvider, Prompt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub use chat::ChatApiProvider;
pub use embeddings::EmbeddingApiProvider;
pub use retry::{RetryPolicy, RetryingCaller};

/// Mock generation provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// Responses can be keyed on a substring of the user prompt, and a queue of
/// scripted errors is consumed before any response is returned, which makes
/// retry behavior observable in tests.
///
/// # Examples
///
/// ```
/// use covenant_llm::MockProvider;
/// use covenant_domain::{CallError, GenerationProvider, Prompt};
///
/// # tokio_test::block_on(async {
/// let provider = MockProvider::new("default");
/// provider.add_response("termination", "NOT_FOUND");
/// provider.push_error(CallError::RateLimited);
///
/// let prompt = Prompt::new("sys", "extract the termination clause");
/// assert!(provider.generate(&prompt, 0.0, 64).await.is_err());
/// assert_eq!(provider.generate(&prompt, 0.0, 64).await.unwrap(), "NOT_FOUND");
/// assert_eq!(provider.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, String)>>>,
    scripted_errors: Arc<Mutex<VecDeque<CallError>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockProvider {
    /// Create a mock with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            scripted_errors: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Add a response returned whenever the user prompt contains `key`.
    /// Keys are checked in insertion order.
    pub fn add_response(&self, key: impl Into<String>, response: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push((key.into(), response.into()));
    }

    /// Queue an error to be returned before any response. Each queued error
    /// is consumed by exactly one call.
    pub fn push_error(&self, error: CallError) {
        self.scripted_errors.lock().unwrap().push_back(error);
    }

    /// Number of times `generate` was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    async fn generate(
        &self,
        prompt: &Prompt,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, CallError> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(error) = self.scripted_errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if prompt.user.contains(key.as_str()) {
                return Ok(response.clone());
            }
        }

        Ok(self.default_response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(user: &str) -> Prompt {
        Prompt::new("system", user)
    }

    #[tokio::test]
    async fn test_mock_default_response() {
        let provider = MockProvider::new("Test response");
        let result = provider.generate(&prompt("anything"), 0.0, 16).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_keyed_responses() {
        let provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(
            provider.generate(&prompt("say hello"), 0.0, 16).await.unwrap(),
            "world"
        );
        assert_eq!(
            provider.generate(&prompt("foo fighters"), 0.0, 16).await.unwrap(),
            "bar"
        );
        assert_eq!(
            provider.generate(&prompt("unknown"), 0.0, 16).await.unwrap(),
            "Default mock response"
        );
    }

    #[tokio::test]
    async fn test_mock_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.generate(&prompt("one"), 0.0, 16).await.unwrap();
        provider.generate(&prompt("two"), 0.0, 16).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_scripted_errors_consumed_in_order() {
        let provider = MockProvider::new("ok");
        provider.push_error(CallError::RateLimited);
        provider.push_error(CallError::Auth("bad key".to_string()));

        assert!(matches!(
            provider.generate(&prompt("x"), 0.0, 16).await,
            Err(CallError::RateLimited)
        ));
        assert!(matches!(
            provider.generate(&prompt("x"), 0.0, 16).await,
            Err(CallError::Auth(_))
        ));
        assert_eq!(provider.generate(&prompt("x"), 0.0, 16).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.generate(&prompt("x"), 0.0, 16).await.unwrap();
        assert_eq!(provider2.call_count(), 1);
    }
}
