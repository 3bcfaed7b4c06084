//! Chat completion provider
//!
//! OpenAI-compatible `/chat/completions` client. The default endpoint is
//! the Mistral API, but any service speaking the same wire format works.
//!
//! # Features
//!
//! - Async HTTP communication with request timeout
//! - Every failure mapped onto the transient/permanent `CallError` taxonomy
//! - No internal retry: wrap calls in [`crate::RetryingCaller`]
//!
//! # Examples
//!
//! ```no_run
//! use covenant_llm::ChatApiProvider;
//!
//! # fn main() -> Result<(), covenant_domain::CallError> {
//! let provider = ChatApiProvider::new(
//!     "https://api.mistral.ai/v1",
//!     "mistral-small-latest",
//!     "sk-...",
//! )?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use covenant_domain::{CallError, GenerationProvider, Prompt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.mistral.ai/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "mistral-small-latest";

/// Default request timeout (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Chat completion client for an OpenAI-compatible API
pub struct ChatApiProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl ChatApiProvider {
    /// Create a provider against the given endpoint and model.
    ///
    /// Fails when the HTTP client cannot be constructed, typically because
    /// no TLS backend is available.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CallError> {
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client: build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    /// Create a provider against the default endpoint
    pub fn default_endpoint(
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CallError> {
        Self::new(DEFAULT_ENDPOINT, model, api_key)
    }

    /// Replace the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, CallError> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    /// The configured model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationProvider for ChatApiProvider {
    async fn generate(
        &self,
        prompt: &Prompt,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CallError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CallError::InvalidResponse(format!("body parse failed: {e}")))?;

        match parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
        {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(CallError::InvalidResponse(
                "completion contained no content".to_string(),
            )),
        }
    }
}

/// Build the HTTP client shared by the provider constructors
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, CallError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CallError::InvalidRequest(format!("http client construction: {e}")))
}

/// Map a transport-level failure onto the error taxonomy
pub(crate) fn classify_transport(error: reqwest::Error) -> CallError {
    if error.is_timeout() {
        CallError::Timeout
    } else {
        // Connection resets and DNS hiccups behave like server outages
        CallError::ServerError(format!("request failed: {error}"))
    }
}

/// Map an HTTP error status onto the error taxonomy
pub(crate) fn classify_status(status: StatusCode, body: &str) -> CallError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CallError::RateLimited,
        StatusCode::REQUEST_TIMEOUT => CallError::Timeout,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CallError::Auth(format!("HTTP {status}"))
        }
        s if s.is_server_error() => CallError::ServerError(format!("HTTP {status}: {body}")),
        _ => CallError::InvalidRequest(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_creation() {
        let provider =
            ChatApiProvider::new("https://api.mistral.ai/v1", "mistral-small-latest", "key")
                .unwrap();
        assert_eq!(provider.endpoint, "https://api.mistral.ai/v1");
        assert_eq!(provider.model(), "mistral-small-latest");

        let provider = ChatApiProvider::default_endpoint("mistral-small-latest", "key")
            .unwrap()
            .with_timeout(Duration::from_secs(5))
            .unwrap();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            CallError::RateLimited
        ));
        assert!(matches!(
            classify_status(StatusCode::REQUEST_TIMEOUT, ""),
            CallError::Timeout
        ));
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            CallError::Auth(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "upstream down"),
            CallError::ServerError(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::UNPROCESSABLE_ENTITY, "bad field"),
            CallError::InvalidRequest(_)
        ));
    }

    #[test]
    fn test_transient_statuses_retry_and_permanent_do_not() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(!classify_status(StatusCode::BAD_REQUEST, "").is_transient());
        assert!(!classify_status(StatusCode::FORBIDDEN, "").is_transient());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_maps_to_transient() {
        let provider = ChatApiProvider::new("http://127.0.0.1:1", "m", "k")
            .unwrap()
            .with_timeout(Duration::from_millis(200))
            .unwrap();
        let prompt = Prompt::new("s", "u");

        let result = provider.generate(&prompt, 0.0, 16).await;
        match result {
            Err(e) => assert!(e.is_transient(), "expected transient, got {e}"),
            Ok(_) => panic!("expected connection failure"),
        }
    }
}
