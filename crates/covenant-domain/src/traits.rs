//! Trait definitions for external capabilities
//!
//! These traits define the boundaries between the pipeline and the services
//! it orchestrates. Implementations live in the infrastructure crates
//! (covenant-llm, covenant-index) and in tests.

use crate::error::CallError;
use async_trait::async_trait;
use thiserror::Error;

/// A prompt to the generation capability: a system role framing plus the
/// user message carrying the text to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// System role content
    pub system: String,

    /// User role content
    pub user: String,
}

impl Prompt {
    /// Create a prompt from system and user content
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Total prompt length in bytes, across both roles
    pub fn len(&self) -> usize {
        self.system.len() + self.user.len()
    }

    /// Whether both parts are empty
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.user.is_empty()
    }
}

/// Text generation capability.
///
/// Implemented by the infrastructure layer (covenant-llm). All suspension
/// points in the pipeline are at this boundary or the embedding boundary;
/// local transforms never suspend.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(
        &self,
        prompt: &Prompt,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CallError>;
}

/// Text embedding capability.
///
/// Produces vectors of a fixed dimension; the dimension is a property of the
/// configured model, not of individual calls.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed the text into a vector of `dimension()` floats
    async fn embed(&self, text: &str) -> Result<Vec<f32>, CallError>;

    /// The fixed embedding dimension
    fn dimension(&self) -> usize;
}

/// Failure of a single extraction method.
///
/// A method failure excludes that method from candidate selection; it is
/// never fatal on its own.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct MethodError(pub String);

impl MethodError {
    /// Create a method error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One way of rendering raw document bytes as text.
///
/// Methods are pluggable: the selector runs every configured method and
/// scores the outputs. Adding a method means adding one implementation,
/// never branching on method names.
pub trait ExtractionMethod: Send + Sync {
    /// Stable method name, used in logs and tie-breaking order
    fn name(&self) -> &str;

    /// Attempt to render the raw bytes as text
    fn try_extract(&self, raw: &[u8]) -> Result<String, MethodError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_len() {
        let prompt = Prompt::new("system", "user text");
        assert_eq!(prompt.len(), 6 + 9);
        assert!(!prompt.is_empty());
        assert!(Prompt::new("", "").is_empty());
    }
}
