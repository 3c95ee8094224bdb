//! Text generation trait and implementations
//!
//! The generator powers the LLM-backed paths of the pipeline: intent
//! classification and reply generation. Both stages degrade gracefully
//! when no generator is configured.

use crate::Result;
use async_trait::async_trait;

pub mod gemini;
pub use gemini::GeminiGenerator;

/// Trait for free-form text generation (LLM controlled)
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for a prompt, optionally pinned by a
    /// system instruction (used to lock the response language)
    async fn generate(&self, prompt: &str, system_instruction: Option<&str>) -> Result<String>;
}

/// Mock generator for development & testing
/// Keeps the assistant functional without LLM dependency
pub struct MockGenerator {
    reply: String,
    fail: bool,
}

impl MockGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail: false,
        }
    }

    /// A generator whose every call fails, for exercising fallback paths
    pub fn failing() -> Self {
        Self {
            reply: String::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, _prompt: &str, _system_instruction: Option<&str>) -> Result<String> {
        if self.fail {
            return Err(crate::error::AssistantError::GenerationError(
                "mock generator configured to fail".to_string(),
            ));
        }
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_generator_returns_canned_reply() {
        let generator = MockGenerator::new("canned reply");
        let reply = generator.generate("anything", None).await.unwrap();
        assert_eq!(reply, "canned reply");
    }

    #[tokio::test]
    async fn test_failing_mock_generator_errors() {
        let generator = MockGenerator::failing();
        assert!(generator.generate("anything", None).await.is_err());
    }
}
