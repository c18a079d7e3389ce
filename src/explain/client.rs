//! `TextGenerator`: the seam to the remote text-generation service.
//!
//! The explainer only needs "prompt in, text out". Gemini is the production
//! backend; tests plug in canned generators.

use anyhow::Result;
use async_trait::async_trait;

/// A remote service that completes a single prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Request one free-text completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Human-readable description of the backend, e.g. `"gemini (gemini-2.0-flash-exp)"`.
    fn description(&self) -> String;
}
