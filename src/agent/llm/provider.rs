//! Reasoning-engine provider abstraction.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{CompletionResponse, Message};
use crate::agent::tools::ToolDescriptor;

/// Errors from a reasoning-engine backend.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited by the API")]
    RateLimited,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Tuning knobs for a completion request.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// A pluggable reasoning engine.
///
/// Given a conversation and the available tool catalog, the engine decides
/// whether to answer directly or request tool invocations. Implementations
/// must be stateless across calls; all context travels in `messages`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short backend name for logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Request one completion.
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDescriptor]>,
        options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError>;
}
