//! Per-request agent orchestration.
//!
//! One [`AgentOrchestrator`] is built at startup from the fixed system prompt
//! and the finalized tool registry, then shared read-only across concurrent
//! requests. Each `handle()` call drives the reasoning engine until it
//! produces an answer: the engine may request tool invocations, which are
//! resolved through the registry and executed against the owning provider,
//! with results threaded back into the conversation.
//!
//! Tool and engine failures never escape a request; they degrade to the
//! fixed refusal or failure answer so callers always get well-formed text.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::llm::{CompletionOptions, LlmError, LlmProvider, Message};
use super::tools::{RegistryError, ToolRegistry};
use crate::mcp::connection::InvocationError;

/// Policy text handed to the reasoning engine on every request.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an helpful agent, do not rely on your knowledge \
    to answer users queries, only use the tools to perform the required action. If the provided \
    tools cannot solve the user request, simply reply by saying: 'I cannot help with this request'";

/// Canned answer when no available tool can satisfy the request.
pub const REFUSAL_ANSWER: &str = "I cannot help with this request";

/// Canned answer when a tool or the engine failed mid-request.
pub const FAILURE_ANSWER: &str =
    "Sorry, I could not complete this request because a tool call failed";

/// Default bound on engine round trips per request.
const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Errors inside the reasoning loop.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The registry is empty; a tool-only agent without tools can only refuse.
    #[error("No tools available: every configured provider has an empty catalog")]
    EmptyToolSet,

    #[error("Reasoning engine error: {0}")]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("Maximum reasoning iterations exceeded")]
    MaxIterationsExceeded,
}

/// The single configured agent: system prompt + aggregated tool set + engine.
pub struct AgentOrchestrator {
    system_prompt: String,
    llm: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    /// Catalog snapshot handed to the engine; fixed at construction.
    descriptors: Vec<super::tools::ToolDescriptor>,
    max_iterations: usize,
    completion_options: CompletionOptions,
}

impl std::fmt::Debug for AgentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentOrchestrator")
            .field("system_prompt", &self.system_prompt)
            .field("registry", &self.registry)
            .field("descriptors", &self.descriptors)
            .field("max_iterations", &self.max_iterations)
            .field("completion_options", &self.completion_options)
            .finish_non_exhaustive()
    }
}

impl AgentOrchestrator {
    /// Build the agent over a finalized registry.
    ///
    /// Fails with [`AgentError::EmptyToolSet`] when the registry has no
    /// tools: silently booting an agent that can never do anything would
    /// hide a configuration mistake.
    pub fn new(
        system_prompt: impl Into<String>,
        llm: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
    ) -> Result<Self, AgentError> {
        if registry.is_empty() {
            return Err(AgentError::EmptyToolSet);
        }

        Ok(Self {
            system_prompt: system_prompt.into(),
            llm,
            descriptors: registry.descriptors(),
            registry,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            completion_options: CompletionOptions::default(),
        })
    }

    /// Override the per-request iteration bound.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the engine completion options.
    pub fn with_completion_options(mut self, options: CompletionOptions) -> Self {
        self.completion_options = options;
        self
    }

    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    /// Answer one prompt.
    ///
    /// Always returns text: errors inside the loop are logged and degraded
    /// to the refusal or failure answer.
    pub async fn handle(&self, prompt: &str) -> String {
        match self.run(prompt).await {
            Ok(answer) => answer,
            Err(AgentError::Registry(RegistryError::UnknownTool(name))) => {
                // The engine asked for a capability the gateway does not have.
                warn!(tool = %name, "Engine requested an unknown tool, refusing");
                REFUSAL_ANSWER.to_string()
            }
            Err(err) => {
                warn!(error = %error_chain(&err), "Request degraded to failure answer");
                FAILURE_ANSWER.to_string()
            }
        }
    }

    async fn run(&self, prompt: &str) -> Result<String, AgentError> {
        let mut messages = vec![
            Message::system(&self.system_prompt),
            Message::user(prompt),
        ];

        for iteration in 0..self.max_iterations {
            let response = self
                .llm
                .complete(&messages, Some(&self.descriptors), &self.completion_options)
                .await?;

            debug!(
                iteration = iteration,
                finish_reason = ?response.finish_reason,
                tool_call_count = response.message.tool_calls().len(),
                "Engine responded"
            );

            let tool_calls = response.message.tool_calls().to_vec();
            messages.push(response.message);

            if tool_calls.is_empty() {
                // No tool calls: the engine's text is the final answer.
                let answer = messages
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                return Ok(answer);
            }

            for call in tool_calls {
                let tool = self.registry.resolve(&call.name)?;
                info!(
                    tool = %call.name,
                    provider = %tool.descriptor().provider_id,
                    "Invoking tool"
                );

                let output = tool.invoke(call.arguments.clone()).await?;
                debug!(tool = %call.name, output = %truncate(&output, 200), "Tool returned");

                messages.push(Message::tool_response(&call.id, &call.name, &output));
            }
        }

        Err(AgentError::MaxIterationsExceeded)
    }
}

/// Render an error with its source chain for one-line logging.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Truncate a string to a maximum number of characters.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}
