//! Agent infrastructure.
//!
//! - Reasoning-engine abstraction in [`llm`] (OpenAI-compatible backend)
//! - Tool registry and remote tool proxies in [`tools`]
//! - The per-request orchestration loop in [`orchestrator`]

pub mod llm;
pub mod orchestrator;
pub mod tools;

pub use llm::{CompletionOptions, LlmError, LlmProvider, Message, OpenAiEngine};
pub use orchestrator::{
    AgentError, AgentOrchestrator, DEFAULT_SYSTEM_PROMPT, FAILURE_ANSWER, REFUSAL_ANSWER,
};
pub use tools::{AgentTool, RegistryError, RemoteTool, ToolDescriptor, ToolRegistry};
