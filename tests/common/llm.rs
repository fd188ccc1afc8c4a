//! Deterministic reasoning engine for tests.
//!
//! Stands in for the OpenAI backend: it parses simple arithmetic prompts
//! ("what is 2 plus 3"), requests the matching tool when the catalog offers
//! it, and phrases the final answer from the tool result. Prompts it cannot
//! map to a tool get the canned refusal, like a well-behaved tool-only agent.

use agent_gateway::agent::llm::{
    CompletionOptions, CompletionResponse, FinishReason, LlmError, LlmProvider, Message,
    MessageRole, ToolCall,
};
use agent_gateway::agent::tools::ToolDescriptor;
use agent_gateway::agent::REFUSAL_ANSWER;
use async_trait::async_trait;
use serde_json::json;

pub struct ArithmeticEngine;

impl ArithmeticEngine {
    fn answer(text: impl Into<String>) -> CompletionResponse {
        CompletionResponse {
            message: Message::assistant(text),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }

    fn tool_call(name: &str, a: i64, b: i64) -> CompletionResponse {
        let mut message = Message::assistant("");
        message.tool_calls = Some(vec![ToolCall {
            id: format!("call_{}_{}_{}", name, a, b),
            name: name.to_string(),
            arguments: json!({"a": a, "b": b}),
        }]);
        CompletionResponse {
            message,
            finish_reason: FinishReason::ToolCalls,
            usage: None,
        }
    }
}

#[async_trait]
impl LlmProvider for ArithmeticEngine {
    fn name(&self) -> &str {
        "arithmetic-test-engine"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDescriptor]>,
        _options: &CompletionOptions,
    ) -> Result<CompletionResponse, LlmError> {
        // A tool already ran: phrase the final answer from its result.
        if let Some(tool_msg) = messages.iter().rev().find(|m| m.role == MessageRole::Tool) {
            return Ok(Self::answer(format!("The result is {}", tool_msg.content)));
        }

        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();

        let numbers = extract_integers(&prompt);
        let operation = detect_operation(&prompt);

        let available = |name: &str| {
            tools
                .unwrap_or_default()
                .iter()
                .any(|tool| tool.name == name)
        };

        match (operation, numbers.as_slice()) {
            (Some(op), [a, b, ..]) if available(op) => Ok(Self::tool_call(op, *a, *b)),
            _ => Ok(Self::answer(REFUSAL_ANSWER)),
        }
    }
}

fn detect_operation(prompt: &str) -> Option<&'static str> {
    if prompt.contains("plus") || prompt.contains("add") {
        Some("add")
    } else if prompt.contains("minus") || prompt.contains("subtract") {
        Some("subtract")
    } else if prompt.contains("times") || prompt.contains("multipl") {
        Some("multiply")
    } else if prompt.contains("divide") {
        Some("divide")
    } else if prompt.contains("remainder") || prompt.contains("modulo") {
        Some("mod")
    } else {
        None
    }
}

fn extract_integers(prompt: &str) -> Vec<i64> {
    prompt
        .split(|c: char| !c.is_ascii_digit() && c != '-')
        .filter_map(|token| token.parse::<i64>().ok())
        .collect()
}
