//! Tool registry for agent capabilities.
//!
//! Tools are aggregated once at startup from the catalogs of all connected
//! providers and the registry is read-only afterwards. Name collisions across
//! providers fail aggregation outright: silently overriding one provider's
//! tool with another's would make tool selection non-deterministic and hide
//! configuration mistakes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::mcp::connection::{InvocationError, ProviderConnection};
use crate::mcp::protocol::ToolDefinition;

/// Description of a tool available to the agent, attributed to its provider.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    /// Name of the tool (must be unique across the whole registry).
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub input_schema: Value,
    /// Id of the provider that owns the tool.
    pub provider_id: String,
}

/// Trait for tools the agent can invoke.
///
/// The orchestrator only ever sees this interface; it never special-cases a
/// tool by identity.
#[async_trait]
pub trait AgentTool: Send + Sync + std::fmt::Debug {
    /// The tool's descriptor (name, description, schema, owner).
    fn descriptor(&self) -> &ToolDescriptor;

    /// Execute the tool with the given JSON arguments, returning its text
    /// output.
    async fn invoke(&self, arguments: Value) -> Result<String, InvocationError>;
}

/// A tool backed by a remote provider connection.
pub struct RemoteTool {
    descriptor: ToolDescriptor,
    connection: Arc<ProviderConnection>,
}

impl std::fmt::Debug for RemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTool")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl RemoteTool {
    /// Wrap one entry of a provider catalog as an invokable tool.
    pub fn new(definition: ToolDefinition, connection: Arc<ProviderConnection>) -> Self {
        let descriptor = ToolDescriptor {
            name: definition.name,
            description: definition.description,
            input_schema: definition.input_schema,
            provider_id: connection.provider_id().to_string(),
        };
        Self {
            descriptor,
            connection,
        }
    }
}

#[async_trait]
impl AgentTool for RemoteTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, arguments: Value) -> Result<String, InvocationError> {
        let result = self
            .connection
            .invoke(&self.descriptor.name, arguments)
            .await;
        crate::server::metrics::record_tool_invocation(
            &self.descriptor.provider_id,
            &self.descriptor.name,
            result.is_ok(),
        );
        result
    }
}

/// Errors building or querying the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(
        "Tool name collision: {name} is exposed by both provider {first} and provider {second}"
    )]
    ToolCollision {
        name: String,
        first: String,
        second: String,
    },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Unified, read-only mapping from tool name to tool.
#[derive(Debug)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
    /// Catalog order: providers in configuration order, tools in catalog order.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Build the registry from the union of all provider catalogs.
    ///
    /// Fails with [`RegistryError::ToolCollision`] when two providers expose
    /// the same tool name.
    pub fn aggregate(
        tools: impl IntoIterator<Item = Arc<dyn AgentTool>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self {
            tools: HashMap::new(),
            order: Vec::new(),
        };

        for tool in tools {
            let descriptor = tool.descriptor();
            if let Some(existing) = registry.tools.get(&descriptor.name) {
                return Err(RegistryError::ToolCollision {
                    name: descriptor.name.clone(),
                    first: existing.descriptor().provider_id.clone(),
                    second: descriptor.provider_id.clone(),
                });
            }
            registry.order.push(descriptor.name.clone());
            registry.tools.insert(descriptor.name.clone(), tool);
        }

        Ok(registry)
    }

    /// Look a tool up by name.
    pub fn resolve(&self, name: &str) -> Result<&Arc<dyn AgentTool>, RegistryError> {
        self.tools
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))
    }

    /// All tool descriptors, in catalog order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.descriptor().clone())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct EchoTool {
        descriptor: ToolDescriptor,
    }

    impl EchoTool {
        fn new(name: &str, provider: &str) -> Arc<dyn AgentTool> {
            Arc::new(Self {
                descriptor: ToolDescriptor {
                    name: name.to_string(),
                    description: "Echoes the input".to_string(),
                    input_schema: serde_json::json!({
                        "type": "object",
                        "properties": {
                            "message": {"type": "string"}
                        },
                        "required": ["message"]
                    }),
                    provider_id: provider.to_string(),
                },
            })
        }
    }

    #[async_trait]
    impl AgentTool for EchoTool {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, arguments: Value) -> Result<String, InvocationError> {
            let message = arguments
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            Ok(format!("echo: {}", message))
        }
    }

    #[test]
    fn test_aggregate_disjoint_catalogs() {
        let registry = ToolRegistry::aggregate(vec![
            EchoTool::new("add", "one"),
            EchoTool::new("subtract", "one"),
            EchoTool::new("search", "two"),
        ])
        .unwrap();

        assert_eq!(registry.len(), 3);
        assert!(registry.contains("add"));
        assert!(registry.contains("search"));

        let names: Vec<String> = registry.descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["add", "subtract", "search"]);
    }

    #[test]
    fn test_aggregate_rejects_collisions() {
        let err = ToolRegistry::aggregate(vec![
            EchoTool::new("add", "one"),
            EchoTool::new("add", "two"),
        ])
        .unwrap_err();

        match err {
            RegistryError::ToolCollision {
                name,
                first,
                second,
            } => {
                assert_eq!(name, "add");
                assert_eq!(first, "one");
                assert_eq!(second, "two");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let registry = ToolRegistry::aggregate(vec![EchoTool::new("add", "one")]).unwrap();
        let err = registry.resolve("missing").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownTool(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_invoke_through_registry() {
        let registry = ToolRegistry::aggregate(vec![EchoTool::new("echo", "one")]).unwrap();
        let tool = registry.resolve("echo").unwrap();
        let output = tool
            .invoke(serde_json::json!({"message": "hello"}))
            .await
            .unwrap();
        assert_eq!(output, "echo: hello");
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::aggregate(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
