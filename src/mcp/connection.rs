//! Provider connection lifecycle.
//!
//! A [`ProviderConnection`] owns the network relationship with one remote
//! tool provider: it establishes the MCP session, serves the tool catalog,
//! proxies invocations, and releases the session on shutdown.
//!
//! State machine: `Disconnected → Connecting → Connected` on a successful
//! connect, `Connecting → Failed` on error, `Connected → Disconnected` on
//! disconnect. There is no automatic reconnection; a failed connection
//! requires a gateway restart.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::{McpClient, McpClientError};
use super::protocol::ToolDefinition;

/// Address of one remote tool provider, fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoint {
    /// Short identifier used in logs and tool attribution (e.g. "calc").
    pub id: String,
    /// Base URL of the provider (e.g. "http://localhost:8081").
    pub base_url: String,
}

impl std::fmt::Display for ProviderEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.base_url)
    }
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Errors establishing the provider session. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("Provider {endpoint} is unreachable")]
    Unreachable {
        endpoint: String,
        #[source]
        source: McpClientError,
    },

    #[error("Provider {endpoint} failed the MCP handshake")]
    Handshake {
        endpoint: String,
        #[source]
        source: McpClientError,
    },

    #[error("Provider {endpoint} cannot connect from the {state} state")]
    InvalidState {
        endpoint: String,
        state: ConnectionState,
    },
}

/// Errors fetching the provider catalog. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Provider {endpoint} is not connected")]
    NotConnected { endpoint: String },

    #[error("Failed to fetch catalog from provider {endpoint}")]
    Transport {
        endpoint: String,
        #[source]
        source: McpClientError,
    },

    #[error("Provider {endpoint} returned a malformed catalog: {reason}")]
    Malformed { endpoint: String, reason: String },
}

/// Errors invoking a tool. Per-request, recoverable.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("Provider {endpoint} is not connected")]
    NotConnected { endpoint: String },

    #[error("Provider {endpoint} does not know tool {tool}")]
    UnknownTool { endpoint: String, tool: String },

    #[error("Provider {endpoint} rejected the arguments for {tool}: {reason}")]
    InvalidArguments {
        endpoint: String,
        tool: String,
        reason: String,
    },

    #[error("Tool {tool} on provider {endpoint} failed: {message}")]
    Execution {
        endpoint: String,
        tool: String,
        message: String,
    },

    #[error("Failed to reach provider {endpoint} for tool {tool}")]
    Transport {
        endpoint: String,
        tool: String,
        #[source]
        source: McpClientError,
    },
}

/// Live connection to one remote tool provider.
///
/// Connect and disconnect mutate the state and only happen outside the
/// serving window; catalog fetches and invocations are read-only with respect
/// to the connection and safe to issue concurrently.
pub struct ProviderConnection {
    endpoint: ProviderEndpoint,
    client: McpClient,
    state: Mutex<ConnectionState>,
}

impl ProviderConnection {
    /// Create a connection in the `Disconnected` state.
    ///
    /// `call_timeout` bounds every round trip to this provider.
    pub fn new(endpoint: ProviderEndpoint, call_timeout: Duration) -> Self {
        let client = McpClient::new(endpoint.base_url.clone(), call_timeout);
        Self {
            endpoint,
            client,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    pub fn endpoint(&self) -> &ProviderEndpoint {
        &self.endpoint
    }

    pub fn provider_id(&self) -> &str {
        &self.endpoint.id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.lock().unwrap() = next;
    }

    /// Establish the MCP session with the provider.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != ConnectionState::Disconnected {
                return Err(ConnectionError::InvalidState {
                    endpoint: self.endpoint.to_string(),
                    state: *state,
                });
            }
            *state = ConnectionState::Connecting;
        }

        debug!(provider = %self.endpoint, "Connecting to tool provider");

        match self.client.initialize(env!("CARGO_PKG_NAME")).await {
            Ok(init) => {
                self.set_state(ConnectionState::Connected);
                info!(
                    provider = %self.endpoint,
                    server = %init.server_info.name,
                    server_version = %init.server_info.version,
                    "Connected to tool provider"
                );
                Ok(())
            }
            Err(source) => {
                self.set_state(ConnectionState::Failed);
                Err(match source {
                    McpClientError::Connect(_) | McpClientError::Timeout => {
                        ConnectionError::Unreachable {
                            endpoint: self.endpoint.to_string(),
                            source,
                        }
                    }
                    _ => ConnectionError::Handshake {
                        endpoint: self.endpoint.to_string(),
                        source,
                    },
                })
            }
        }
    }

    /// Fetch the provider's tool catalog. Requires a connected session.
    ///
    /// An empty catalog is not an error; a provider may expose zero tools.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, CatalogError> {
        if self.state() != ConnectionState::Connected {
            return Err(CatalogError::NotConnected {
                endpoint: self.endpoint.to_string(),
            });
        }

        let tools = self.client.list_tools().await.map_err(|source| match source {
            McpClientError::Protocol(reason) => CatalogError::Malformed {
                endpoint: self.endpoint.to_string(),
                reason,
            },
            _ => CatalogError::Transport {
                endpoint: self.endpoint.to_string(),
                source,
            },
        })?;

        for tool in &tools {
            if tool.name.trim().is_empty() {
                return Err(CatalogError::Malformed {
                    endpoint: self.endpoint.to_string(),
                    reason: "catalog contains a tool with an empty name".to_string(),
                });
            }
        }

        debug!(
            provider = %self.endpoint,
            tool_count = tools.len(),
            "Fetched provider catalog"
        );

        Ok(tools)
    }

    /// Forward a tool invocation to the provider and return its text output.
    pub async fn invoke(&self, tool: &str, arguments: Value) -> Result<String, InvocationError> {
        if self.state() != ConnectionState::Connected {
            return Err(InvocationError::NotConnected {
                endpoint: self.endpoint.to_string(),
            });
        }

        let result = self
            .client
            .call_tool(tool, arguments)
            .await
            .map_err(|source| match &source {
                McpClientError::Rpc { code: -32601, .. } => InvocationError::UnknownTool {
                    endpoint: self.endpoint.to_string(),
                    tool: tool.to_string(),
                },
                McpClientError::Rpc {
                    code: -32602,
                    message,
                } => InvocationError::InvalidArguments {
                    endpoint: self.endpoint.to_string(),
                    tool: tool.to_string(),
                    reason: message.clone(),
                },
                _ => InvocationError::Transport {
                    endpoint: self.endpoint.to_string(),
                    tool: tool.to_string(),
                    source,
                },
            })?;

        if result.failed() {
            return Err(InvocationError::Execution {
                endpoint: self.endpoint.to_string(),
                tool: tool.to_string(),
                message: result.text_content(),
            });
        }

        Ok(result.text_content())
    }

    /// Release the provider session. Idempotent; never fails the shutdown
    /// path (transport errors are logged inside the client).
    pub async fn disconnect(&self) {
        let previous = {
            let mut state = self.state.lock().unwrap();
            let previous = *state;
            *state = ConnectionState::Disconnected;
            previous
        };

        if previous == ConnectionState::Connected {
            self.client.close().await;
            info!(provider = %self.endpoint, "Disconnected from tool provider");
        } else if previous != ConnectionState::Disconnected {
            warn!(
                provider = %self.endpoint,
                was = %previous,
                "Dropping provider connection that never became ready"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> ProviderEndpoint {
        ProviderEndpoint {
            id: "calc".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        }
    }

    fn connection() -> ProviderConnection {
        ProviderConnection::new(endpoint(), Duration::from_secs(1))
    }

    #[test]
    fn test_starts_disconnected() {
        assert_eq!(connection().state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_list_tools_requires_connection() {
        let conn = connection();
        let err = conn.list_tools().await.unwrap_err();
        assert!(matches!(err, CatalogError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_invoke_requires_connection() {
        let conn = connection();
        let err = conn.invoke("add", json!({"a": 1, "b": 2})).await.unwrap_err();
        assert!(matches!(err, InvocationError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn test_connect_failure_moves_to_failed() {
        let conn = connection();
        let err = conn.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::Unreachable { .. }));
        assert_eq!(conn.state(), ConnectionState::Failed);

        // No transition back to connecting from failed.
        let err = conn.connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let conn = connection();
        conn.disconnect().await;
        conn.disconnect().await;
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "connected");
        assert_eq!(ConnectionState::Failed.to_string(), "failed");
    }
}
