//! HTTP client for remote MCP tool providers.
//!
//! Speaks JSON-RPC 2.0 over the streamable HTTP transport: every call is a
//! POST to `{base_url}/mcp`. Servers may answer with plain JSON or with a
//! single-event SSE body; both framings are handled here.

use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::protocol::{
    methods, ClientCapabilities, ClientInfo, InitializeParams, InitializeResult, McpRequest,
    McpResponse, RequestId, ToolDefinition, ToolsCallParams, ToolsCallResult, ToolsListResult,
    MCP_PROTOCOL_VERSION,
};

/// Header carrying the streamable-HTTP session id, when the server issues one.
const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Errors from talking JSON-RPC to a provider.
#[derive(Debug, thiserror::Error)]
pub enum McpClientError {
    #[error("Failed to reach provider: {0}")]
    Connect(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Malformed provider response: {0}")]
    Protocol(String),

    #[error("Provider returned RPC error {code}: {message}")]
    Rpc { code: i32, message: String },
}

impl McpClientError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            McpClientError::Timeout
        } else {
            McpClientError::Connect(err.to_string())
        }
    }
}

/// JSON-RPC client for one MCP provider endpoint.
///
/// The session id handed out by the server on `initialize` is remembered and
/// echoed on every subsequent request of this client.
pub struct McpClient {
    client: reqwest::Client,
    base_url: String,
    session_id: Mutex<Option<String>>,
}

impl McpClient {
    /// Create a client for a provider base URL (e.g. "http://localhost:8080").
    ///
    /// `timeout` bounds every round trip so one unresponsive provider cannot
    /// stall a request forever.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            base_url,
            session_id: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rpc_url(&self) -> String {
        format!("{}/mcp", self.base_url)
    }

    fn current_session_id(&self) -> Option<String> {
        self.session_id.lock().unwrap().clone()
    }

    /// Perform the MCP handshake and send the `initialized` notification.
    pub async fn initialize(&self, client_name: &str) -> Result<InitializeResult, McpClientError> {
        let params = InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo {
                name: client_name.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let request = McpRequest::new(
            next_request_id(),
            methods::INITIALIZE,
            Some(serde_json::to_value(&params).map_err(|e| {
                McpClientError::Protocol(format!("Failed to encode initialize params: {}", e))
            })?),
        );

        let response = self
            .client
            .post(self.rpc_url())
            .header("Accept", "application/json, text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(McpClientError::from_reqwest)?;

        // The server may open a session on initialize; remember it.
        if let Some(session) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            debug!(provider = %self.base_url, session = %session, "Provider opened MCP session");
            *self.session_id.lock().unwrap() = Some(session.to_string());
        }

        let result = read_rpc_result(response).await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| McpClientError::Protocol(format!("Bad initialize result: {}", e)))?;

        self.notify(methods::INITIALIZED).await?;

        Ok(init)
    }

    /// Fetch the provider's tool catalog.
    pub async fn list_tools(&self) -> Result<Vec<ToolDefinition>, McpClientError> {
        let result = self.rpc(methods::TOOLS_LIST, None).await?;
        let listing: ToolsListResult = serde_json::from_value(result)
            .map_err(|e| McpClientError::Protocol(format!("Bad tools/list result: {}", e)))?;
        Ok(listing.tools)
    }

    /// Invoke a named tool with JSON arguments.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolsCallResult, McpClientError> {
        let params = ToolsCallParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        let params = serde_json::to_value(&params).map_err(|e| {
            McpClientError::Protocol(format!("Failed to encode tools/call params: {}", e))
        })?;

        let result = self.rpc(methods::TOOLS_CALL, Some(params)).await?;
        serde_json::from_value(result)
            .map_err(|e| McpClientError::Protocol(format!("Bad tools/call result: {}", e)))
    }

    /// Tear the session down. Best effort: failures are logged, not returned.
    pub async fn close(&self) {
        let session = self.session_id.lock().unwrap().take();
        let Some(session) = session else {
            return;
        };

        let result = self
            .client
            .delete(self.rpc_url())
            .header(SESSION_HEADER, &session)
            .send()
            .await;

        if let Err(e) = result {
            warn!(provider = %self.base_url, error = %e, "Failed to close MCP session");
        }
    }

    /// Send a request and return the JSON-RPC `result` payload.
    async fn rpc(&self, method: &str, params: Option<Value>) -> Result<Value, McpClientError> {
        let request = McpRequest::new(next_request_id(), method, params);

        let mut builder = self
            .client
            .post(self.rpc_url())
            .header("Accept", "application/json, text/event-stream")
            .json(&request);

        if let Some(session) = self.current_session_id() {
            builder = builder.header(SESSION_HEADER, session);
        }

        let response = builder
            .send()
            .await
            .map_err(McpClientError::from_reqwest)?;

        read_rpc_result(response).await
    }

    /// Send a notification; no response body is expected.
    async fn notify(&self, method: &str) -> Result<(), McpClientError> {
        let request = McpRequest::notification(method);

        let mut builder = self
            .client
            .post(self.rpc_url())
            .header("Accept", "application/json, text/event-stream")
            .json(&request);

        if let Some(session) = self.current_session_id() {
            builder = builder.header(SESSION_HEADER, session);
        }

        let response = builder
            .send()
            .await
            .map_err(McpClientError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(McpClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

fn next_request_id() -> RequestId {
    RequestId::String(Uuid::new_v4().to_string())
}

/// Extract the JSON-RPC result from an HTTP response, handling both plain
/// JSON and single-event SSE framings.
async fn read_rpc_result(response: reqwest::Response) -> Result<Value, McpClientError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response
        .text()
        .await
        .map_err(McpClientError::from_reqwest)?;

    if !status.is_success() {
        return Err(McpClientError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let payload = if content_type.starts_with("text/event-stream") {
        extract_sse_data(&body)
            .ok_or_else(|| McpClientError::Protocol("Empty SSE response".to_string()))?
    } else {
        body
    };

    let rpc: McpResponse = serde_json::from_str(&payload)
        .map_err(|e| McpClientError::Protocol(format!("Not a JSON-RPC response: {}", e)))?;

    if let Some(err) = rpc.error {
        return Err(McpClientError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    rpc.result
        .ok_or_else(|| McpClientError::Protocol("Response has neither result nor error".to_string()))
}

/// Pull the first `data:` payload out of an SSE body.
fn extract_sse_data(body: &str) -> Option<String> {
    let mut data_lines = Vec::new();
    for line in body.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.trim_start());
        } else if !data_lines.is_empty() && line.is_empty() {
            // Blank line ends the first event.
            break;
        }
    }

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
