//! Demo arithmetic tool provider.
//!
//! A minimal MCP server over streamable HTTP exposing five integer tools:
//! `add`, `subtract`, `divide`, `multiply` and `mod`. It exists so the
//! gateway has something real to talk to out of the box: the `demo-provider`
//! binary serves this router, and the e2e tests mount it in-process.
//!
//! Divide (and mod) by zero return a structured tool error, which the
//! gateway surfaces as an invocation failure.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::mcp::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    RequestId, ServerCapabilities, ServerInfo, ToolDefinition, ToolsCallParams, ToolsCallResult,
    ToolsCapability, ToolsListResult, MCP_PROTOCOL_VERSION,
};

/// Build the provider router. Stateless; mount it wherever needed.
pub fn router() -> Router {
    Router::new().route("/mcp", post(handle_rpc).delete(close_session))
}

/// The provider's tool catalog.
pub fn catalog() -> Vec<ToolDefinition> {
    let names = [
        ("add", "Add two integers"),
        ("subtract", "Subtract the second integer from the first"),
        ("divide", "Divide the first integer by the second"),
        ("multiply", "Multiply two integers"),
        ("mod", "Remainder of dividing the first integer by the second"),
    ];

    names
        .into_iter()
        .map(|(name, description)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer"}
                },
                "required": ["a", "b"]
            }),
        })
        .collect()
}

async fn close_session() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn handle_rpc(body: Result<Json<McpRequest>, JsonRejection>) -> Response {
    let Ok(Json(request)) = body else {
        return rpc_response(McpResponse::error(
            None,
            McpError::ParseError("body is not a JSON-RPC request".to_string()),
        ));
    };

    debug!(method = %request.method, "Demo provider request");

    // Notifications get acknowledged without a body.
    if request.is_notification() {
        return StatusCode::ACCEPTED.into_response();
    }

    let id = request.id.clone().unwrap_or(RequestId::Number(0));

    let response = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(id, request.params),
        methods::PING => McpResponse::success(id, json!(PingResult {})),
        methods::TOOLS_LIST => McpResponse::success(
            id,
            json!(ToolsListResult { tools: catalog() }),
        ),
        methods::TOOLS_CALL => handle_tools_call(id, request.params),
        other => McpResponse::error(Some(id), McpError::MethodNotFound(other.to_string())),
    };

    rpc_response(response)
}

fn handle_initialize(id: RequestId, params: Option<Value>) -> McpResponse {
    let params: InitializeParams = match params.map(serde_json::from_value) {
        Some(Ok(params)) => params,
        _ => {
            return McpResponse::error(
                Some(id),
                McpError::InvalidParams("initialize needs protocol version and client info".to_string()),
            )
        }
    };

    debug!(
        client = %params.client_info.name,
        client_version = %params.client_info.version,
        protocol = %params.protocol_version,
        "Client initialized"
    );

    McpResponse::success(
        id,
        json!(InitializeResult {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: ServerInfo {
                name: "demo-provider".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }),
    )
}

fn handle_tools_call(id: RequestId, params: Option<Value>) -> McpResponse {
    let params: ToolsCallParams = match params.map(serde_json::from_value) {
        Some(Ok(params)) => params,
        _ => {
            return McpResponse::error(
                Some(id),
                McpError::InvalidParams("tools/call needs a tool name".to_string()),
            )
        }
    };

    if !catalog().iter().any(|tool| tool.name == params.name) {
        return McpResponse::error(Some(id), McpError::MethodNotFound(params.name));
    }

    let arguments = params.arguments.unwrap_or(Value::Null);
    let (a, b) = match (int_arg(&arguments, "a"), int_arg(&arguments, "b")) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return McpResponse::error(
                Some(id),
                McpError::InvalidParams("arguments a and b must be integers".to_string()),
            )
        }
    };

    let result = match compute(&params.name, a, b) {
        Ok(value) => ToolsCallResult::text(value.to_string()),
        Err(message) => ToolsCallResult::error(message),
    };

    McpResponse::success(id, json!(result))
}

fn int_arg(arguments: &Value, key: &str) -> Option<i64> {
    arguments.get(key).and_then(Value::as_i64)
}

fn compute(tool: &str, a: i64, b: i64) -> Result<i64, String> {
    match tool {
        "add" => Ok(a.wrapping_add(b)),
        "subtract" => Ok(a.wrapping_sub(b)),
        "multiply" => Ok(a.wrapping_mul(b)),
        "divide" => {
            if b == 0 {
                Err("Cannot divide by zero".to_string())
            } else {
                Ok(a / b)
            }
        }
        "mod" => {
            if b == 0 {
                Err("Cannot take a remainder modulo zero".to_string())
            } else {
                Ok(a % b)
            }
        }
        other => Err(format!("Unknown tool: {}", other)),
    }
}

fn rpc_response(response: McpResponse) -> Response {
    Json(response).into_response()
}
