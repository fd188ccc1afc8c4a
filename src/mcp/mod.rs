//! MCP (Model Context Protocol) support.
//!
//! The gateway is an MCP *client*: it connects to remote tool providers over
//! streamable HTTP, discovers their tools and proxies invocations.
//!
//! - [`protocol`]: JSON-RPC 2.0 + MCP message types (shared with the demo
//!   provider, which implements the server half)
//! - [`client`]: the HTTP transport
//! - [`connection`]: per-provider lifecycle and invocation proxy

pub mod client;
pub mod connection;
pub mod protocol;

pub use client::{McpClient, McpClientError};
pub use connection::{
    CatalogError, ConnectionError, ConnectionState, InvocationError, ProviderConnection,
    ProviderEndpoint,
};
