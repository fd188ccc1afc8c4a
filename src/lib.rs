//! Tool-aggregating agent gateway.
//!
//! Accepts natural-language prompts over HTTP and hands them to a single
//! tool-only agent. The agent's tools come from remote MCP providers whose
//! catalogs are merged into one registry at startup; a pluggable reasoning
//! engine decides which tools to invoke and phrases the final answer.
//!
//! Module tour:
//! - [`mcp`]: protocol types, transport and per-provider connections
//! - [`agent`]: reasoning engine, tool registry, orchestration loop
//! - [`gateway`]: startup/teardown lifecycle
//! - [`server`]: the axum HTTP surface
//! - [`config`]: CLI / TOML / environment resolution
//! - [`demo`]: the bundled arithmetic tool provider

pub mod agent;
pub mod config;
pub mod demo;
pub mod gateway;
pub mod mcp;
pub mod server;
