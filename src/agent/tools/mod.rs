//! Tools available to the agent.

mod registry;

pub use registry::{AgentTool, RegistryError, RemoteTool, ToolDescriptor, ToolRegistry};
