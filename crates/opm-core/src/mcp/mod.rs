//! MCP (Model Context Protocol) server.
//!
//! JSON-RPC 2.0 over stdio exposing OpenProject data as tools, resources
//! and prompts.

pub mod context;
pub mod prompts;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use context::ServerContext;
pub use server::McpServer;
