//! OpenProject MCP server core.
//!
//! This crate wires the pieces together:
//! - [`backend`]: the work-item backend contract, the OpenProject API v3
//!   adapter and an in-memory backend for tests and demos
//! - [`mcp`]: JSON-RPC protocol types, the request router and the tool,
//!   resource and prompt managers
//! - [`logging`]: tracing setup (stderr only, stdout carries the protocol)
//! - [`exit_codes`]: process exit codes of the `opm` binary

pub mod backend;
pub mod exit_codes;
pub mod logging;
pub mod mcp;

pub use backend::{InMemoryBackend, OpenProjectClient, WorkItemBackend};
pub use exit_codes::ExitCode;
pub use mcp::{McpServer, ServerContext};
