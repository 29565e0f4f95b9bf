//! MCP server: JSON-RPC router with stdio transport.
//!
//! Reads one JSON-RPC 2.0 message per line from stdin, dispatches it to the
//! tool, resource or prompt registry, and writes the response to stdout.
//! Every error leaving a handler is mapped to the wire here and nowhere else.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use opm_common::{Error, Result};

use crate::logging::generate_request_id;
use crate::mcp::context::ServerContext;
use crate::mcp::prompts::PromptRegistry;
use crate::mcp::protocol::*;
use crate::mcp::resources::ResourceRegistry;
use crate::mcp::tools::ToolRegistry;

/// MCP server state.
pub struct McpServer {
    ctx: ServerContext,
    tools: ToolRegistry,
    resources: ResourceRegistry,
    prompts: PromptRegistry,
    initialized: bool,
    ready: bool,
    client_info: Option<Value>,
}

impl McpServer {
    pub fn new(ctx: ServerContext) -> Result<Self> {
        Ok(Self {
            ctx,
            tools: ToolRegistry::builtin(),
            resources: ResourceRegistry::builtin()?,
            prompts: PromptRegistry::builtin(),
            initialized: false,
            ready: false,
            client_info: None,
        })
    }

    pub fn context(&self) -> &ServerContext {
        &self.ctx
    }

    /// Set by a successful `initialize`.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Set by the `initialized` notification. Diagnostic only.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn client_info(&self) -> Option<&Value> {
        self.client_info.as_ref()
    }

    /// Run the stdio event loop until stdin closes.
    pub fn run_stdio(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        info!(server = %self.ctx.config.server_name, "MCP server listening on stdio");
        for line in stdin.lock().lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(resp) = self.handle_message(trimmed) {
                let json = serde_json::to_string(&resp).unwrap_or_else(|_| {
                    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                        .to_string()
                });
                writeln!(stdout, "{json}")?;
                stdout.flush()?;
            }
        }
        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle one raw message. `None` for notifications.
    pub fn handle_message(&mut self, raw: &str) -> Option<JsonRpcResponse> {
        let started = Instant::now();
        let debug_mode = self.ctx.debug();

        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                let err = Error::Parse(e.to_string());
                warn!(
                    correlation_id = %generate_request_id(),
                    error = %err,
                    "rejected unparseable message"
                );
                return Some(JsonRpcResponse::from_error(Value::Null, &err, debug_mode));
            }
        };

        let request = match JsonRpcRequest::from_value(value) {
            Ok(req) => req,
            Err(rejected) => {
                warn!(
                    correlation_id = %correlation_id(Some(&rejected.id)),
                    error = %rejected.error,
                    "rejected invalid request envelope"
                );
                return Some(JsonRpcResponse::from_error(
                    rejected.id,
                    &rejected.error,
                    debug_mode,
                ));
            }
        };

        let correlation_id = correlation_id(request.id.as_ref());
        info!(
            correlation_id = %correlation_id,
            method = %request.method,
            notification = request.is_notification(),
            "rpc request"
        );

        let outcome = self.dispatch(&request);
        let duration_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(_) => info!(
                correlation_id = %correlation_id,
                method = %request.method,
                duration_ms,
                outcome = "ok",
                "rpc response"
            ),
            Err(err) => info!(
                correlation_id = %correlation_id,
                method = %request.method,
                duration_ms,
                outcome = err.code(),
                error = %err,
                "rpc response"
            ),
        }

        if request.is_notification() {
            if let Err(err) = outcome {
                debug!(method = %request.method, error = %err, "notification failed");
            }
            return None;
        }

        let id = request.reply_id();
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::from_error(id, &err, debug_mode),
        })
    }

    fn dispatch(&mut self, request: &JsonRpcRequest) -> Result<Value> {
        let params = &request.params;
        match request.method.as_str() {
            "initialize" => self.handle_initialize(params),
            "initialized" | "notifications/initialized" => {
                self.ready = true;
                Ok(json!({}))
            }
            "ping" => Ok(json!({ "pong": true })),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.handle_tools_call(params),
            "resources/list" => Ok(json!({ "resources": self.resources.definitions() })),
            "resources/templates/list" => Ok(json!({
                "resourceTemplates": self.resources.template_definitions()
            })),
            "resources/read" => self.handle_resources_read(params),
            "prompts/list" => Ok(json!({ "prompts": self.prompts.definitions() })),
            "prompts/get" => self.handle_prompts_get(params),
            other => Err(Error::MethodNotFound(other.to_string())),
        }
    }

    fn handle_initialize(&mut self, params: &Value) -> Result<Value> {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidParams("initialize requires 'protocolVersion'".into()))?;
        let client_info = params
            .get("clientInfo")
            .filter(|v| v.is_object())
            .ok_or_else(|| Error::InvalidParams("initialize requires 'clientInfo'".into()))?;

        info!(
            client_protocol = version,
            client = %client_info.get("name").and_then(serde_json::Value::as_str).unwrap_or("unknown"),
            "client initialized"
        );
        self.client_info = Some(client_info.clone());
        self.initialized = true;

        Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "serverInfo": ServerInfo {
                name: self.ctx.config.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            "capabilities": ServerCapabilities::default(),
        }))
    }

    fn handle_tools_call(&self, params: &Value) -> Result<Value> {
        let name = required_str(params, "name", "tools/call")?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let content = self.tools.call(&self.ctx, name, &arguments)?;
        Ok(json!({ "content": content }))
    }

    fn handle_resources_read(&self, params: &Value) -> Result<Value> {
        let uri = required_str(params, "uri", "resources/read")?;
        let contents = self.resources.read(&self.ctx, uri)?;
        Ok(json!({ "contents": contents }))
    }

    fn handle_prompts_get(&self, params: &Value) -> Result<Value> {
        let name = required_str(params, "name", "prompts/get")?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let result = self.prompts.get(&self.ctx, name, &arguments)?;
        Ok(serde_json::to_value(result)?)
    }
}

fn required_str<'a>(params: &'a Value, key: &str, method: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidParams(format!("{method} requires '{key}'")))
}

/// The request id as text, or a fresh `req-…` id when there is none.
fn correlation_id(id: Option<&Value>) -> String {
    match id {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => generate_request_id(),
    }
}
