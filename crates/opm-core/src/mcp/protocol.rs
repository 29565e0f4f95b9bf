//! JSON-RPC 2.0 and MCP protocol types.

use serde::Serialize;
use serde_json::Value;

use opm_common::Error;

pub use opm_common::error::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version we implement. Returned regardless of what the client asks for.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// A validated JSON-RPC 2.0 request.
///
/// `id` is `None` for notifications. An explicit `"id": null` is kept as
/// `Some(Value::Null)` and still gets a response.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Option<Value>,
    pub method: String,
    /// `Value::Null` when absent.
    pub params: Value,
}

/// Envelope rejection: the error plus the id to answer with.
#[derive(Debug)]
pub struct EnvelopeError {
    pub id: Value,
    pub error: Error,
}

impl JsonRpcRequest {
    /// Validate a parsed message as a request envelope.
    pub fn from_value(message: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut map) = message else {
            return Err(EnvelopeError {
                id: Value::Null,
                error: Error::InvalidRequest("request must be a JSON object".into()),
            });
        };

        let id = map.remove("id");
        let reply_id = match &id {
            Some(v @ (Value::String(_) | Value::Number(_) | Value::Null)) => v.clone(),
            Some(_) => {
                return Err(EnvelopeError {
                    id: Value::Null,
                    error: Error::InvalidRequest("id must be a string, number or null".into()),
                })
            }
            None => Value::Null,
        };
        let reject = |message: &str| EnvelopeError {
            id: reply_id.clone(),
            error: Error::InvalidRequest(message.to_string()),
        };

        match map.get("jsonrpc") {
            Some(Value::String(v)) if v == JSONRPC_VERSION => {}
            _ => return Err(reject("jsonrpc must be \"2.0\"")),
        }
        let method = match map.remove("method") {
            Some(Value::String(m)) => m,
            Some(_) => return Err(reject("method must be a string")),
            None => return Err(reject("method is required")),
        };
        let params = map.remove("params").unwrap_or(Value::Null);

        Ok(Self { id, method, params })
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Id to echo in the response.
    pub fn reply_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// JSON-RPC 2.0 response. `id` is always present, `null` when unknown.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Wire form of an [`Error`].
    ///
    /// Internal errors carry only a generic message; the original text goes
    /// to `data.detail` when `debug` is set.
    pub fn from_error(err: &Error, debug: bool) -> Self {
        let mut data = err.data();
        if debug && err.is_internal() {
            data = Some(serde_json::json!({
                "detail": err.to_string(),
                "error_type": err.kind(),
            }));
        }
        Self {
            code: err.code(),
            message: err.public_message(),
            data,
        }
    }
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn from_error(id: Value, err: &Error, debug: bool) -> Self {
        Self::error(id, JsonRpcError::from_error(err, debug))
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Server info returned in the initialize response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// Capabilities advertised in the initialize response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    pub tools: ListCapability,
    pub resources: ResourcesCapability,
    pub prompts: ListCapability,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: ListCapability { list_changed: false },
            resources: ResourcesCapability {
                subscribe: false,
                list_changed: false,
            },
            prompts: ListCapability { list_changed: false },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    pub subscribe: bool,
    pub list_changed: bool,
}

/// Tool definition for the tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Static resource for the resources/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// Parameterized resource for the resources/templates/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDefinition {
    pub uri_template: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

/// Prompt for the prompts/list response.
#[derive(Debug, Clone, Serialize)]
pub struct PromptDefinition {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptArgument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

/// A text content block (`{"type": "text", "text": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Resource content block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}

/// One role-tagged prompt message.
#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: ToolContent,
}

impl PromptMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: ToolContent::text(text),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: ToolContent::text(text),
        }
    }
}

/// Result of prompts/get.
#[derive(Debug, Clone, Serialize)]
pub struct PromptResult {
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: &str) -> Result<JsonRpcRequest, EnvelopeError> {
        JsonRpcRequest::from_value(serde_json::from_str(raw).unwrap())
    }

    #[test]
    fn valid_request() {
        let req = parse(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).unwrap();
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, Some(json!(1)));
        assert!(!req.is_notification());
    }

    #[test]
    fn missing_id_is_notification_but_null_id_is_not() {
        let req = parse(r#"{"jsonrpc":"2.0","method":"initialized"}"#).unwrap();
        assert!(req.is_notification());
        assert_eq!(req.params, Value::Null);

        let req = parse(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#).unwrap();
        assert!(!req.is_notification());
        assert_eq!(req.reply_id(), Value::Null);
    }

    #[test]
    fn envelope_violations() {
        let err = parse(r#"{"jsonrpc":"1.0","id":"a","method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.code(), INVALID_REQUEST);
        assert_eq!(err.id, json!("a"));

        let err = parse(r#"{"jsonrpc":"2.0","id":2,"method":7}"#).unwrap_err();
        assert_eq!(err.error.code(), INVALID_REQUEST);
        assert_eq!(err.id, json!(2));

        let err = parse(r#"{"jsonrpc":"2.0","id":3}"#).unwrap_err();
        assert_eq!(err.error.code(), INVALID_REQUEST);

        let err = parse(r#"{"jsonrpc":"2.0","id":{"x":1},"method":"ping"}"#).unwrap_err();
        assert_eq!(err.error.code(), INVALID_REQUEST);
        assert_eq!(err.id, Value::Null);

        let err = parse("[1,2]").unwrap_err();
        assert_eq!(err.error.code(), INVALID_REQUEST);
    }

    #[test]
    fn response_always_serializes_id() {
        let resp = JsonRpcResponse::success(Value::Null, json!({}));
        let text = serde_json::to_string(&resp).unwrap();
        assert!(text.contains(r#""id":null"#));
        assert!(!text.contains("error"));
    }

    #[test]
    fn internal_errors_hide_detail_unless_debugging() {
        let err = Error::Internal("disk on fire".into());
        let quiet = JsonRpcError::from_error(&err, false);
        assert_eq!(quiet.code, INTERNAL_ERROR);
        assert_eq!(quiet.message, "Internal error");
        assert!(quiet.data.is_none());

        let loud = JsonRpcError::from_error(&err, true);
        assert!(loud.data.unwrap()["detail"]
            .as_str()
            .unwrap()
            .contains("disk on fire"));
    }

    #[test]
    fn domain_errors_keep_their_message() {
        let err = Error::not_found("project", "9");
        let wire = JsonRpcError::from_error(&err, false);
        assert_eq!(wire.code, -32003);
        assert_eq!(wire.message, "project not found: 9");
    }

    #[test]
    fn content_blocks_serialize_with_type() {
        let block = serde_json::to_value(ToolContent::text("hi")).unwrap();
        assert_eq!(block, json!({"type": "text", "text": "hi"}));
        let def = serde_json::to_value(ResourceTemplateDefinition {
            uri_template: "openproject://projects/{project_id}".into(),
            name: "Project".into(),
            description: "d".into(),
            mime_type: "application/json".into(),
        })
        .unwrap();
        assert!(def.get("uriTemplate").is_some());
        assert!(def.get("mimeType").is_some());
    }
}
