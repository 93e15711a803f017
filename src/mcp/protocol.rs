//! MCP (Model Context Protocol) message structures and JSON-RPC handling
//!
//! This module defines the JSON-RPC message format that MCP clients use to
//! talk to the activity timeline server.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// MCP protocol version we support
pub const MCP_VERSION: &str = "2024-11-05";

/// JSON-RPC 2.0 request message
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Unique identifier for this request; absent on notifications
    #[serde(default)]
    pub id: Value,
    /// The method/tool name to call (e.g., "tools/call")
    pub method: String,
    /// Parameters for the method call
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response message
///
/// Carries either a result or an error, never both.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID that we're responding to
    pub id: Value,
    /// Successful result (if no error occurred)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information (if something went wrong)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error information
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (standard JSON-RPC codes)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP tool call parameters
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// Name of the tool to call (e.g., "activity_log")
    pub name: String,
    /// Arguments to pass to the tool
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
}

/// MCP tool call result
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// Tool execution results
    pub content: Vec<ToolContent>,
    /// Whether this is an error result
    #[serde(rename = "isError")]
    pub is_error: bool,
    /// Machine-readable details, set on tool errors
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Content returned by a tool
#[derive(Debug, Serialize)]
pub struct ToolContent {
    /// Type of content (usually "text")
    #[serde(rename = "type")]
    pub content_type: String,
    /// The actual content/result
    pub text: String,
}

/// MCP tool definition
#[derive(Debug, Serialize)]
pub struct ToolDefinition {
    /// Tool name (e.g., "activity_list")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for the tool's input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP server capabilities
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    /// Tools that this server provides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability information
#[derive(Debug, Serialize)]
pub struct ToolsCapability {
    /// Whether the tool list can change during a session
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// MCP initialization response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// MCP protocol version we support
    pub protocol_version: String,
    /// Our server capabilities
    pub capabilities: ServerCapabilities,
    /// Information about our server
    pub server_info: ServerInfo,
}

/// Name and version reported to the client
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// Server name
    pub name: String,
    /// Server version
    pub version: String,
}

/// JSON-RPC error codes
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The requested method doesn't exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid parameters - Method exists but parameters are wrong
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;

    // Application-specific codes live in the -32000 to -32099 range
    /// The record ID doesn't exist in the session
    pub const RECORD_NOT_FOUND: i32 = -32001;
    /// Another request is still being applied
    pub const REQUEST_IN_FLIGHT: i32 = -32002;
    /// Input validation failed
    pub const VALIDATION_ERROR: i32 = -32003;
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
        }
    }
}

impl ToolCallResult {
    /// Create a successful tool result with text content
    pub fn success(text: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: false,
            meta: None,
        }
    }

    /// Create an error tool result
    pub fn error(error_message: String) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: format!("Error: {}", error_message),
            }],
            is_error: true,
            meta: None,
        }
    }

    /// Error result carrying the matching JSON-RPC code
    pub fn from_tool_error(error: &crate::tools::ToolError) -> Self {
        let mut result = Self::error(error.to_string());
        result.meta = Some(serde_json::json!({ "errorCode": tool_error_code(error) }));
        result
    }
}

/// Map a tool error to the JSON-RPC code reported in the result's `_meta`
pub fn tool_error_code(error: &crate::tools::ToolError) -> i32 {
    use crate::feed::FeedError;
    use crate::tools::ToolError;

    match error {
        ToolError::RecordNotFound { .. } => error_codes::RECORD_NOT_FOUND,
        ToolError::Validation { .. } | ToolError::Domain(_) => error_codes::VALIDATION_ERROR,
        ToolError::Feed(FeedError::RequestInFlight) => error_codes::REQUEST_IN_FLIGHT,
        ToolError::Feed(FeedError::Domain(_)) => error_codes::VALIDATION_ERROR,
        ToolError::Feed(FeedError::DeleteMismatch { .. }) => error_codes::INTERNAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolError;
    use serde_json::json;

    #[test]
    fn test_notification_has_null_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc": "2.0", "method": "notifications/initialized"}"#)
                .unwrap();
        assert_eq!(request.id, Value::Null);
        assert!(request.params.is_none());
    }

    #[test]
    fn test_tool_result_shape() {
        let ok = serde_json::to_value(ToolCallResult::success("done".to_string())).unwrap();
        assert_eq!(ok, json!({"content": [{"type": "text", "text": "done"}], "isError": false}));

        let err = ToolError::RecordNotFound {
            record_id: "abc".to_string(),
        };
        let failed = serde_json::to_value(ToolCallResult::from_tool_error(&err)).unwrap();
        assert_eq!(failed["isError"], true);
        assert_eq!(failed["_meta"]["errorCode"], error_codes::RECORD_NOT_FOUND);
        assert_eq!(failed["content"][0]["text"], "Error: Record not found: abc");
    }
}
