//! MCP server implementation that handles JSON-RPC communication
//!
//! Reads one JSON-RPC request per line from stdin, runs tool calls against
//! the session's activity feed, and writes one response per line to stdout.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::tools;
use crate::{ActivityTimelineServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    /// The session state the tools operate on
    timeline: ActivityTimelineServer,
    /// Whether the client has completed initialization
    initialized: bool,
}

fn str_arg(args: &HashMap<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn to_result_value<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| e.to_string())
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(timeline: ActivityTimelineServer) -> Self {
        Self {
            timeline,
            initialized: false,
        }
    }

    pub fn timeline(&self) -> &ActivityTimelineServer {
        &self.timeline
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Blank lines and notifications produce no response.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    json!(null),
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            ));
        }

        if request.method.starts_with("notifications/") {
            if request.method == "notifications/initialized" {
                self.initialized = true;
            }
            debug!("Received notification {}", request.method);
            return None;
        }

        Some(self.handle_request(request).await)
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await,
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(request.id, json!(null))
            }
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request).await,
            "tools/call" => self.handle_tools_call(request).await,
            _ => JsonRpcResponse::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    fn respond<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
        match to_result_value(result) {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(message) => {
                JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, message, None)
            }
        }
    }

    /// Handle MCP initialization request
    async fn handle_initialize(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: ServerInfo {
                name: "Activity Timeline MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Self::respond(request.id, &result)
    }

    /// Handle tools/list request
    async fn handle_tools_list(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let type_enum = json!(["meal", "poop", "nurse", "bath", "sleep"]);
        let tools = vec![
            ToolDefinition {
                name: "activity_log".to_string(),
                description: "Log a feeding, diaper change, nursing, bath or sleep".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": type_enum, "description": "Kind of activity"},
                        "date_time": {"type": "string", "description": "When it happened, ISO-8601 (optional - defaults to now)"},
                        "amount": {"type": "number", "description": "Ounces for a meal, hours for sleep (optional)"},
                        "notes": {"type": "string", "description": "Optional notes"}
                    },
                    "required": ["type"]
                }),
            },
            ToolDefinition {
                name: "activity_update".to_string(),
                description: "Edit a logged activity, including its time".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "record_id": {"type": "string", "description": "ID of the activity to edit"},
                        "type": {"type": "string", "description": "New kind (empty string clears it)"},
                        "date_time": {"type": "string", "description": "New time, ISO-8601"},
                        "amount": {"type": "number", "description": "New amount"},
                        "clear_amount": {"type": "boolean", "description": "Remove the amount"},
                        "notes": {"type": "string", "description": "New notes (empty string clears them)"}
                    },
                    "required": ["record_id"]
                }),
            },
            ToolDefinition {
                name: "activity_delete".to_string(),
                description: "Delete a logged activity".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "record_id": {"type": "string", "description": "ID of the activity to delete"}
                    },
                    "required": ["record_id"]
                }),
            },
            ToolDefinition {
                name: "activity_list".to_string(),
                description: "Show recent days of activities with daily totals".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "days": {"type": "integer", "minimum": 1, "description": "Number of most recent days (optional)"},
                        "types": {"type": "array", "items": {"type": "string", "enum": type_enum}, "description": "Only show these kinds (optional)"}
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "activity_latest".to_string(),
                description: "When did the last activity (of a kind) happen?".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": type_enum, "description": "Kind of activity (optional)"}
                    },
                    "required": []
                }),
            },
            ToolDefinition {
                name: "activity_stats".to_string(),
                description: "Average time between activities of each kind, with insights".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "type": {"type": "string", "enum": type_enum, "description": "Only report this kind (optional)"}
                    },
                    "required": []
                }),
            },
        ];

        JsonRpcResponse::success(request.id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    async fn handle_tools_call(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match request.params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        request.id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    request.id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let result = match tool_params.name.as_str() {
            "activity_log" => self.call_activity_log(tool_params.arguments).await,
            "activity_update" => self.call_activity_update(tool_params.arguments).await,
            "activity_delete" => self.call_activity_delete(tool_params.arguments).await,
            "activity_list" => self.call_activity_list(tool_params.arguments).await,
            "activity_latest" => self.call_activity_latest(tool_params.arguments).await,
            "activity_stats" => self.call_activity_stats(tool_params.arguments).await,
            _ => ToolCallResult::error(format!("Unknown tool: {}", tool_params.name)),
        };

        Self::respond(request.id, &result)
    }

    fn tool_result<T>(
        result: Result<T, tools::ToolError>,
        message: impl FnOnce(T) -> String,
    ) -> ToolCallResult {
        match result {
            Ok(response) => ToolCallResult::success(message(response)),
            Err(e) => {
                warn!("Tool call failed: {}", e);
                ToolCallResult::from_tool_error(&e)
            }
        }
    }

    /// Call the activity_log tool
    async fn call_activity_log(&mut self, args: HashMap<String, Value>) -> ToolCallResult {
        let log_params = tools::LogActivityParams {
            activity_type: str_arg(&args, "type").unwrap_or_default(),
            date_time: str_arg(&args, "date_time"),
            amount: args.get("amount").and_then(|v| v.as_f64()),
            notes: str_arg(&args, "notes"),
        };

        let (feed, catalog) = self.timeline.feed_and_catalog_mut();
        Self::tool_result(
            tools::log_activity(feed, catalog, log_params, Utc::now()),
            |response| format!("{}\nActivity ID: {}", response.message, response.record_id),
        )
    }

    /// Call the activity_update tool
    async fn call_activity_update(&mut self, args: HashMap<String, Value>) -> ToolCallResult {
        let update_params = tools::UpdateActivityParams {
            record_id: str_arg(&args, "record_id").unwrap_or_default(),
            activity_type: str_arg(&args, "type"),
            date_time: str_arg(&args, "date_time"),
            amount: args.get("amount").and_then(|v| v.as_f64()),
            clear_amount: args
                .get("clear_amount")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            notes: str_arg(&args, "notes"),
        };

        let (feed, catalog) = self.timeline.feed_and_catalog_mut();
        Self::tool_result(tools::update_activity(feed, catalog, update_params), |response| {
            response.message
        })
    }

    /// Call the activity_delete tool
    async fn call_activity_delete(&mut self, args: HashMap<String, Value>) -> ToolCallResult {
        let delete_params = tools::DeleteActivityParams {
            record_id: str_arg(&args, "record_id").unwrap_or_default(),
        };

        let (feed, catalog) = self.timeline.feed_and_catalog_mut();
        Self::tool_result(tools::delete_activity(feed, catalog, delete_params), |response| {
            response.message
        })
    }

    /// Call the activity_list tool
    async fn call_activity_list(&mut self, args: HashMap<String, Value>) -> ToolCallResult {
        let list_params = tools::ListActivitiesParams {
            days: args
                .get("days")
                .and_then(|v| v.as_u64())
                .map(|n| n.min(u64::from(u32::MAX)) as u32),
            types: args.get("types").and_then(|v| v.as_array()).map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect()
            }),
        };

        let default_days = self.timeline.config().list_days;
        let (feed, catalog) = self.timeline.feed_and_catalog_mut();
        Self::tool_result(
            tools::list_activities(feed, catalog, list_params, default_days),
            |response| response.message,
        )
    }

    /// Call the activity_latest tool
    async fn call_activity_latest(&self, args: HashMap<String, Value>) -> ToolCallResult {
        let latest_params = tools::LatestActivityParams {
            activity_type: str_arg(&args, "type"),
        };

        Self::tool_result(
            tools::latest_activity(
                self.timeline.feed(),
                self.timeline.catalog(),
                latest_params,
                Utc::now(),
            ),
            |response| response.message,
        )
    }

    /// Call the activity_stats tool
    async fn call_activity_stats(&self, args: HashMap<String, Value>) -> ToolCallResult {
        let stats_params = tools::ActivityStatsParams {
            activity_type: str_arg(&args, "type"),
        };

        Self::tool_result(
            tools::activity_stats(
                self.timeline.feed(),
                self.timeline.analytics(),
                self.timeline.catalog(),
                stats_params,
                Utc::now(),
            ),
            |response| response.message,
        )
    }
}
