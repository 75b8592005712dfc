//! MCP server — stdio transport, JSON-RPC 2.0, newline-delimited.
//!
//! Reads one JSON-RPC request per line from stdin, dispatches to the tool
//! router, and writes responses to stdout. Implements the MCP handshake
//! (`initialize` / `notifications/initialized`), `tools/list`,
//! `tools/call`, and `ping`. All logging goes to stderr so the protocol
//! stream stays clean.
//!
//! Tool failures are not protocol errors: they come back as a normal
//! `tools/call` result with `is_error` set, so one bad call never takes
//! the server down.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::tools::ToolRouter;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// MCP protocol types
// ---------------------------------------------------------------------------

/// MCP tool definition for `tools/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// MCP `tools/call` params.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

/// One content item in a `tools/call` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// The uniform envelope every tool call returns.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

// ---------------------------------------------------------------------------
// Server context
// ---------------------------------------------------------------------------

/// Process-wide lifecycle state, established once at startup and read-only
/// for the lifetime of the server.
#[derive(Debug, Clone)]
pub struct ServerContext {
    /// Path or name of the aider executable.
    pub aider_path: String,
    /// Repository root; the default target for introspection tools and the
    /// base for relative `directory` arguments.
    pub repo_path: PathBuf,
    /// Explicit `.aider.conf.yml` override (highest config precedence).
    pub config_file: Option<PathBuf>,
    /// Explicit `.env` override (highest env-file precedence).
    pub env_file: Option<PathBuf>,
}

impl Default for ServerContext {
    fn default() -> Self {
        Self {
            aider_path: "aider".to_owned(),
            repo_path: PathBuf::from("."),
            config_file: None,
            env_file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Server main loop
// ---------------------------------------------------------------------------

/// Run the MCP server on stdin/stdout until stdin closes.
///
/// # Errors
///
/// Returns an error only if stdin/stdout I/O fails fatally; every request
/// failure is answered in-band.
pub fn run_mcp_server(ctx: ServerContext) -> Result<()> {
    info!(
        aider = %ctx.aider_path,
        repo = %ctx.repo_path.display(),
        "aider-mcp server starting"
    );

    let router = ToolRouter::new(ctx);
    let stdin = std::io::stdin();
    let mut reader = std::io::BufReader::new(stdin.lock());
    let mut stdout = std::io::stdout().lock();
    let mut line = String::new();

    loop {
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .context("failed to read from stdin")?;
        if bytes == 0 {
            info!("stdin closed, shutting down");
            break;
        }

        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        debug!(raw, "received request");

        let request: JsonRpcRequest = match serde_json::from_str(raw) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "invalid JSON-RPC request");
                write_response(
                    &mut stdout,
                    &error_response(None, -32700, &format!("parse error: {e}")),
                )?;
                continue;
            }
        };

        if request.jsonrpc != "2.0" {
            warn!(version = request.jsonrpc, "unsupported JSON-RPC version");
            write_response(
                &mut stdout,
                &error_response(
                    request.id.clone(),
                    -32600,
                    &format!(
                        "invalid request: jsonrpc version must be \"2.0\", got \"{}\"",
                        request.jsonrpc
                    ),
                ),
            )?;
            continue;
        }

        let response = dispatch(&router, &request);

        // Per JSON-RPC 2.0, notifications (no id) never get a response.
        if request.id.is_none() {
            debug!(method = request.method, "notification handled");
            continue;
        }
        if let Some(resp) = response {
            write_response(&mut stdout, &resp)?;
        }
    }

    info!("aider-mcp server stopped");
    Ok(())
}

fn dispatch(router: &ToolRouter, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => Some(handle_initialize(req)),
        "notifications/initialized" => {
            info!("client initialized");
            None
        }
        "tools/list" => Some(handle_tools_list(router, req)),
        "tools/call" => Some(handle_tools_call(router, req)),
        "ping" => Some(success_response(req.id.clone(), &serde_json::json!({}))),
        _ => {
            warn!(method = req.method, "unknown method");
            Some(error_response(
                req.id.clone(),
                -32601,
                &format!("method not found: {}", req.method),
            ))
        }
    }
}

fn handle_initialize(req: &JsonRpcRequest) -> JsonRpcResponse {
    let result = serde_json::json!({
        "protocolVersion": "2025-06-18",
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": "aider-mcp",
            "version": env!("CARGO_PKG_VERSION"),
        },
    });
    success_response(req.id.clone(), &result)
}

fn handle_tools_list(router: &ToolRouter, req: &JsonRpcRequest) -> JsonRpcResponse {
    let result = serde_json::json!({ "tools": router.list_tools() });
    success_response(req.id.clone(), &result)
}

fn handle_tools_call(router: &ToolRouter, req: &JsonRpcRequest) -> JsonRpcResponse {
    let params: ToolCallParams = match serde_json::from_value(req.params.clone()) {
        Ok(p) => p,
        Err(e) => {
            return error_response(
                req.id.clone(),
                -32602,
                &format!("invalid tools/call params: {e}"),
            );
        }
    };

    match router.call_tool(&params.name, params.arguments) {
        Ok(result) => success_response(req.id.clone(), &result),
        // The dispatcher boundary: an error escaping a handler becomes a
        // failure envelope, never a dead server.
        Err(e) => {
            error!(tool = params.name, error = %e, "tool call failed");
            let envelope = ToolCallResult {
                content: vec![ContentItem {
                    content_type: "text".to_owned(),
                    text: format!("Error executing tool {}: {e:#}", params.name),
                }],
                is_error: true,
            };
            success_response(req.id.clone(), &envelope)
        }
    }
}

// ---------------------------------------------------------------------------
// Response plumbing
// ---------------------------------------------------------------------------

fn success_response(id: Option<serde_json::Value>, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse {
            jsonrpc: "2.0".to_owned(),
            id,
            result: Some(value),
            error: None,
        },
        Err(e) => {
            error!(error = %e, "failed to serialize result");
            JsonRpcResponse {
                jsonrpc: "2.0".to_owned(),
                id,
                result: None,
                error: Some(JsonRpcError {
                    code: -32603,
                    message: format!("internal error: failed to serialize result: {e}"),
                    data: None,
                }),
            }
        }
    }
}

fn error_response(id: Option<serde_json::Value>, code: i64, message: &str) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.to_owned(),
            data: None,
        }),
    }
}

fn write_response(out: &mut impl Write, resp: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(resp).context("failed to serialize response")?;
    debug!(response = json, "sending response");
    out.write_all(json.as_bytes())
        .context("failed to write to stdout")?;
    out.write_all(b"\n").context("failed to write newline")?;
    out.flush().context("failed to flush stdout")?;
    Ok(())
}
