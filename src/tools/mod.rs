//! Tool router — registers and dispatches MCP tool calls.
//!
//! Each tool module exports a `tool_definition()` (name, description, JSON
//! Schema) and an `execute(&ServerContext, arguments)` returning the
//! uniform [`ToolCallResult`] envelope. The router owns the immutable
//! server context and dispatches by tool name.

pub mod aider_config;
pub mod aider_status;
pub mod create_files;
pub mod edit_files;
pub mod extract_code;
pub mod git_status;

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::error::AiderError;
use crate::server::{ContentItem, ServerContext, ToolCallResult, ToolDefinition};

/// Wrap plain text in a success envelope.
pub(crate) fn text_result(text: impl Into<String>) -> ToolCallResult {
    ToolCallResult {
        content: vec![ContentItem {
            content_type: "text".to_owned(),
            text: text.into(),
        }],
        is_error: false,
    }
}

/// Wrap plain text in a failure envelope.
pub(crate) fn error_result(text: impl Into<String>) -> ToolCallResult {
    ToolCallResult {
        content: vec![ContentItem {
            content_type: "text".to_owned(),
            text: text.into(),
        }],
        is_error: true,
    }
}

/// Resolve a tool's `directory` argument to an existing absolute
/// directory. Relative paths are taken against the repository root.
///
/// Runs before any configuration work or subprocess spawn — a missing
/// directory fails the call outright.
pub(crate) fn resolve_directory(ctx: &ServerContext, raw: &str) -> Result<PathBuf, AiderError> {
    let candidate = Path::new(raw);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        ctx.repo_path.join(candidate)
    };

    match joined.canonicalize() {
        Ok(path) if path.is_dir() => Ok(path),
        _ => Err(AiderError::DirectoryNotFound { path: joined }),
    }
}

/// Resolve the optional `directory` argument of the introspection tools.
/// These report on a missing directory rather than failing, so there is
/// no existence requirement — just absolutization against the repo root.
pub(crate) fn resolve_report_directory(ctx: &ServerContext, raw: Option<&str>) -> PathBuf {
    match raw {
        Some(dir) if !dir.is_empty() => {
            let candidate = Path::new(dir);
            if candidate.is_absolute() {
                candidate.to_path_buf()
            } else {
                ctx.repo_path.join(candidate)
            }
        }
        _ => ctx.repo_path.clone(),
    }
}

/// Dispatches MCP tool calls to their implementations.
pub struct ToolRouter {
    ctx: ServerContext,
}

impl ToolRouter {
    pub const fn new(ctx: ServerContext) -> Self {
        Self { ctx }
    }

    /// All tool definitions, in the order they are advertised.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        vec![
            edit_files::tool_definition(),
            create_files::tool_definition(),
            git_status::tool_definition(),
            extract_code::tool_definition(),
            aider_status::tool_definition(),
            aider_config::tool_definition(),
        ]
    }

    /// Call a tool by name with the given JSON arguments.
    ///
    /// # Errors
    ///
    /// Returns an error only when a handler fails unexpectedly; the server
    /// boundary converts that into a failure envelope. Domain failures
    /// (missing directory, aider errors, git errors) come back as
    /// `Ok` envelopes with `is_error` set.
    pub fn call_tool(&self, name: &str, arguments: serde_json::Value) -> Result<ToolCallResult> {
        debug!(tool = name, "dispatching tool call");

        match name {
            "edit_files" => edit_files::execute(&self.ctx, arguments),
            "create_files" => create_files::execute(&self.ctx, arguments),
            "git_status" => git_status::execute(&self.ctx, arguments),
            "extract_code" => extract_code::execute(&self.ctx, arguments),
            "aider_status" => aider_status::execute(&self.ctx, arguments),
            "aider_config" => aider_config::execute(&self.ctx, arguments),
            _ => Ok(error_result(format!("Unknown tool: {name}"))),
        }
    }
}
