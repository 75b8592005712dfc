//! `edit_files` tool — delegates code changes to the aider CLI.
//!
//! Resolves layered configuration for the target directory, builds the
//! aider command line, and pipes the instructions to a fresh aider
//! process while the working directory is scoped to the target.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::command::{build_command, parse_option_args};
use crate::config::{env_overlay, load_aider_config, load_env_file};
use crate::error::AiderError;
use crate::process;
use crate::server::{ServerContext, ToolCallResult, ToolDefinition};
use crate::workdir::DirGuard;

#[derive(Debug, Deserialize)]
pub struct EditFilesParams {
    /// Directory aider runs in.
    pub directory: String,
    /// Instructions describing the change to make.
    pub message: String,
    /// Raw aider command-line options (`--flag`, `--no-flag`, `--key=value`).
    #[serde(default)]
    pub options: Vec<String>,
    /// Run-time limit for the aider process in seconds (default: 600).
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

const fn default_timeout() -> u64 {
    600
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "edit_files".to_owned(),
        description: "AI pair programming tool for making targeted code changes. Use this to \
            implement features, add tests, fix bugs, or refactor code in an existing codebase.\n\n\
            Requires a directory path where the code exists and a detailed message describing \
            the change. Describe one change per message; submit multiple requests for multiple \
            changes.\n\n\
            Good messages are specific about the files or components to modify, describe the \
            desired behavior clearly, and include any constraints to follow. Example: \
            \"Fix the bug in utils/date_formatter.py where dates before 1970 aren't handled \
            correctly\"."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory path where aider should run (must exist and contain code files)"
                },
                "message": {
                    "type": "string",
                    "description": "Detailed instructions for what changes aider should make to the code"
                },
                "options": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Additional command-line options to pass to aider (optional)"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Run-time limit for aider in seconds (default: 600)",
                    "default": 600
                }
            },
            "required": ["directory", "message"],
            "additionalProperties": false
        }),
    }
}

/// Execute the `edit_files` tool.
pub fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: EditFilesParams =
        serde_json::from_value(arguments).context("invalid edit_files parameters")?;

    let directory = match super::resolve_directory(ctx, &params.directory) {
        Ok(dir) => dir,
        Err(e) => return Ok(super::error_result(format!("Error: {e}"))),
    };

    info!(dir = %directory.display(), "running aider");
    debug!(message_len = params.message.len(), options = ?params.options);

    let config = load_aider_config(&directory, ctx.config_file.as_deref());
    debug!(keys = config.len(), "merged aider configuration");
    let env_vars = load_env_file(&directory, ctx.env_file.as_deref());
    let overlay = env_overlay(&env_vars);

    // Auto-accept is always forced on; without it aider would block on a
    // confirmation prompt nobody can answer.
    let mut options = crate::config::ConfigMap::new();
    options.insert("yes_always".to_owned(), Value::Bool(true));
    for (key, value) in parse_option_args(&params.options) {
        options.insert(key, value);
    }

    // The instructions go through a scoped temp file; it is removed on
    // every exit path when the handle drops.
    let mut instructions_file =
        tempfile::NamedTempFile::new().context("failed to create instructions file")?;
    instructions_file
        .write_all(params.message.as_bytes())
        .context("failed to write instructions file")?;
    instructions_file
        .flush()
        .context("failed to flush instructions file")?;
    debug!(path = %instructions_file.path().display(), "instructions written");

    let instructions = std::fs::read_to_string(instructions_file.path())
        .context("failed to read instructions file back")?;

    let base = vec![ctx.aider_path.clone()];
    let command = build_command(&base, &[], &options);
    info!(command = %command.join(" "), "running aider command");

    let guard = DirGuard::change_to(&directory)
        .with_context(|| format!("failed to enter {}", directory.display()))?;
    let run = process::run(
        &command,
        Some(&instructions),
        &overlay,
        Some(Duration::from_secs(params.timeout)),
    );
    drop(guard);

    let output = match run {
        Ok(output) => output,
        Err(e @ (AiderError::ExecutableNotFound { .. } | AiderError::ProcessTimeout { .. })) => {
            return Ok(super::error_result(format!("Error: {e}")));
        }
        Err(e) => return Err(e.into()),
    };

    if !output.success() {
        return Ok(super::error_result(format!(
            "Error making code changes (aider exited with status {}):\n{}\n\nOutput:\n{}",
            output.exit_code, output.stderr, output.stdout
        )));
    }

    // Aider can exit zero and still report a failure on stderr.
    if process::stderr_reports_error(&output.stderr) {
        return Ok(super::error_result(format!(
            "Error making code changes:\n{}\n\nOutput:\n{}",
            output.stderr, output.stdout
        )));
    }

    info!("code changes completed");
    Ok(super::text_result(format!(
        "Code changes completed successfully:\n\n{}",
        output.stdout
    )))
}
