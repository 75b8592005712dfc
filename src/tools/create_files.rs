//! `create_files` tool — write new files and optionally commit them.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::fsutil::{resolve_within, write_atomic};
use crate::git;
use crate::server::{ServerContext, ToolCallResult, ToolDefinition};
use crate::workdir::DirGuard;

#[derive(Debug, Deserialize)]
pub struct CreateFilesParams {
    /// Directory the files belong to; paths outside it are rejected.
    pub directory: String,
    /// Map of file name (relative to `directory`, or absolute) to content.
    pub files: BTreeMap<String, String>,
    /// Commit message when `git_commit` is set.
    #[serde(default = "default_message")]
    pub message: String,
    /// Whether to stage and commit the written files (default: true).
    #[serde(default = "default_commit")]
    pub git_commit: bool,
}

fn default_message() -> String {
    "Create files via aider-mcp".to_owned()
}

const fn default_commit() -> bool {
    true
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "create_files".to_owned(),
        description: "Create new files in a repository: source files, configuration, \
            documentation, or scaffolding for a new feature. Provide a map of filenames to \
            content, and specify whether the files should be committed to git."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory path where files should be created"
                },
                "files": {
                    "type": "object",
                    "description": "Dictionary of filename to content",
                    "additionalProperties": { "type": "string" }
                },
                "message": {
                    "type": "string",
                    "description": "Commit message for the new files",
                    "default": "Create files via aider-mcp"
                },
                "git_commit": {
                    "type": "boolean",
                    "description": "Whether to automatically commit the files to git",
                    "default": true
                }
            },
            "required": ["directory", "files"],
            "additionalProperties": false
        }),
    }
}

/// Execute the `create_files` tool.
pub fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: CreateFilesParams =
        serde_json::from_value(arguments).context("invalid create_files parameters")?;

    let directory = match super::resolve_directory(ctx, &params.directory) {
        Ok(dir) => dir,
        Err(e) => return Ok(super::error_result(format!("Error: {e}"))),
    };

    info!(count = params.files.len(), dir = %directory.display(), "creating files");

    let guard = DirGuard::change_to(&directory)
        .with_context(|| format!("failed to enter {}", directory.display()))?;

    let mut created: Vec<String> = Vec::new();
    let mut skipped: Vec<String> = Vec::new();

    for (name, content) in &params.files {
        // Path-traversal guard: a name resolving outside the target
        // directory is skipped and reported, not a whole-call failure.
        let Some(path) = resolve_within(&directory, name) else {
            warn!(file = name, "skipping file outside target directory");
            skipped.push(name.clone());
            continue;
        };

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(file = name, error = %e, "failed to create parent directories");
                skipped.push(name.clone());
                continue;
            }
        }

        if path.exists() {
            warn!(file = name, "file already exists, overwriting");
        }

        match write_atomic(&path, content) {
            Ok(()) => {
                info!(file = name, "created file");
                created.push(name.clone());
            }
            Err(e) => {
                warn!(file = name, error = %e, "failed to write file");
                skipped.push(name.clone());
            }
        }
    }

    let mut report_lines = vec![format!("Created {} files:", created.len())];
    report_lines.extend(created.iter().map(|file| format!("- {file}")));
    if !skipped.is_empty() {
        report_lines.push(format!("\nSkipped {} files:", skipped.len()));
        report_lines.extend(skipped.iter().map(|file| format!("- {file}")));
    }
    let mut result = report_lines.join("\n");

    if params.git_commit && !created.is_empty() {
        result.push_str(&commit_created_files(&created, &params.message));
    }

    drop(guard);
    Ok(super::text_result(result))
}

/// Stage and commit the written files. Runs with the working directory
/// already scoped to the target, and always reports in-band: a git
/// problem never undoes the writes.
fn commit_created_files(files: &[String], message: &str) -> String {
    if !git::is_inside_work_tree() {
        warn!("target directory is not a git work tree, skipping commit");
        return "\n\nFiles were created but not committed: not a git repository.".to_owned();
    }

    if let Err(e) = git::stage(files) {
        return format!("\n\nError adding files to git:\n{e}");
    }

    match git::commit(message) {
        Ok(out) if out.success() => format!("\n\nCommitted files:\n{}", out.stdout),
        Ok(out) => {
            let combined = format!("{}\n{}", out.stdout, out.stderr);
            // An empty commit is informational, not a failure.
            if combined.to_lowercase().contains("nothing to commit") {
                info!("no changes to commit");
                "\n\nNo changes to commit.".to_owned()
            } else {
                format!("\n\nError committing files:\n{}", combined.trim())
            }
        }
        Err(e) => format!("\n\nError in git operations: {e}"),
    }
}
