//! `git_status` tool — categorized repository status.
//!
//! Parses `git status --porcelain` into Modified / Added / Deleted /
//! Untracked sections. A clean tree gets a distinct report with the most
//! recent commits and the branch list instead of empty sections.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::git;
use crate::server::{ServerContext, ToolCallResult, ToolDefinition};
use crate::workdir::DirGuard;

#[derive(Debug, Deserialize)]
pub struct GitStatusParams {
    /// Directory of the git repository to inspect.
    pub directory: String,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "git_status".to_owned(),
        description: "Get the current git status of a repository. Shows modified, added, \
            deleted, and untracked files, plus any staged diff. Use this to understand the \
            state of the repository before making changes."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "The directory path of the git repository to check"
                }
            },
            "required": ["directory"],
            "additionalProperties": false
        }),
    }
}

/// Execute the `git_status` tool.
pub fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: GitStatusParams =
        serde_json::from_value(arguments).context("invalid git_status parameters")?;

    let directory = match super::resolve_directory(ctx, &params.directory) {
        Ok(dir) => dir,
        Err(e) => return Ok(super::error_result(format!("Error: {e}"))),
    };

    let _guard = DirGuard::change_to(&directory)
        .with_context(|| format!("failed to enter {}", directory.display()))?;

    if !git::is_inside_work_tree() {
        return Ok(super::error_result(format!(
            "Error: not a git repository in {}",
            directory.display()
        )));
    }

    let porcelain = match git::porcelain_status() {
        Ok(status) => status,
        Err(e) => {
            return Ok(super::error_result(format!(
                "Error getting git status:\n{e}"
            )));
        }
    };

    let report = if porcelain.trim().is_empty() {
        debug!("working tree is clean");
        clean_report()
    } else {
        changed_report(&porcelain)
    };

    Ok(super::text_result(report))
}

fn clean_report() -> String {
    let mut out = String::from("# Git Repository Status\n\n**Working directory is clean**\n");

    // Both queries fail on a repo with no commits yet; the clean header
    // alone is still a valid report.
    if let Some(commits) = git::recent_commits(5).filter(|c| !c.trim().is_empty()) {
        out.push_str(&format!("\n## Recent Commits\n```\n{commits}```\n"));
    }
    if let Some(branches) = git::branches().filter(|b| !b.trim().is_empty()) {
        out.push_str(&format!("\n## Branches\n```\n{branches}```\n"));
    }

    out
}

fn changed_report(porcelain: &str) -> String {
    let mut modified: Vec<&str> = Vec::new();
    let mut added: Vec<&str> = Vec::new();
    let mut deleted: Vec<&str> = Vec::new();
    let mut untracked: Vec<&str> = Vec::new();

    // Porcelain v1: two status characters, a space, then the path.
    for line in porcelain.lines() {
        let (Some(code), Some(name)) = (line.get(..2), line.get(3..)) else {
            continue;
        };
        if code == "??" {
            untracked.push(name);
        } else if code.contains('M') {
            modified.push(name);
        } else if code.contains('A') {
            added.push(name);
        } else if code.contains('D') {
            deleted.push(name);
        }
    }

    let mut out = String::from("# Git Repository Status\n\n");
    for (title, files) in [
        ("Modified Files", &modified),
        ("Added Files", &added),
        ("Deleted Files", &deleted),
        ("Untracked Files", &untracked),
    ] {
        if files.is_empty() {
            continue;
        }
        out.push_str(&format!("## {title}\n"));
        for file in files {
            out.push_str(&format!("- {file}\n"));
        }
        out.push('\n');
    }

    if let Some(diff) = git::staged_diff().filter(|d| !d.trim().is_empty()) {
        out.push_str(&format!("## Staged Changes\n```diff\n{diff}```\n"));
    }

    out
}
