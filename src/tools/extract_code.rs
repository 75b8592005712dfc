//! `extract_code` tool — pull fenced code blocks out of markdown text.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::server::{ServerContext, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
pub struct ExtractCodeParams {
    /// Text containing fenced code blocks.
    pub text: String,
    /// Optional directory to save the blocks into as numbered files.
    #[serde(default)]
    pub save_to_directory: Option<String>,
}

/// One extracted block: optional language tag plus body.
struct CodeBlock<'a> {
    language: Option<&'a str>,
    body: &'a str,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "extract_code".to_owned(),
        description: "Extract code blocks from markdown or text: code samples from \
            documentation, snippets from messages, or code from explanations. Identifies all \
            blocks surrounded by triple backticks, keeping their language tags."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Text containing code blocks to extract"
                },
                "save_to_directory": {
                    "type": "string",
                    "description": "Optional directory to save extracted code blocks as files. \
                        If not provided, code blocks are just returned."
                }
            },
            "required": ["text"],
            "additionalProperties": false
        }),
    }
}

/// Execute the `extract_code` tool.
pub fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: ExtractCodeParams =
        serde_json::from_value(arguments).context("invalid extract_code parameters")?;

    // Optional language tag, then a non-greedy body so adjacent blocks
    // don't merge.
    let fence = Regex::new(r"```(?:(\w+))?\s*([\s\S]*?)```")
        .context("invalid code fence pattern")?;

    let blocks: Vec<CodeBlock<'_>> = fence
        .captures_iter(&params.text)
        .map(|caps| CodeBlock {
            language: caps
                .get(1)
                .map(|m| m.as_str().trim())
                .filter(|lang| !lang.is_empty()),
            body: caps.get(2).map_or("", |m| m.as_str()),
        })
        .collect();

    if blocks.is_empty() {
        return Ok(super::text_result("No code blocks found in the text."));
    }

    match params.save_to_directory.as_deref().filter(|d| !d.is_empty()) {
        Some(dir) => save_blocks(ctx, dir, &blocks),
        None => Ok(super::text_result(render_inline(&blocks))),
    }
}

fn render_inline(blocks: &[CodeBlock<'_>]) -> String {
    let mut out = format!("Extracted {} code blocks:\n\n", blocks.len());
    for (index, block) in blocks.iter().enumerate() {
        let lang = block.language.unwrap_or("unknown");
        out.push_str(&format!(
            "Block {} ({lang}):\n```{lang}\n{}\n```\n\n",
            index + 1,
            block.body.trim_end_matches('\n')
        ));
    }
    out
}

fn save_blocks(
    ctx: &ServerContext,
    dir: &str,
    blocks: &[CodeBlock<'_>],
) -> Result<ToolCallResult> {
    let candidate = Path::new(dir);
    let directory: PathBuf = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        ctx.repo_path.join(candidate)
    };

    if let Err(e) = std::fs::create_dir_all(&directory) {
        return Ok(super::error_result(format!(
            "Error creating directory {}: {e}",
            directory.display()
        )));
    }

    let mut out = format!("Extracted {} code blocks:\n\n", blocks.len());
    let mut saved = 0usize;

    for (index, block) in blocks.iter().enumerate() {
        let extension = block.language.unwrap_or("txt");
        let filename = format!("code_block_{}.{extension}", index + 1);
        let path = directory.join(&filename);

        match std::fs::write(&path, block.body) {
            Ok(()) => {
                info!(path = %path.display(), "saved code block");
                out.push_str(&format!(
                    "Block {} ({}): Saved to {filename}\n",
                    index + 1,
                    block.language.unwrap_or("unknown")
                ));
                saved += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save code block");
                out.push_str(&format!("Block {}: Error saving: {e}\n", index + 1));
            }
        }
    }

    out.push_str(&format!(
        "\nSaved {saved} files to {}",
        directory.display()
    ));
    Ok(super::text_result(out))
}
