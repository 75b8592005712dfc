//! `aider_config` tool — full configuration introspection.
//!
//! Reports the merged configuration, every candidate config/env file with
//! its existence flag, and the names (never the values) of discovered
//! environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::{
    CONFIG_FILE_NAME, ENV_FILE_NAME, WELL_KNOWN_ENV_KEYS, config_file_candidates,
    find_git_root, load_aider_config, load_env_file,
};
use crate::server::{ServerContext, ToolCallResult, ToolDefinition};

#[derive(Debug, Deserialize)]
pub struct AiderConfigParams {
    /// Directory to resolve configuration for (default: repository root).
    #[serde(default)]
    pub directory: Option<String>,
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "aider_config".to_owned(),
        description: "Get detailed aider configuration information: all settings currently \
            applied, which configuration files are used, which environment variables are \
            available, and the configuration precedence chain."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to get configuration for (will look for .aider.conf.yml in this location)"
                }
            },
            "additionalProperties": false
        }),
    }
}

/// Execute the `aider_config` tool.
pub fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: AiderConfigParams =
        serde_json::from_value(arguments).context("invalid aider_config parameters")?;

    let directory = super::resolve_report_directory(ctx, params.directory.as_deref());
    info!(dir = %directory.display(), "resolving aider configuration");

    let config = load_aider_config(&directory, ctx.config_file.as_deref());
    let env_vars = load_env_file(&directory, ctx.env_file.as_deref());
    let git_root = find_git_root(&directory);

    let candidates = |file_name: &str, override_path: Option<&std::path::Path>| {
        config_file_candidates(&directory, file_name, override_path)
            .into_iter()
            .map(|c| json!({ "location": c.label, "path": c.path, "exists": c.exists }))
            .collect::<Vec<_>>()
    };

    let mut relevant = serde_json::Map::new();
    for key in WELL_KNOWN_ENV_KEYS {
        relevant.insert((*key).to_owned(), json!(std::env::var_os(key).is_some()));
    }

    let result = json!({
        "directory": &directory,
        "aider_config": config,
        "environment_variables": {
            // Names only; values stay out of the report.
            "found": env_vars.keys().collect::<Vec<_>>(),
            "relevant": relevant,
        },
        "config_files": candidates(CONFIG_FILE_NAME, ctx.config_file.as_deref()),
        "env_files": candidates(ENV_FILE_NAME, ctx.env_file.as_deref()),
        "git_repository": {
            "is_git_repo": git_root.is_some(),
            "git_root": git_root,
        },
    });

    let text = serde_json::to_string_pretty(&result).context("failed to render configuration")?;
    Ok(super::text_result(text))
}
