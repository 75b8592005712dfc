//! `aider_status` tool — environment and installation diagnostics.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::config::{
    CONFIG_FILE_NAME, WELL_KNOWN_ENV_KEYS, config_file_candidates, find_git_root,
    load_aider_config,
};
use crate::error::AiderError;
use crate::git;
use crate::process;
use crate::server::{ServerContext, ToolCallResult, ToolDefinition};
use crate::workdir::DirGuard;

/// Upper bound for the `aider --version` probe; a healthy install answers
/// in well under a second.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct AiderStatusParams {
    /// Directory to check configuration for (default: repository root).
    #[serde(default)]
    pub directory: Option<String>,
    /// Whether to check environment variables and API keys.
    #[serde(default = "default_check_environment")]
    pub check_environment: bool,
}

const fn default_check_environment() -> bool {
    true
}

pub fn tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "aider_status".to_owned(),
        description: "Check the status of aider and its environment: verify the installation, \
            check that API keys are set up, view the applied configuration, and diagnose \
            setup issues."
            .to_owned(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to check configuration for (will look for .aider.conf.yml in this location)"
                },
                "check_environment": {
                    "type": "boolean",
                    "description": "Whether to check environment variables and API keys",
                    "default": true
                }
            },
            "additionalProperties": false
        }),
    }
}

/// Execute the `aider_status` tool.
pub fn execute(ctx: &ServerContext, arguments: serde_json::Value) -> Result<ToolCallResult> {
    let params: AiderStatusParams =
        serde_json::from_value(arguments).context("invalid aider_status parameters")?;

    info!("checking aider status");

    let version_argv = vec![ctx.aider_path.clone(), "--version".to_owned()];
    let probe = match process::run(&version_argv, None, &[], Some(VERSION_PROBE_TIMEOUT)) {
        Ok(output) => output,
        Err(AiderError::ExecutableNotFound { .. }) => {
            return Ok(super::error_result(format!(
                "Error: aider executable not found at {}",
                ctx.aider_path
            )));
        }
        Err(e) => {
            return Ok(super::error_result(format!(
                "Error checking aider status: {e}"
            )));
        }
    };

    let installed = probe.success();
    let version = installed.then(|| probe.stdout.trim().to_owned());
    if let Some(v) = &version {
        info!(version = v, "detected aider version");
    }

    let directory = super::resolve_report_directory(ctx, params.directory.as_deref());
    let directory_exists = directory.is_dir();
    let git_root = find_git_root(&directory);

    let mut result = json!({
        "aider": {
            "installed": installed,
            "version": version,
            "executable_path": ctx.aider_path,
            "resolved_path": which::which(&ctx.aider_path).ok(),
        },
        "directory": {
            "path": &directory,
            "exists": directory_exists,
        },
        "git": {
            "is_git_repo": git_root.is_some(),
            "git_root": git_root,
        },
    });
    if !installed {
        result["aider"]["error"] = json!(probe.stderr.trim());
    }

    // Repo details need git running inside the directory.
    if result["git"]["is_git_repo"] == json!(true) && directory_exists {
        if let Ok(_guard) = DirGuard::change_to(&directory) {
            result["git"]["remote_url"] = json!(git::remote_origin_url());
            result["git"]["current_branch"] = json!(git::current_branch());
        }
    }

    if params.check_environment {
        // Presence only — never values.
        let mut env_status = serde_json::Map::new();
        for key in WELL_KNOWN_ENV_KEYS {
            env_status.insert(
                (*key).to_owned(),
                json!(std::env::var_os(key).is_some()),
            );
        }
        result["environment"] = serde_json::Value::Object(env_status);

        let config = load_aider_config(&directory, ctx.config_file.as_deref());
        if !config.is_empty() {
            result["config"] = serde_json::Value::Object(config);
        }

        let candidates: Vec<serde_json::Value> =
            config_file_candidates(&directory, CONFIG_FILE_NAME, ctx.config_file.as_deref())
                .into_iter()
                .map(|c| json!({ "location": c.label, "path": c.path, "exists": c.exists }))
                .collect();
        result["config_files"] = json!(candidates);
    }

    let text = serde_json::to_string_pretty(&result).context("failed to render status")?;
    Ok(super::text_result(text))
}
