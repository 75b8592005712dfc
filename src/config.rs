//! Layered configuration resolution.
//!
//! Aider reads `.aider.conf.yml` and `.env` files from several locations.
//! The precedence chain, highest to lowest:
//!
//! 1. explicit override path (startup flag)
//! 2. `<target directory>/.aider.conf.yml`
//! 3. `<git root>/.aider.conf.yml` (only when the git root differs from the
//!    target directory)
//! 4. `~/.aider.conf.yml`
//!
//! Sources are merged lowest-precedence first, each later source
//! overwriting keys it redefines, so the highest-precedence source wins on
//! conflicts while non-conflicting keys from every source survive. A source
//! that cannot be read or parsed is logged and skipped; resolution never
//! fails as a whole.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

/// Aider's YAML configuration file name.
pub const CONFIG_FILE_NAME: &str = ".aider.conf.yml";
/// Aider's environment file name.
pub const ENV_FILE_NAME: &str = ".env";

/// Credential/model variables the introspection tools report the presence
/// of. Presence only — values are never echoed back.
pub const WELL_KNOWN_ENV_KEYS: &[&str] =
    &["OPENAI_API_KEY", "ANTHROPIC_API_KEY", "AIDER_MODEL"];

/// Merged configuration snapshot. Built fresh per resolution call.
pub type ConfigMap = serde_json::Map<String, serde_json::Value>;

/// Variables loaded from `.env` files, distinct from the process
/// environment until explicitly applied to a child process.
pub type EnvMap = BTreeMap<String, String>;

/// A candidate configuration source, for the introspection tools.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Where in the chain this candidate sits: `home`, `git_root`,
    /// `directory`, or `custom`.
    pub label: &'static str,
    pub path: PathBuf,
    pub exists: bool,
}

/// Walk upward from `path` until a directory containing `.git` is found.
///
/// Returns `None` when no ancestor up to the filesystem root is a git
/// working-tree top level.
pub fn find_git_root(path: &Path) -> Option<PathBuf> {
    path.ancestors()
        .find(|dir| dir.join(".git").is_dir())
        .map(Path::to_path_buf)
}

/// Merged `.aider.conf.yml` configuration for `dir`.
pub fn load_aider_config(dir: &Path, override_path: Option<&Path>) -> ConfigMap {
    let sources = search_paths(dir, CONFIG_FILE_NAME, override_path);
    debug!(dir = %dir.display(), sources = sources.len(), "resolving aider config");
    merge_config_sources(&sources)
}

/// Merged `.env` variables for `dir`.
pub fn load_env_file(dir: &Path, override_path: Option<&Path>) -> EnvMap {
    let mut env = EnvMap::new();
    for path in search_paths(dir, ENV_FILE_NAME, override_path) {
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                info!(path = %path.display(), "loading .env file");
                parse_env_lines(&content, &path, &mut env);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to read .env file, skipping"),
        }
    }
    env
}

/// The subset of `env` not already present in the process environment.
///
/// The result is applied to spawned child processes; loaded variables never
/// override what the operator exported before starting the server.
pub fn env_overlay(env: &EnvMap) -> Vec<(String, String)> {
    env.iter()
        .filter(|(key, _)| std::env::var_os(key).is_none())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Every candidate source for `file_name`, lowest precedence first, with
/// existence flags. Used by `aider_status` / `aider_config` reporting.
pub fn config_file_candidates(
    dir: &Path,
    file_name: &str,
    override_path: Option<&Path>,
) -> Vec<ConfigSource> {
    let mut candidates = Vec::new();
    let mut push = |label, path: PathBuf| {
        candidates.push(ConfigSource {
            label,
            exists: path.exists(),
            path,
        });
    };

    if let Some(home) = dirs::home_dir() {
        push("home", home.join(file_name));
    }
    if let Some(root) = find_git_root(dir) {
        if root != dir {
            push("git_root", root.join(file_name));
        }
    }
    push("directory", dir.join(file_name));
    if let Some(path) = override_path {
        push("custom", path.to_path_buf());
    }

    candidates
}

/// Existing source files for `file_name`, ordered lowest precedence first
/// and deduplicated (e.g. when the target directory is the git root or the
/// home directory, its file appears once).
fn search_paths(dir: &Path, file_name: &str, override_path: Option<&Path>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut push = |path: PathBuf, paths: &mut Vec<PathBuf>| {
        if path.exists() && !paths.contains(&path) {
            paths.push(path);
        }
    };

    if let Some(home) = dirs::home_dir() {
        push(home.join(file_name), &mut paths);
    }
    if let Some(root) = find_git_root(dir) {
        if root != dir {
            push(root.join(file_name), &mut paths);
        }
    }
    push(dir.join(file_name), &mut paths);
    if let Some(path) = override_path {
        push(path.to_path_buf(), &mut paths);
    }

    paths
}

/// Merge YAML mappings from `paths`, later entries overwriting earlier
/// ones. Unreadable, unparseable, and non-mapping sources are skipped with
/// a warning.
fn merge_config_sources(paths: &[PathBuf]) -> ConfigMap {
    let mut merged = ConfigMap::new();

    for path in paths {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config file, skipping");
                continue;
            }
        };

        match serde_yaml::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(map)) => {
                info!(path = %path.display(), keys = map.len(), "loaded aider config");
                for (key, value) in map {
                    merged.insert(key, value);
                }
            }
            // An empty file parses as null; nothing to merge.
            Ok(serde_json::Value::Null) => {}
            Ok(_) => {
                warn!(path = %path.display(), "config file is not a YAML mapping, skipping");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse config file, skipping");
            }
        }
    }

    merged
}

/// Parse `KEY=VALUE` lines into `out`. Blank lines and `#` comments are
/// skipped; a line with no `=` is skipped with a warning. Only the first
/// `=` separates key from value.
fn parse_env_lines(content: &str, origin: &Path, out: &mut EnvMap) {
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.split_once('=') {
            Some((key, value)) => {
                out.insert(key.trim().to_owned(), value.trim().to_owned());
            }
            None => {
                warn!(
                    path = %origin.display(),
                    line = index + 1,
                    "ignoring malformed .env line (no '=' separator)"
                );
            }
        }
    }
}
