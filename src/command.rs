//! Aider command-line construction.
//!
//! Turns a structured options map into an argument vector. The vector is
//! handed to the process runner as-is — options and file names are never
//! interpolated into a shell string.

use serde_json::Value;

use crate::config::ConfigMap;

/// Build an aider invocation from `base`, an options map, and trailing
/// file arguments.
///
/// Per option key (underscores become hyphens): `true` → `--key`, `false`
/// → `--no-key`, a list → one `--key item` pair per element in order, any
/// other non-null value → `--key value`. Null values are omitted. Files
/// come after all options; empty tokens are filtered from the result.
pub fn build_command(base: &[String], files: &[String], options: &ConfigMap) -> Vec<String> {
    let mut command: Vec<String> = base.to_vec();

    for (key, value) in options {
        let flag = key.replace('_', "-");
        match value {
            Value::Bool(true) => command.push(format!("--{flag}")),
            Value::Bool(false) => command.push(format!("--no-{flag}")),
            Value::Array(items) => {
                for item in items {
                    command.push(format!("--{flag}"));
                    command.push(value_token(item));
                }
            }
            Value::Null => {}
            other => {
                command.push(format!("--{flag}"));
                command.push(value_token(other));
            }
        }
    }

    command.extend(files.iter().cloned());
    command.retain(|token| !token.is_empty());
    command
}

/// Parse raw option strings (the `edit_files` `options` array) into an
/// options map: `--no-flag` → `flag: false`, `--key=value` → `key: value`,
/// `--flag` → `flag: true`. Hyphens in the option name become underscores
/// so the map round-trips through [`build_command`]. Tokens without a
/// leading `--` are ignored.
pub fn parse_option_args(options: &[String]) -> ConfigMap {
    let mut parsed = ConfigMap::new();

    for opt in options {
        if let Some(name) = opt.strip_prefix("--no-") {
            parsed.insert(map_key(name), Value::Bool(false));
        } else if let Some(rest) = opt.strip_prefix("--") {
            match rest.split_once('=') {
                Some((name, value)) => {
                    parsed.insert(map_key(name), Value::String(value.to_owned()));
                }
                None => {
                    parsed.insert(map_key(rest), Value::Bool(true));
                }
            }
        }
    }

    parsed
}

fn map_key(name: &str) -> String {
    name.replace('-', "_")
}

/// Stringify a scalar option value without JSON quoting.
fn value_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
