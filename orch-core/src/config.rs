//! Runtime configuration, loaded from a `.env` file (if present) and process
//! environment variables: `KEY=VALUE` lines, `#` comments, optional quotes,
//! no multiline values.

use std::collections::HashMap;
use std::env;
use std::path::Path;

fn dotenv_path(override_dir: Option<&Path>) -> Option<std::path::PathBuf> {
    let dir = override_dir.map(Path::to_path_buf).or_else(|| env::current_dir().ok())?;
    let path = dir.join(".env");
    if path.exists() && path.is_file() {
        Some(path)
    } else {
        None
    }
}

fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((k, v)) = line.split_once('=') else {
            continue;
        };
        let key = k.trim().to_string();
        let value = v.trim().to_string();
        let value = if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
            value[1..value.len() - 1].replace("\\\"", "\"")
        } else {
            value
        };
        let value = value
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .map(str::to_string)
            .unwrap_or(value);
        if !key.is_empty() {
            out.insert(key, value);
        }
    }
    out
}

fn load_env_map(override_dir: Option<&Path>) -> HashMap<String, String> {
    match dotenv_path(override_dir) {
        Some(path) => std::fs::read_to_string(path)
            .map(|content| parse_dotenv(&content))
            .unwrap_or_default(),
        None => HashMap::new(),
    }
}

/// Orchestration-core-wide settings. Process environment variables always
/// take priority over values read from `.env`.
#[derive(Debug, Clone)]
pub struct OrchestraConfig {
    /// Root directory under which every materialized workspace must live.
    pub temp_root: String,
    /// Model identifier passed to a provider backend that doesn't get one
    /// specified per-agent.
    pub default_model: String,
    /// Per-agent-call timeout, in seconds; `None` means "provider-defined".
    pub call_timeout_secs: Option<u64>,
    /// Bounded capacity of a run's event channel.
    pub event_queue_capacity: usize,
}

impl Default for OrchestraConfig {
    fn default() -> Self {
        Self {
            temp_root: "/tmp/orchestra".to_string(),
            default_model: "claude-3-5-sonnet".to_string(),
            call_timeout_secs: None,
            event_queue_capacity: 256,
        }
    }
}

impl OrchestraConfig {
    /// Loads config from `.env` (in `override_dir` or the current directory)
    /// layered under process environment variables, falling back to defaults
    /// for anything unset.
    pub fn load(override_dir: Option<&Path>) -> Self {
        let file_vars = load_env_map(override_dir);
        let get = |key: &str| env::var(key).ok().or_else(|| file_vars.get(key).cloned());

        let defaults = Self::default();
        Self {
            temp_root: get("ORCHESTRA_TEMP_ROOT").unwrap_or(defaults.temp_root),
            default_model: get("ORCHESTRA_DEFAULT_MODEL").unwrap_or(defaults.default_model),
            call_timeout_secs: get("ORCHESTRA_CALL_TIMEOUT_SECS").and_then(|v| v.parse().ok()),
            event_queue_capacity: get("ORCHESTRA_EVENT_QUEUE_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.event_queue_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotenv_strips_quotes_and_skips_comments() {
        let parsed = parse_dotenv("# comment\nFOO=\"bar\"\nBAZ='quux'\n\nNO_EQUALS_LINE\n");
        assert_eq!(parsed.get("FOO"), Some(&"bar".to_string()));
        assert_eq!(parsed.get("BAZ"), Some(&"quux".to_string()));
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn load_falls_back_to_defaults_without_a_dotenv_file() {
        let dir = std::env::temp_dir().join("orchestra-config-test-empty");
        let _ = std::fs::create_dir_all(&dir);
        let config = OrchestraConfig::load(Some(&dir));
        assert_eq!(config.temp_root, OrchestraConfig::default().temp_root);
    }
}
