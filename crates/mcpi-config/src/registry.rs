//! Validated server registry built from a merged configuration record.

use crate::merge::{DEFAULTS_KEY, SERVERS_KEY};
use mcpi_types::{ConfigError, ServerConfig};
use serde_json::Value;
use std::time::Duration;

/// Output format used when `defaults.output` is not set.
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";

/// Per-call timeout used when `defaults.timeout` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Servers by name, in configuration order, plus the merged raw record.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    servers: Vec<ServerConfig>,
    raw: Value,
}

impl ServerRegistry {
    /// Validate a merged record and build a [`ServerConfig`] for each entry.
    pub fn from_merged(raw: Value) -> Result<Self, ConfigError> {
        let record = raw.as_object().ok_or_else(|| ConfigError::Invalid {
            message: "Configuration must be an object".into(),
        })?;

        let entries = match record.get(SERVERS_KEY) {
            None | Some(Value::Null) => {
                return Err(ConfigError::Invalid {
                    message: "No 'servers' section found in configuration".into(),
                });
            }
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ConfigError::Invalid {
                    message: "'servers' must be an array".into(),
                });
            }
        };
        if entries.is_empty() {
            return Err(ConfigError::NoServers);
        }

        let mut servers: Vec<ServerConfig> = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let server =
                ServerConfig::from_value(entry).map_err(|source| ConfigError::InvalidServer {
                    entry: entry_label(entry, index),
                    source,
                })?;
            match servers.iter().position(|s| s.name() == server.name()) {
                Some(existing) => servers[existing] = server,
                None => servers.push(server),
            }
        }

        Ok(Self { servers, raw })
    }

    /// Look up a server by name.
    pub fn find(&self, name: &str) -> Result<&ServerConfig, ConfigError> {
        if self.servers.is_empty() {
            return Err(ConfigError::NoServers);
        }
        self.servers
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| ConfigError::NotFound {
                name: name.to_string(),
                available: self.names().into_iter().map(str::to_string).collect(),
            })
    }

    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }

    pub fn names(&self) -> Vec<&str> {
        self.servers.iter().map(ServerConfig::name).collect()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    fn default_value(&self, key: &str) -> Option<&Value> {
        self.raw.get(DEFAULTS_KEY).and_then(|d| d.get(key))
    }

    /// `defaults.output`, falling back to `"json"`.
    pub fn output_format(&self) -> &str {
        self.default_value("output")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_OUTPUT_FORMAT)
    }

    /// `defaults.pretty`, falling back to `true`.
    pub fn pretty_print(&self) -> bool {
        self.default_value("pretty")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// `defaults.timeout` in seconds, falling back to 30.
    pub fn timeout(&self) -> Duration {
        self.default_value("timeout")
            .and_then(Value::as_f64)
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// The merged configuration record.
    pub fn to_value(&self) -> &Value {
        &self.raw
    }
}

fn entry_label(entry: &Value, index: usize) -> String {
    match entry.get("name").and_then(Value::as_str) {
        Some(name) => format!("server '{name}'"),
        None => format!("server #{index}"),
    }
}
