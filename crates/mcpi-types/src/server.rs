//! Validated description of one MCP server.
//!
//! A [`ServerConfig`] is built once from an untyped record (a JSON object as
//! found in a configuration file) and never mutated afterwards.

use crate::error::ValidationError;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Working directory used when a record does not name one.
pub const DEFAULT_WORKING_DIRECTORY: &str = ".";

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// How the inspector reaches a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Stdio,
    Sse,
    WebSocket,
}

impl TransportKind {
    pub const ALL: [TransportKind; 3] = [
        TransportKind::Stdio,
        TransportKind::Sse,
        TransportKind::WebSocket,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Sse => "sse",
            TransportKind::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidTransport {
                value: s.to_string(),
            })
    }
}

/// Configuration for a single MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    name: String,
    transport: TransportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    command: Option<Vec<String>>,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    working_directory: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl ServerConfig {
    /// Validate a raw record, expanding `${VAR}` placeholders in `env` from
    /// the process environment.
    pub fn from_value(raw: &Value) -> Result<Self, ValidationError> {
        Self::from_value_with_env(raw, |name| std::env::var(name).ok())
    }

    /// Like [`ServerConfig::from_value`], resolving placeholders through `lookup`.
    pub fn from_value_with_env<F>(raw: &Value, lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let record = raw.as_object().ok_or(ValidationError::NotAnObject)?;

        let missing: Vec<&'static str> = ["name", "transport"]
            .into_iter()
            .filter(|field| is_absent(record, field))
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        let name = match &record["name"] {
            Value::String(s) if !s.trim().is_empty() => s.clone(),
            other => {
                return Err(ValidationError::InvalidField {
                    field: "name".into(),
                    message: format!("expected a non-empty string, got {other}"),
                });
            }
        };

        let transport = match &record["transport"] {
            Value::String(s) => s.parse::<TransportKind>()?,
            other => {
                return Err(ValidationError::InvalidTransport {
                    value: other.to_string(),
                });
            }
        };

        match transport {
            TransportKind::Stdio if is_absent(record, "command") => {
                return Err(ValidationError::MissingTransportFields {
                    transport: "stdio",
                    fields: vec!["command"],
                });
            }
            TransportKind::Sse | TransportKind::WebSocket if is_absent(record, "url") => {
                return Err(ValidationError::MissingTransportFields {
                    transport: "URL-based",
                    fields: vec!["url"],
                });
            }
            _ => {}
        }

        let command = match record.get("command") {
            None | Some(Value::Null) => None,
            Some(value) => Some(parse_command(value)?),
        };

        let args = match record.get("args") {
            None | Some(Value::Null) => Vec::new(),
            Some(value) => string_list("args", value)?,
        };

        let env = match record.get("env") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(value) => parse_env(value, &lookup)?,
        };

        let working_directory = match record
            .get("working_directory")
            .or_else(|| record.get("workingDirectory"))
        {
            None | Some(Value::Null) => DEFAULT_WORKING_DIRECTORY.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(ValidationError::InvalidField {
                    field: "working_directory".into(),
                    message: format!("expected a string, got {other}"),
                });
            }
        };

        let url = match record.get("url") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(ValidationError::InvalidField {
                    field: "url".into(),
                    message: format!("expected a string, got {other}"),
                });
            }
        };

        Ok(Self {
            name,
            transport,
            command,
            args,
            env,
            working_directory,
            url,
        })
    }

    /// Parse a JSON document holding a single server record.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        let raw: Value =
            serde_json::from_str(json).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
        Self::from_value(&raw)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transport(&self) -> TransportKind {
        self.transport
    }

    pub fn command(&self) -> Option<&[String]> {
        self.command.as_deref()
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_stdio(&self) -> bool {
        self.transport == TransportKind::Stdio
    }

    pub fn is_sse(&self) -> bool {
        self.transport == TransportKind::Sse
    }

    pub fn is_websocket(&self) -> bool {
        self.transport == TransportKind::WebSocket
    }

    /// One-line description, e.g. `npx -y server (stdio)`.
    pub fn summary(&self) -> String {
        match (self.transport, &self.command, &self.url) {
            (TransportKind::Stdio, Some(command), _) => {
                format!("{} ({})", command.join(" "), self.transport)
            }
            (_, _, Some(url)) => format!("{url} ({})", self.transport),
            _ => format!("{} transport", self.transport),
        }
    }

    /// Plain mapping with absent optional fields omitted.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn is_absent(record: &Map<String, Value>, field: &str) -> bool {
    matches!(record.get(field), None | Some(Value::Null))
}

fn parse_command(value: &Value) -> Result<Vec<String>, ValidationError> {
    let command = match value {
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or(ValidationError::InvalidCommand)
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(ValidationError::InvalidCommand),
    };
    if command.is_empty() {
        return Err(ValidationError::EmptyCommand);
    }
    Ok(command)
}

fn string_list(field: &str, value: &Value) -> Result<Vec<String>, ValidationError> {
    let invalid = || ValidationError::InvalidField {
        field: field.to_string(),
        message: "expected an array of strings".into(),
    };
    value
        .as_array()
        .ok_or_else(invalid)?
        .iter()
        .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
        .collect()
}

fn parse_env<F>(value: &Value, lookup: &F) -> Result<BTreeMap<String, String>, ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let map = value
        .as_object()
        .ok_or_else(|| ValidationError::InvalidField {
            field: "env".into(),
            message: "expected an object".into(),
        })?;

    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => expand_env_placeholders(s, lookup),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(ValidationError::InvalidField {
                        field: format!("env.{key}"),
                        message: format!("expected a string, got {other}"),
                    });
                }
            };
            Ok((key.clone(), value))
        })
        .collect()
}

/// Replace every `${NAME}` with `lookup(NAME)`; unresolved tokens stay as written.
pub fn expand_env_placeholders<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(value, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
