//! Result record rendering and the data shapes of each command.

use mcpi_mcp::{Descriptor, ServerInfo};
use mcpi_types::{ResultRecord, ServerConfig, ValidationError};
use serde_json::{Map, Value, json};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    /// Reserved for a human-oriented view; renders JSON for now.
    Terminal,
}

impl OutputFormat {
    pub const VALID: [&str; 2] = ["json", "terminal"];
}

impl FromStr for OutputFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "terminal" => Ok(OutputFormat::Terminal),
            other => Err(ValidationError::InvalidInput(format!(
                "Invalid output format '{other}'. Valid options: {}",
                Self::VALID.join(", ")
            ))),
        }
    }
}

/// Writes result records in the selected format.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

impl Renderer {
    pub fn render(&self, record: &ResultRecord) -> Result<String, serde_json::Error> {
        match self.format {
            OutputFormat::Json | OutputFormat::Terminal if self.pretty => {
                serde_json::to_string_pretty(record)
            }
            OutputFormat::Json | OutputFormat::Terminal => serde_json::to_string(record),
        }
    }
}

/// `{<key>: [...], count}` for tool, resource and prompt listings.
pub fn listing(key: &str, items: &[Descriptor]) -> Value {
    let mut data = Map::new();
    data.insert(key.to_string(), json!(items));
    data.insert("count".to_string(), json!(items.len()));
    Value::Object(data)
}

pub fn tool_result(result: Value) -> Value {
    json!({ "result": result })
}

pub fn prompt_result(result: Value) -> Value {
    json!({ "result": result })
}

pub fn resource_content(content: Value) -> Value {
    json!({ "content": content })
}

pub fn server_info(info: &ServerInfo) -> Value {
    json!({ "server_info": info })
}

pub fn config_list(servers: &[ServerConfig]) -> Value {
    let entries: Vec<Value> = servers
        .iter()
        .map(|s| {
            json!({
                "name": s.name(),
                "transport": s.transport(),
                "description": s.summary(),
            })
        })
        .collect();
    json!({ "count": entries.len(), "servers": entries })
}

pub fn config_show(server: &ServerConfig) -> Value {
    json!({ "server_config": server.to_value() })
}

pub fn config_init(path: &Path, servers: &[&str]) -> Value {
    json!({ "created": path.display().to_string(), "servers": servers })
}
