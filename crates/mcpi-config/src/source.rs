//! Reading a single configuration file into a raw record.

use mcpi_types::ConfigError;
use serde_json::{Map, Value};
use std::path::Path;

/// Parse the file at `path` as JSON, or as TOML when it ends in `.toml`.
///
/// The top level must be an object.
pub fn load_source(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    tracing::debug!("Loaded configuration source {}", path.display());
    parse_source(path, &content)
}

/// Parse already-read `content`, using `path` for format detection and errors.
pub fn parse_source(path: &Path, content: &str) -> Result<Map<String, Value>, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    };

    let value: Value = if is_toml(path) {
        toml::from_str(content).map_err(|e| parse_err(e.to_string()))?
    } else {
        serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::Invalid {
            message: format!(
                "Configuration file '{}' must contain an object at the top level",
                path.display()
            ),
        }),
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
