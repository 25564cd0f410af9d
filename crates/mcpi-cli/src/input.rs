//! Validation of command-line input before anything is contacted.

use mcpi_types::ValidationError;
use serde_json::{Map, Value};

/// Reject empty or blank names, URIs and the like.
pub fn require(label: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidInput(format!("{label} is required")));
    }
    Ok(())
}

/// Parse `--args`. Missing or empty input means no arguments.
pub fn parse_arguments(raw: Option<&str>) -> Result<Value, ValidationError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Value::Object(Map::new())),
        Some(raw) => raw,
    };

    match serde_json::from_str(raw) {
        Ok(Value::Object(map)) => Ok(Value::Object(map)),
        Ok(other) => Err(ValidationError::InvalidArguments {
            message: format!("expected a JSON object, got {}", type_name(&other)),
        }),
        Err(e) => Err(ValidationError::InvalidArguments {
            message: e.to_string(),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
