//! Error types for MCP operations.

use thiserror::Error;

/// Errors from MCP server communication.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to spawn MCP server '{name}': {source}")]
    SpawnFailed {
        name: String,
        source: std::io::Error,
    },

    #[error("MCP server '{name}' has no {field} configured")]
    MissingField { name: String, field: &'static str },

    #[error("JSON-RPC error from '{server}' (code {code}): {message}")]
    JsonRpc {
        server: String,
        code: i64,
        message: String,
    },

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("MCP request '{name}' timed out after {timeout_ms}ms")]
    Timeout { name: String, timeout_ms: u64 },

    #[error("Server does not support {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, McpError::Timeout { .. })
    }
}

impl From<reqwest::Error> for McpError {
    fn from(e: reqwest::Error) -> Self {
        McpError::Http(e.to_string())
    }
}
