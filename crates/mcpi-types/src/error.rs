//! Error hierarchy for mcp-inspector.

use std::time::Duration;
use thiserror::Error;

/// Top-level error type for all inspector operations.
#[derive(Debug, Error)]
pub enum InspectorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl InspectorError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            InspectorError::Validation(_) => ErrorKind::Validation,
            InspectorError::Config(_) => ErrorKind::Config,
            InspectorError::Adapter(e) => e.kind(),
        }
    }
}

/// Coarse error categories surfaced in result records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Config,
    Connection,
    Operation,
    Timeout,
}

impl ErrorKind {
    /// Name used for the `error.type` field of a result record.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Config => "ConfigError",
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::Operation => "OperationError",
            ErrorKind::Timeout => "TimeoutError",
        }
    }
}

/// Malformed server records or user input. Never retryable.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Server configuration must be an object")]
    NotAnObject,

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("Invalid transport '{value}'. Valid options: stdio, sse, websocket")]
    InvalidTransport { value: String },

    #[error("Missing required fields for {transport} transport: {}", fields.join(", "))]
    MissingTransportFields {
        transport: &'static str,
        fields: Vec<&'static str>,
    },

    #[error("Command must be a string or array of strings")]
    InvalidCommand,

    #[error("Command must not be empty")]
    EmptyCommand,

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid JSON arguments: {message}\nExpected format: '{{\"key\": \"value\"}}'")]
    InvalidArguments { message: String },
}

/// Errors from configuration loading and lookup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration file '{path}': {message}")]
    Parse { path: String, message: String },

    #[error("Configuration file not readable: {path}: {message}")]
    Read { path: String, message: String },

    #[error(
        "No configuration file found, so one was created at:\n  {path}\n\n\
         It contains example MCP server configurations. Edit it to add your \
         actual servers, remove or adjust the examples, and set any custom \
         defaults, then run the command again.\n\n\
         Example servers included: {}",
        servers.join(", ")
    )]
    Created { path: String, servers: Vec<String> },

    #[error("{message}")]
    Invalid { message: String },

    #[error("Invalid server configuration ({entry}): {source}")]
    InvalidServer {
        entry: String,
        #[source]
        source: ValidationError,
    },

    #[error("Server '{name}' not found. Available servers: {}", available.join(", "))]
    NotFound { name: String, available: Vec<String> },

    #[error("No servers configured. Please add servers to your configuration file.")]
    NoServers,

    #[error("Failed to write configuration file '{path}': {message}")]
    Write { path: String, message: String },

    #[error("Configuration file already exists: {path}")]
    AlreadyExists { path: String },
}

/// Errors raised by a transport adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Failed to connect to {server}: {message}")]
    Connection { server: String, message: String },

    #[error("Not connected to server")]
    NotConnected,

    #[error("Already connected to {server}; disconnect first")]
    AlreadyConnected { server: String },

    #[error("Failed to {operation}: {message}")]
    Operation { operation: String, message: String },

    #[error("{capability} are not supported by this server")]
    Unsupported { capability: String },

    #[error("{operation} timed out after {} seconds", timeout.as_secs_f64())]
    Timeout {
        operation: String,
        timeout: Duration,
    },
}

impl AdapterError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Connection { .. }
            | AdapterError::NotConnected
            | AdapterError::AlreadyConnected { .. } => ErrorKind::Connection,
            AdapterError::Operation { .. } | AdapterError::Unsupported { .. } => {
                ErrorKind::Operation
            }
            AdapterError::Timeout { .. } => ErrorKind::Timeout,
        }
    }
}
