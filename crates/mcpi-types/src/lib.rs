//! Shared types and error hierarchy for mcp-inspector.

pub mod error;
pub mod report;
pub mod server;

pub use error::{AdapterError, ConfigError, ErrorKind, InspectorError, ValidationError};
pub use report::{Metadata, ResultRecord, Status};
pub use server::{ServerConfig, TransportKind};
