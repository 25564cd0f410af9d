//! Uniform result record handed to the output layer.

use crate::error::InspectorError;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Where a record came from.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub timestamp: String,
}

impl Metadata {
    /// Metadata stamped with the current UTC time.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            server: None,
            target: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn with_server(mut self, server: Option<String>) -> Self {
        self.server = server;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
}

/// `{status, data | error, metadata}`.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub metadata: Metadata,
}

impl ResultRecord {
    pub fn success(data: Value, metadata: Metadata) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            error: None,
            metadata,
        }
    }

    pub fn error(error: &InspectorError, metadata: Metadata) -> Self {
        Self {
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                kind: error.kind().as_str(),
                message: error.to_string(),
            }),
            metadata,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
