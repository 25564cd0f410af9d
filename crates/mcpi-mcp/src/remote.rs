//! The remote client contract the transport adapter drives.

use crate::error::McpError;
use crate::transport::McpFuture;
use mcpi_types::ServerConfig;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Feature groups a server advertised in its `initialize` result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub tools: bool,
    pub resources: bool,
    pub prompts: bool,
}

impl Capabilities {
    /// Read the `capabilities` object of an `initialize` result.
    pub fn from_initialize(result: &Value) -> Self {
        let advertised = |key: &str| {
            result
                .get("capabilities")
                .and_then(|caps| caps.get(key))
                .is_some_and(|v| !v.is_null())
        };
        Self {
            tools: advertised("tools"),
            resources: advertised("resources"),
            prompts: advertised("prompts"),
        }
    }

    /// Every capability, for clients that do not negotiate.
    pub fn all() -> Self {
        Self {
            tools: true,
            resources: true,
            prompts: true,
        }
    }
}

/// What the server said about itself during the handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "protocolVersion", skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
}

impl PeerInfo {
    pub fn from_initialize(result: &Value) -> Self {
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let server_info = result.get("serverInfo");
        Self {
            name: text(server_info.and_then(|i| i.get("name"))),
            version: text(server_info.and_then(|i| i.get("version"))),
            protocol_version: text(result.get("protocolVersion")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.version.is_none() && self.protocol_version.is_none()
    }
}

fn unsupported<'a, T: Send + 'a>(method: &'static str) -> McpFuture<'a, T> {
    Box::pin(async move { Err(McpError::Unsupported(method.to_string())) })
}

/// A live session with one MCP server.
///
/// List methods return the raw descriptor objects from the server. The
/// optional groups default to [`McpError::Unsupported`]; `capabilities()`
/// says which of them the server offers.
pub trait RemoteClient: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    fn peer_info(&self) -> PeerInfo {
        PeerInfo::default()
    }

    fn list_tools(&self) -> McpFuture<'_, Vec<Value>>;

    fn call_tool<'a>(&'a self, name: &'a str, arguments: Value) -> McpFuture<'a, Value>;

    fn list_resources(&self) -> McpFuture<'_, Vec<Value>> {
        unsupported("resources/list")
    }

    fn list_prompts(&self) -> McpFuture<'_, Vec<Value>> {
        unsupported("prompts/list")
    }

    fn read_resource<'a>(&'a self, _uri: &'a str) -> McpFuture<'a, Value> {
        unsupported("resources/read")
    }

    fn get_prompt<'a>(&'a self, _name: &'a str, _arguments: Value) -> McpFuture<'a, Value> {
        unsupported("prompts/get")
    }

    /// End the session. Never fails.
    fn disconnect(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async {})
    }
}

/// Opens a [`RemoteClient`] for a server configuration.
pub trait Connector: Send + Sync {
    fn connect<'a>(
        &'a self,
        config: &'a ServerConfig,
        timeout: Duration,
    ) -> McpFuture<'a, Box<dyn RemoteClient>>;
}
