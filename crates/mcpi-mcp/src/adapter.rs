//! Transport adapter: one connection, guarded calls, normalized results.
//!
//! Every remote call runs under a deadline. Transport failures are turned
//! into [`AdapterError`]s naming the operation that failed.

use crate::client::McpConnector;
use crate::error::McpError;
use crate::normalize::{Descriptor, normalize_all};
use crate::remote::{Capabilities, Connector, PeerInfo, RemoteClient};
use crate::transport::McpFuture;
use mcpi_types::{AdapterError, ServerConfig, TransportKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Deadline applied to connect and to each remote call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection details reported by [`TransportAdapter::server_info`].
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub transport: TransportKind,
    pub connected: bool,
    pub capabilities: Vec<&'static str>,
    #[serde(skip_serializing_if = "PeerInfo::is_empty")]
    pub server: PeerInfo,
}

struct Connection {
    server: String,
    transport: TransportKind,
    client: Box<dyn RemoteClient>,
}

/// Drives one server session over whichever transport its config names.
pub struct TransportAdapter {
    connector: Arc<dyn Connector>,
    timeout: Duration,
    connection: Option<Connection>,
}

impl Default for TransportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportAdapter {
    /// An adapter that connects real MCP servers.
    pub fn new() -> Self {
        Self::with_connector(Arc::new(McpConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            timeout: DEFAULT_TIMEOUT,
            connection: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Open a session with `config`'s server.
    ///
    /// Fails with [`AdapterError::AlreadyConnected`] if a session is open.
    pub async fn connect(&mut self, config: &ServerConfig) -> Result<(), AdapterError> {
        if let Some(existing) = &self.connection {
            return Err(AdapterError::AlreadyConnected {
                server: existing.server.clone(),
            });
        }

        tracing::debug!(
            "Connecting to '{}' via {}",
            config.name(),
            config.transport()
        );
        let connection_error = |message: String| AdapterError::Connection {
            server: config.name().to_string(),
            message,
        };

        let attempt = self.connector.connect(config, self.timeout);
        let client = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(Ok(client)) => client,
            Ok(Err(e)) => return Err(connection_error(e.to_string())),
            Err(_) => {
                return Err(connection_error(format!(
                    "timed out after {} seconds",
                    self.timeout.as_secs_f64()
                )));
            }
        };

        self.connection = Some(Connection {
            server: config.name().to_string(),
            transport: config.transport(),
            client,
        });
        tracing::info!("Connected to '{}'", config.name());
        Ok(())
    }

    /// Close the session if one is open. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.client.disconnect().await;
            tracing::info!("Disconnected from '{}'", connection.server);
        }
    }

    fn connection(&self) -> Result<&Connection, AdapterError> {
        self.connection.as_ref().ok_or(AdapterError::NotConnected)
    }

    fn capabilities(&self) -> Result<Capabilities, AdapterError> {
        Ok(self.connection()?.client.capabilities())
    }

    /// Run `call` under the deadline, labelling failures with `operation`.
    async fn guarded<T>(&self, operation: String, call: McpFuture<'_, T>) -> Result<T, AdapterError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) if e.is_timeout() => Err(AdapterError::Timeout {
                operation,
                timeout: self.timeout,
            }),
            Ok(Err(e)) => Err(operation_error(operation, e)),
            Err(_) => Err(AdapterError::Timeout {
                operation,
                timeout: self.timeout,
            }),
        }
    }

    pub async fn list_tools(&self) -> Result<Vec<Descriptor>, AdapterError> {
        let client = &self.connection()?.client;
        let tools = self.guarded("list tools".into(), client.list_tools()).await?;
        Ok(normalize_all(&tools))
    }

    /// Empty when the server does not offer resources.
    pub async fn list_resources(&self) -> Result<Vec<Descriptor>, AdapterError> {
        if !self.capabilities()?.resources {
            return Ok(Vec::new());
        }
        let client = &self.connection()?.client;
        let resources = self
            .guarded("list resources".into(), client.list_resources())
            .await?;
        Ok(normalize_all(&resources))
    }

    /// Empty when the server does not offer prompts.
    pub async fn list_prompts(&self) -> Result<Vec<Descriptor>, AdapterError> {
        if !self.capabilities()?.prompts {
            return Ok(Vec::new());
        }
        let client = &self.connection()?.client;
        let prompts = self
            .guarded("list prompts".into(), client.list_prompts())
            .await?;
        Ok(normalize_all(&prompts))
    }

    pub async fn execute_tool(&self, name: &str, arguments: Value) -> Result<Value, AdapterError> {
        let client = &self.connection()?.client;
        self.guarded(
            format!("execute tool '{name}'"),
            client.call_tool(name, arguments),
        )
        .await
    }

    pub async fn read_resource(&self, uri: &str) -> Result<Value, AdapterError> {
        if !self.capabilities()?.resources {
            return Err(AdapterError::Unsupported {
                capability: "Resources".into(),
            });
        }
        let client = &self.connection()?.client;
        self.guarded(format!("read resource '{uri}'"), client.read_resource(uri))
            .await
    }

    pub async fn get_prompt(&self, name: &str, arguments: Value) -> Result<Value, AdapterError> {
        if !self.capabilities()?.prompts {
            return Err(AdapterError::Unsupported {
                capability: "Prompts".into(),
            });
        }
        let client = &self.connection()?.client;
        self.guarded(
            format!("get prompt '{name}'"),
            client.get_prompt(name, arguments),
        )
        .await
    }

    /// Connection details plus the capabilities that actually answer.
    ///
    /// Each group is probed with its list call. Operation failures drop the
    /// group; timeouts and connection errors propagate.
    pub async fn server_info(&self) -> Result<ServerInfo, AdapterError> {
        let connection = self.connection()?;
        let advertised = connection.client.capabilities();
        let mut capabilities = Vec::new();

        if probe(self.list_tools().await)? {
            capabilities.push("tools");
        }
        if advertised.resources && probe(self.list_resources().await)? {
            capabilities.push("resources");
        }
        if advertised.prompts && probe(self.list_prompts().await)? {
            capabilities.push("prompts");
        }

        Ok(ServerInfo {
            name: connection.server.clone(),
            transport: connection.transport,
            connected: true,
            capabilities,
            server: connection.client.peer_info(),
        })
    }
}

fn operation_error(operation: String, error: McpError) -> AdapterError {
    AdapterError::Operation {
        operation,
        message: error.to_string(),
    }
}

/// `Ok(true)` if the probe answered, `Ok(false)` on an operation failure.
fn probe<T>(result: Result<T, AdapterError>) -> Result<bool, AdapterError> {
    match result {
        Ok(_) => Ok(true),
        Err(AdapterError::Operation { .. } | AdapterError::Unsupported { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
