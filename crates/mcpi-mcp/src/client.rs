//! MCP client: manages one server connection.
//!
//! Handles the protocol handshake (initialize + initialized notification),
//! paginated listings and the tool, resource and prompt calls.

use crate::error::McpError;
use crate::remote::{Capabilities, Connector, PeerInfo, RemoteClient};
use crate::transport::{HttpTransport, McpFuture, SseTransport, StdioTransport, Transport};
use mcpi_types::{ServerConfig, TransportKind};
use serde_json::{Value, json};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// MCP protocol version we support.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name announced in `clientInfo`.
pub const CLIENT_NAME: &str = "mcp-inspector";

/// Client for a single MCP server.
pub struct McpClient {
    server: String,
    transport: Box<dyn Transport>,
    capabilities: Capabilities,
    peer: PeerInfo,
}

impl McpClient {
    /// Open the transport `config` asks for and perform the handshake.
    pub async fn connect(config: &ServerConfig, timeout: Duration) -> Result<Self, McpError> {
        let url = || {
            config.url().ok_or_else(|| McpError::MissingField {
                name: config.name().to_string(),
                field: "url",
            })
        };

        let transport: Box<dyn Transport> = match config.transport() {
            TransportKind::Stdio => Box::new(StdioTransport::spawn(config, timeout)?),
            TransportKind::Sse => Box::new(SseTransport::connect(url()?, timeout).await?),
            TransportKind::WebSocket => Box::new(HttpTransport::new(url()?, timeout)?),
        };

        Self::initialize(config.name(), transport).await
    }

    /// Perform the handshake over an already open transport.
    ///
    /// The transport is shut down if the handshake fails.
    pub async fn initialize(
        server: impl Into<String>,
        transport: Box<dyn Transport>,
    ) -> Result<Self, McpError> {
        let server = server.into();
        let mut client = Self {
            server,
            transport,
            capabilities: Capabilities::default(),
            peer: PeerInfo::default(),
        };

        match client.handshake().await {
            Ok(result) => {
                client.capabilities = Capabilities::from_initialize(&result);
                client.peer = PeerInfo::from_initialize(&result);
                tracing::info!(
                    "MCP server '{}' connected over {} ({})",
                    client.server,
                    client.transport.kind(),
                    client.peer.name.as_deref().unwrap_or("unnamed")
                );
                Ok(client)
            }
            Err(e) => {
                client.transport.shutdown().await;
                Err(e)
            }
        }
    }

    async fn handshake(&self) -> Result<Value, McpError> {
        let init_params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        });

        let result = self.request("initialize", Some(init_params)).await?;
        self.transport
            .send_notification("notifications/initialized", None)
            .await?;
        Ok(result)
    }

    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let resp = self.transport.send_request(method, params).await?;

        if let Some(err) = resp.error {
            return Err(McpError::JsonRpc {
                server: self.server.clone(),
                code: err.code,
                message: err.message,
            });
        }

        resp.result.ok_or_else(|| {
            McpError::Protocol(format!("{method} response has neither result nor error"))
        })
    }

    /// Collect every page of a list method, following `nextCursor`.
    async fn list_all(&self, method: &str, key: &str) -> Result<Vec<Value>, McpError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let mut result = self.request(method, params).await?;

            match result.get_mut(key).map(Value::take) {
                Some(Value::Array(page)) => items.extend(page),
                Some(Value::Null) | None => {}
                Some(_) => {
                    return Err(McpError::Protocol(format!(
                        "{method} result field '{key}' is not an array"
                    )));
                }
            }

            let next = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if next.is_none() || next == cursor {
                break;
            }
            cursor = next;
        }

        tracing::debug!("{method}: {} item(s) from '{}'", items.len(), self.server);
        Ok(items)
    }

    pub fn server_name(&self) -> &str {
        &self.server
    }

    /// Shut down the server connection.
    pub async fn shutdown(self) {
        let server = self.server;
        self.transport.shutdown().await;
        tracing::info!("MCP server '{server}' disconnected");
    }
}

impl RemoteClient for McpClient {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn peer_info(&self) -> PeerInfo {
        self.peer.clone()
    }

    fn list_tools(&self) -> McpFuture<'_, Vec<Value>> {
        Box::pin(self.list_all("tools/list", "tools"))
    }

    fn call_tool<'a>(&'a self, name: &'a str, arguments: Value) -> McpFuture<'a, Value> {
        Box::pin(self.request(
            "tools/call",
            Some(json!({ "name": name, "arguments": arguments })),
        ))
    }

    fn list_resources(&self) -> McpFuture<'_, Vec<Value>> {
        Box::pin(self.list_all("resources/list", "resources"))
    }

    fn list_prompts(&self) -> McpFuture<'_, Vec<Value>> {
        Box::pin(self.list_all("prompts/list", "prompts"))
    }

    fn read_resource<'a>(&'a self, uri: &'a str) -> McpFuture<'a, Value> {
        Box::pin(self.request("resources/read", Some(json!({ "uri": uri }))))
    }

    fn get_prompt<'a>(&'a self, name: &'a str, arguments: Value) -> McpFuture<'a, Value> {
        Box::pin(self.request(
            "prompts/get",
            Some(json!({ "name": name, "arguments": arguments })),
        ))
    }

    fn disconnect(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin((*self).shutdown())
    }
}

/// Connects real MCP servers over the transport their config names.
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector;

impl Connector for McpConnector {
    fn connect<'a>(
        &'a self,
        config: &'a ServerConfig,
        timeout: Duration,
    ) -> McpFuture<'a, Box<dyn RemoteClient>> {
        Box::pin(async move {
            let client = McpClient::connect(config, timeout).await?;
            Ok(Box::new(client) as Box<dyn RemoteClient>)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonrpc::JsonRpcResponse;
    use std::sync::Mutex;

    /// Replays scripted replies in order, one per request.
    struct ScriptedTransport {
        replies: Mutex<Vec<Value>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Value>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn send_request<'a>(
            &'a self,
            _method: &'a str,
            _params: Option<Value>,
        ) -> McpFuture<'a, JsonRpcResponse> {
            let reply = self.replies.lock().unwrap().pop();
            Box::pin(async move {
                let reply = reply.ok_or_else(|| McpError::Protocol("no scripted reply".into()))?;
                Ok(serde_json::from_value(reply)?)
            })
        }

        fn send_notification<'a>(
            &'a self,
            _method: &'a str,
            _params: Option<Value>,
        ) -> McpFuture<'a, ()> {
            Box::pin(async { Ok(()) })
        }

        fn shutdown(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
            Box::pin(async {})
        }

        fn kind(&self) -> &'static str {
            "scripted"
        }
    }

    fn init_reply() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}, "resources": {}},
                "serverInfo": {"name": "scripted", "version": "0.0.1"}
            }
        })
    }

    #[tokio::test]
    async fn handshake_reads_capabilities_and_peer() {
        let transport = ScriptedTransport::new(vec![init_reply()]);
        let client = McpClient::initialize("demo", Box::new(transport)).await.unwrap();
        let caps = client.capabilities();
        assert!(caps.tools && caps.resources && !caps.prompts);
        assert_eq!(client.peer_info().name.as_deref(), Some("scripted"));
        assert_eq!(client.server_name(), "demo");
    }

    #[tokio::test]
    async fn handshake_error_is_reported() {
        let transport = ScriptedTransport::new(vec![json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32602, "message": "Unsupported protocol version"}
        })]);
        let result = McpClient::initialize("demo", Box::new(transport)).await;
        match result {
            Err(McpError::JsonRpc { server, code, .. }) => {
                assert_eq!(server, "demo");
                assert_eq!(code, -32602);
            }
            Err(other) => panic!("Expected JsonRpc, got: {other:?}"),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn list_follows_cursor() {
        let transport = ScriptedTransport::new(vec![
            init_reply(),
            json!({"jsonrpc": "2.0", "id": 2, "result": {
                "tools": [{"name": "a"}], "nextCursor": "page-2"
            }}),
            json!({"jsonrpc": "2.0", "id": 3, "result": {"tools": [{"name": "b"}]}}),
        ]);
        let client = McpClient::initialize("demo", Box::new(transport)).await.unwrap();
        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn repeated_cursor_stops_pagination() {
        let transport = ScriptedTransport::new(vec![
            init_reply(),
            json!({"jsonrpc": "2.0", "id": 2, "result": {"prompts": [{"name": "p"}], "nextCursor": "x"}}),
            json!({"jsonrpc": "2.0", "id": 3, "result": {"prompts": [{"name": "q"}], "nextCursor": "x"}}),
        ]);
        let client = McpClient::initialize("demo", Box::new(transport)).await.unwrap();
        let prompts = client.list_prompts().await.unwrap();
        assert_eq!(prompts.len(), 2);
    }

    #[tokio::test]
    async fn non_array_listing_is_protocol_error() {
        let transport = ScriptedTransport::new(vec![
            init_reply(),
            json!({"jsonrpc": "2.0", "id": 2, "result": {"resources": "nope"}}),
        ]);
        let client = McpClient::initialize("demo", Box::new(transport)).await.unwrap();
        let err = client.list_resources().await.unwrap_err();
        assert!(matches!(err, McpError::Protocol(_)));
    }

    #[tokio::test]
    async fn call_tool_returns_result_unchanged() {
        let transport = ScriptedTransport::new(vec![
            init_reply(),
            json!({"jsonrpc": "2.0", "id": 2, "result": {
                "content": [{"type": "text", "text": "hi"}], "isError": false
            }}),
        ]);
        let client = McpClient::initialize("demo", Box::new(transport)).await.unwrap();
        let result = client.call_tool("echo", json!({"text": "hi"})).await.unwrap();
        assert_eq!(result["content"][0]["text"], "hi");
    }

    #[tokio::test]
    async fn empty_response_is_protocol_error() {
        let transport = ScriptedTransport::new(vec![
            init_reply(),
            json!({"jsonrpc": "2.0", "id": 2}),
        ]);
        let client = McpClient::initialize("demo", Box::new(transport)).await.unwrap();
        let err = client.read_resource("file:///x").await.unwrap_err();
        assert!(err.to_string().contains("resources/read"));
    }
}
