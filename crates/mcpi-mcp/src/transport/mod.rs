//! Transports carrying JSON-RPC messages to and from an MCP server.
//!
//! - [`StdioTransport`]: child process, newline-delimited JSON over stdin/stdout
//! - [`SseTransport`]: `GET` event stream for replies, `POST` for requests
//! - [`HttpTransport`]: streamable HTTP, one `POST` per message

mod http;
mod sse;
mod stdio;

pub use http::HttpTransport;
pub use sse::{SseEvent, SseParser, SseTransport};
pub use stdio::StdioTransport;

use crate::error::McpError;
use crate::jsonrpc::JsonRpcResponse;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};

/// A boxed future resolving to an MCP result.
pub type McpFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, McpError>> + Send + 'a>>;

/// A bidirectional JSON-RPC channel to one server.
///
/// Dyn-compatible so the client can hold any transport as `Box<dyn Transport>`.
pub trait Transport: Send + Sync {
    /// Send a request and wait for the matching response.
    fn send_request<'a>(
        &'a self,
        method: &'a str,
        params: Option<serde_json::Value>,
    ) -> McpFuture<'a, JsonRpcResponse>;

    /// Send a notification; no response is expected.
    fn send_notification<'a>(
        &'a self,
        method: &'a str,
        params: Option<serde_json::Value>,
    ) -> McpFuture<'a, ()>;

    /// Release the underlying process or connection.
    fn shutdown(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>>;

    /// Short transport label for logging.
    fn kind(&self) -> &'static str;
}

/// Requests awaiting a response, keyed by JSON-RPC id.
#[derive(Clone, Default)]
pub(crate) struct PendingRequests {
    inner: Arc<Mutex<HashMap<u64, oneshot::Sender<JsonRpcResponse>>>>,
}

impl PendingRequests {
    pub(crate) async fn register(&self, id: u64) -> oneshot::Receiver<JsonRpcResponse> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().await.insert(id, tx);
        rx
    }

    pub(crate) async fn cancel(&self, id: u64) {
        self.inner.lock().await.remove(&id);
    }

    /// Route a response to its waiter. Messages with no waiter are dropped.
    pub(crate) async fn dispatch(&self, message: JsonRpcResponse) {
        let Some(id) = message.response_id() else {
            tracing::debug!(
                "Ignoring server-initiated message {}",
                message.method.as_deref().unwrap_or("<unknown>")
            );
            return;
        };
        if let Some(tx) = self.inner.lock().await.remove(&id) {
            let _ = tx.send(message);
        }
    }

    /// Fail every outstanding request; used when the connection goes away.
    pub(crate) async fn close(&self) {
        self.inner.lock().await.clear();
    }

    /// Wait for the response to request `id`, giving up after `timeout`.
    pub(crate) async fn wait(
        &self,
        id: u64,
        method: &str,
        rx: oneshot::Receiver<JsonRpcResponse>,
        timeout: Duration,
    ) -> Result<JsonRpcResponse, McpError> {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(McpError::Protocol(format!(
                "Connection closed before a response to {method} arrived"
            ))),
            Err(_) => {
                self.cancel(id).await;
                Err(McpError::Timeout {
                    name: method.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}

/// Parse one JSON-RPC message, logging and skipping anything unparseable.
pub(crate) fn parse_message(text: &str) -> Option<JsonRpcResponse> {
    match serde_json::from_str(text) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!("Failed to parse MCP message: {e}: {text}");
            None
        }
    }
}
