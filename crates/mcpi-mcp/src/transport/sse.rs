//! Server-Sent Events transport.
//!
//! The client opens a long-lived `GET` on the server URL. The first
//! `endpoint` event names the URL to `POST` requests to; responses come back
//! on the event stream as `message` events.

use super::{McpFuture, PendingRequests, Transport, parse_message};
use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use futures_util::StreamExt;
use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A single SSE event parsed from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

/// Incremental SSE parser that turns byte chunks into events.
///
/// Bytes are buffered until a whole event block has arrived, so a UTF-8
/// sequence split across chunks decodes intact.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the stream and return any complete events.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        // CRLF and LF line endings are treated alike
        self.buffer.extend(chunk.iter().copied().filter(|&b| b != b'\r'));
        let mut events = Vec::new();

        // Event blocks are separated by a blank line
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(event) = Self::parse_block(&String::from_utf8_lossy(&block[..pos])) {
                events.push(event);
            }
        }

        events
    }

    fn parse_block(block: &str) -> Option<SseEvent> {
        let mut event_type = None;
        let mut data_lines = Vec::new();

        for line in block.lines() {
            if line.starts_with(':') {
                continue;
            }

            if let Some((field, value)) = line.split_once(':') {
                let value = value.strip_prefix(' ').unwrap_or(value);
                match field {
                    "event" => event_type = Some(value.to_string()),
                    "data" => data_lines.push(value.to_string()),
                    _ => {}
                }
            } else if line == "data" {
                data_lines.push(String::new());
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
        })
    }
}

/// Legacy HTTP+SSE transport.
pub struct SseTransport {
    http: reqwest::Client,
    endpoint: Url,
    next_id: AtomicU64,
    pending: PendingRequests,
    reader_handle: JoinHandle<()>,
    timeout: Duration,
}

impl SseTransport {
    /// Open the event stream and wait for the server to announce its endpoint.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, McpError> {
        let base = Url::parse(url).map_err(|e| McpError::Http(format!("Invalid URL '{url}': {e}")))?;
        let http = reqwest::Client::builder().build()?;

        tracing::debug!("GET {base} (event stream)");
        let response = http
            .get(base.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(McpError::Http(format!("GET {base} returned {status}")));
        }

        let pending = PendingRequests::default();
        let (endpoint_tx, endpoint_rx) = oneshot::channel::<String>();

        let pending_for_reader = pending.clone();
        let reader_handle = tokio::spawn(async move {
            let mut endpoint_tx = Some(endpoint_tx);
            let mut parser = SseParser::new();
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!("SSE stream error: {e}");
                        break;
                    }
                };
                for event in parser.feed(&bytes) {
                    match event.event_type.as_deref() {
                        Some("endpoint") => {
                            if let Some(tx) = endpoint_tx.take() {
                                let _ = tx.send(event.data);
                            }
                        }
                        Some("message") | None => {
                            if let Some(message) = parse_message(&event.data) {
                                pending_for_reader.dispatch(message).await;
                            }
                        }
                        Some(other) => tracing::debug!("Ignoring SSE event '{other}'"),
                    }
                }
            }
            pending_for_reader.close().await;
        });

        let endpoint = match tokio::time::timeout(timeout, endpoint_rx).await {
            Ok(Ok(endpoint)) => endpoint,
            Ok(Err(_)) => {
                reader_handle.abort();
                return Err(McpError::Protocol(
                    "Event stream closed before the endpoint event".to_string(),
                ));
            }
            Err(_) => {
                reader_handle.abort();
                return Err(McpError::Timeout {
                    name: "endpoint".to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };
        let endpoint = base.join(endpoint.trim()).map_err(|e| {
            McpError::Protocol(format!("Invalid endpoint '{endpoint}': {e}"))
        });
        let endpoint = match endpoint {
            Ok(endpoint) => endpoint,
            Err(e) => {
                reader_handle.abort();
                return Err(e);
            }
        };
        tracing::debug!("SSE endpoint is {endpoint}");

        Ok(Self {
            http,
            endpoint,
            next_id: AtomicU64::new(1),
            pending,
            reader_handle,
            timeout,
        })
    }

    async fn post(&self, body: String) -> Result<(), McpError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(McpError::Http(format!("POST {} returned {status}: {text}", self.endpoint)));
        }
        Ok(())
    }

    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let rx = self.pending.register(id).await;
        tracing::debug!("-> {method} (id {id})");
        if let Err(e) = self.post(body).await {
            self.pending.cancel(id).await;
            return Err(e);
        }

        self.pending.wait(id, method, rx, self.timeout).await
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> Result<(), McpError> {
        let body = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.post(body).await
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader_handle.abort();
    }
}

impl Transport for SseTransport {
    fn send_request<'a>(
        &'a self,
        method: &'a str,
        params: Option<serde_json::Value>,
    ) -> McpFuture<'a, JsonRpcResponse> {
        Box::pin(self.request(method, params))
    }

    fn send_notification<'a>(
        &'a self,
        method: &'a str,
        params: Option<serde_json::Value>,
    ) -> McpFuture<'a, ()> {
        Box::pin(self.notify(method, params))
    }

    fn shutdown(self: Box<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            self.reader_handle.abort();
            self.pending.close().await;
        })
    }

    fn kind(&self) -> &'static str {
        "sse"
    }
}
