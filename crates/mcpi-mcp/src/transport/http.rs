//! Streamable HTTP transport.
//!
//! Every message is a `POST` to the server URL. A reply arrives either as a
//! plain JSON body or as an event stream carrying the response. The server
//! may assign a session id which is echoed on later requests and released
//! with `DELETE` on shutdown.

use super::{McpFuture, SseParser, Transport, parse_message};
use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use futures_util::StreamExt;
use reqwest::Url;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Header carrying the server-assigned session id.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Streamable HTTP transport.
pub struct HttpTransport {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
    session_id: Mutex<Option<String>>,
    timeout: Duration,
}

impl HttpTransport {
    /// Prepare a transport for `url`; `ws://` and `wss://` are mapped to HTTP.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, McpError> {
        let http_url = http_url(url);
        let url = Url::parse(&http_url)
            .map_err(|e| McpError::Http(format!("Invalid URL '{http_url}': {e}")))?;
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            url,
            next_id: AtomicU64::new(1),
            session_id: Mutex::new(None),
            timeout,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|id| id.clone())
    }

    async fn post(&self, body: String) -> Result<reqwest::Response, McpError> {
        let mut request = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json, text/event-stream")
            .body(body);
        if let Some(id) = self.session_id() {
            request = request.header(SESSION_HEADER, id);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(McpError::Http(format!("POST {} returned {status}: {text}", self.url)));
        }

        if let Some(id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if let Ok(mut session) = self.session_id.lock() {
                *session = Some(id.to_string());
            }
        }
        Ok(response)
    }

    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;
        tracing::debug!("-> {method} (id {id})");

        let exchange = async {
            let response = self.post(body).await?;
            if is_event_stream(&response) {
                read_event_stream(response, id).await
            } else {
                let text = response.text().await?;
                let message: JsonRpcResponse = serde_json::from_str(&text)?;
                Ok(message)
            }
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(McpError::Timeout {
                name: method.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
        }
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> Result<(), McpError> {
        let body = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.post(body).await.map(|_| ())
    }

    /// Release the server-side session, if one was assigned.
    pub async fn close(self) {
        let Some(id) = self.session_id() else {
            return;
        };
        let result = self
            .http
            .delete(self.url.clone())
            .header(SESSION_HEADER, id)
            .send()
            .await;
        if let Err(e) = result {
            tracing::debug!("Failed to close HTTP session: {e}");
        }
    }
}

impl Transport for HttpTransport {
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
        Box::pin((*self).close())
    }

    fn kind(&self) -> &'static str {
        "http"
    }
}

/// Map WebSocket schemes onto their HTTP equivalents.
pub fn http_url(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("ws://") {
        format!("http://{rest}")
    } else if let Some(rest) = url.strip_prefix("wss://") {
        format!("https://{rest}")
    } else {
        url.to_string()
    }
}

fn is_event_stream(response: &reqwest::Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/event-stream"))
}

/// Read events until the response to request `id` shows up.
async fn read_event_stream(response: reqwest::Response, id: u64) -> Result<JsonRpcResponse, McpError> {
    let mut parser = SseParser::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        for event in parser.feed(&bytes) {
            if let Some(message) = parse_message(&event.data) {
                if message.response_id() == Some(id) {
                    return Ok(message);
                }
            }
        }
    }

    Err(McpError::Protocol(format!(
        "Event stream ended without a response to request {id}"
    )))
}
