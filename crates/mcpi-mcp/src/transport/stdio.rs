//! Stdio transport for MCP server communication.
//!
//! Spawns a child process and manages async communication over stdin/stdout
//! using newline-delimited JSON-RPC messages.

use super::{McpFuture, PendingRequests, Transport, parse_message};
use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use mcpi_types::ServerConfig;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Grace period for the child to exit after stdin closes.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Async stdio transport for communicating with an MCP server process.
pub struct StdioTransport {
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: PendingRequests,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    child: Mutex<Child>,
    timeout: Duration,
}

impl StdioTransport {
    /// Spawn the server's command and start background reader/writer tasks.
    ///
    /// The program is `command[0]`; `command[1..]` followed by `args` are its
    /// arguments. `env` is added to the inherited environment and the process
    /// runs in `working_directory`.
    pub fn spawn(config: &ServerConfig, timeout: Duration) -> Result<Self, McpError> {
        let (program, leading_args) = config
            .command()
            .and_then(<[String]>::split_first)
            .ok_or_else(|| McpError::MissingField {
                name: config.name().to_string(),
                field: "command",
            })?;

        let mut cmd = Command::new(program);
        cmd.args(leading_args)
            .args(config.args())
            .envs(config.env())
            .current_dir(config.working_directory())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            name: program.clone(),
            source: e,
        })?;
        tracing::debug!("Spawned MCP server '{}' ({program})", config.name());

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Protocol("Child stdin was not captured".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Protocol("Child stdout was not captured".to_string()))?;

        let pending = PendingRequests::default();

        // Writer task: drains channel and writes to child stdin
        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                if stdin.write_all(msg.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.write_all(b"\n").await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        // Reader task: reads lines from stdout and dispatches responses by id
        let pending_for_reader = pending.clone();
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(message) = parse_message(&line) {
                    pending_for_reader.dispatch(message).await;
                }
            }
            // stdout closed: nobody will answer what is still outstanding
            pending_for_reader.close().await;
        });

        Ok(Self {
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            reader_handle,
            writer_handle,
            child: Mutex::new(child),
            timeout,
        })
    }

    async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let serialized = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let rx = self.pending.register(id).await;
        tracing::debug!("-> {method} (id {id})");
        if self.write_tx.send(serialized).await.is_err() {
            self.pending.cancel(id).await;
            return Err(McpError::Protocol("Writer channel closed".to_string()));
        }

        self.pending.wait(id, method, rx, self.timeout).await
    }

    async fn notify(&self, method: &str, params: Option<serde_json::Value>) -> Result<(), McpError> {
        let serialized = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| McpError::Protocol("Writer channel closed".to_string()))
    }

    /// Close stdin, give the child a moment to exit, then kill it.
    pub async fn close(self) {
        let Self {
            write_tx,
            reader_handle,
            writer_handle,
            child,
            ..
        } = self;
        let mut child = child.into_inner();

        // Dropping the channel ends the writer task, which closes stdin
        drop(write_tx);

        if tokio::time::timeout(SHUTDOWN_GRACE, child.wait())
            .await
            .is_err()
        {
            tracing::debug!("MCP server did not exit in time, killing it");
            let _ = child.kill().await;
        }

        reader_handle.abort();
        writer_handle.abort();
    }
}

impl Transport for StdioTransport {
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
        "stdio"
    }
}
