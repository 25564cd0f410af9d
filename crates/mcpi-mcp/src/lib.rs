//! MCP client and transport adapter for mcp-inspector.
//!
//! Speaks JSON-RPC 2.0 to MCP servers over a child process's stdio, a
//! Server-Sent Events stream, or streamable HTTP. [`TransportAdapter`] wraps
//! a connection with per-call deadlines, capability gating and descriptor
//! normalization; [`with_session`] scopes one connection to one operation.

pub mod adapter;
pub mod client;
pub mod error;
pub mod jsonrpc;
pub mod normalize;
pub mod remote;
pub mod session;
pub mod transport;

pub use adapter::{DEFAULT_TIMEOUT, ServerInfo, TransportAdapter};
pub use client::{McpClient, McpConnector, PROTOCOL_VERSION};
pub use error::McpError;
pub use normalize::Descriptor;
pub use remote::{Capabilities, Connector, PeerInfo, RemoteClient};
pub use session::with_session;
pub use transport::{McpFuture, Transport};
