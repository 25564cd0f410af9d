//! Command execution: validate input, resolve configuration, run one
//! operation inside a server session and shape its data.

use crate::cli::{Cli, Command, ConfigCommand, ListKind};
use crate::input::{parse_arguments, require};
use crate::output::{self, OutputFormat, Renderer};
use mcpi_config::{ConfigResolver, EXAMPLE_SERVER_NAMES, ServerRegistry, create_example_config};
use mcpi_mcp::{Connector, McpConnector, TransportAdapter, with_session};
use mcpi_types::{InspectorError, Metadata, ValidationError};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Successful command output before it is wrapped in a result record.
#[derive(Debug)]
pub struct Outcome {
    pub data: Value,
    pub metadata: Metadata,
}

/// Runs one CLI command against the resolved configuration.
pub struct Inspector {
    resolver: ConfigResolver,
    connector: Arc<dyn Connector>,
    config_path: Option<PathBuf>,
    server: Option<String>,
    output: Option<OutputFormat>,
    pretty: Option<bool>,
    timeout: Option<Duration>,
    registry: Option<ServerRegistry>,
}

impl Inspector {
    /// Validates the global options; nothing is read or contacted yet.
    pub fn new(resolver: ConfigResolver, cli: &Cli) -> Result<Self, ValidationError> {
        let output = cli.output.as_deref().map(str::parse::<OutputFormat>).transpose()?;
        let timeout = cli.timeout.map(parse_timeout).transpose()?;
        Ok(Self {
            resolver,
            connector: Arc::new(McpConnector),
            config_path: cli.config.clone(),
            server: cli.server.clone(),
            output,
            pretty: cli.pretty_override(),
            timeout,
            registry: None,
        })
    }

    pub fn with_connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = connector;
        self
    }

    pub async fn run(&mut self, command: &Command) -> Result<Outcome, InspectorError> {
        match command {
            Command::List { kind } => self.list(*kind).await,
            Command::Execute { tool, args } => self.execute_tool(tool, args.as_deref()).await,
            Command::Read { uri } => self.read_resource(uri).await,
            Command::Prompt { name, args } => self.get_prompt(name, args.as_deref()).await,
            Command::Info => self.server_info().await,
            Command::Config { command } => match command {
                ConfigCommand::List => self.config_list(),
                ConfigCommand::Show { name } => self.config_show(name),
                ConfigCommand::Init { path } => self.config_init(path.clone()),
            },
        }
    }

    /// CLI flags first, then configured defaults (if the configuration was
    /// loaded), then compiled-in defaults.
    pub fn renderer(&self) -> Renderer {
        let fallback = Renderer::default();
        let configured_format = self.registry.as_ref().and_then(|registry| {
            registry
                .output_format()
                .parse::<OutputFormat>()
                .inspect_err(|e| tracing::warn!("Ignoring configured output format: {e}"))
                .ok()
        });
        Renderer {
            format: self
                .output
                .or(configured_format)
                .unwrap_or(fallback.format),
            pretty: self
                .pretty
                .or_else(|| self.registry.as_ref().map(ServerRegistry::pretty_print))
                .unwrap_or(fallback.pretty),
        }
    }

    /// Metadata for an error record.
    pub fn error_metadata(&self) -> Metadata {
        Metadata::new("error").with_server(self.server.clone())
    }

    async fn list(&mut self, kind: ListKind) -> Result<Outcome, InspectorError> {
        let items = self
            .with_server(async |adapter: &TransportAdapter| {
                let items = match kind {
                    ListKind::Tools => adapter.list_tools().await?,
                    ListKind::Resources => adapter.list_resources().await?,
                    ListKind::Prompts => adapter.list_prompts().await?,
                };
                Ok::<_, InspectorError>(items)
            })
            .await?;
        Ok(self.outcome(
            output::listing(kind.as_str(), &items),
            format!("list_{}", kind.as_str()),
            None,
        ))
    }

    async fn execute_tool(&mut self, tool: &str, args: Option<&str>) -> Result<Outcome, InspectorError> {
        require("Tool name", tool)?;
        let arguments = parse_arguments(args)?;
        let result = self
            .with_server(async |adapter: &TransportAdapter| {
                Ok::<_, InspectorError>(adapter.execute_tool(tool, arguments).await?)
            })
            .await?;
        Ok(self.outcome(output::tool_result(result), "execute_tool", Some(tool)))
    }

    async fn read_resource(&mut self, uri: &str) -> Result<Outcome, InspectorError> {
        require("Resource URI", uri)?;
        let content = self
            .with_server(async |adapter: &TransportAdapter| {
                Ok::<_, InspectorError>(adapter.read_resource(uri).await?)
            })
            .await?;
        Ok(self.outcome(output::resource_content(content), "read_resource", Some(uri)))
    }

    async fn get_prompt(&mut self, name: &str, args: Option<&str>) -> Result<Outcome, InspectorError> {
        require("Prompt name", name)?;
        let arguments = parse_arguments(args)?;
        let result = self
            .with_server(async |adapter: &TransportAdapter| {
                Ok::<_, InspectorError>(adapter.get_prompt(name, arguments).await?)
            })
            .await?;
        Ok(self.outcome(output::prompt_result(result), "get_prompt", Some(name)))
    }

    async fn server_info(&mut self) -> Result<Outcome, InspectorError> {
        let info = self
            .with_server(async |adapter: &TransportAdapter| {
                Ok::<_, InspectorError>(adapter.server_info().await?)
            })
            .await?;
        Ok(self.outcome(output::server_info(&info), "server_info", None))
    }

    fn config_list(&mut self) -> Result<Outcome, InspectorError> {
        let data = output::config_list(self.registry()?.servers());
        Ok(self.outcome(data, "config_list", None))
    }

    fn config_show(&mut self, name: &str) -> Result<Outcome, InspectorError> {
        require("Server name", name)?;
        let data = output::config_show(self.registry()?.find(name)?);
        Ok(self.outcome(data, "config_show", Some(name)))
    }

    fn config_init(&mut self, path: Option<PathBuf>) -> Result<Outcome, InspectorError> {
        let target = path.unwrap_or_else(|| self.resolver.paths().user.clone());
        let created = create_example_config(&target)?;
        let data = output::config_init(&created, &EXAMPLE_SERVER_NAMES);
        let target = created.display().to_string();
        Ok(self.outcome(data, "config_init", Some(&target)))
    }

    /// Connect to the `--server` server, run `operation`, then disconnect.
    async fn with_server<T>(
        &mut self,
        operation: impl AsyncFnOnce(&TransportAdapter) -> Result<T, InspectorError>,
    ) -> Result<T, InspectorError> {
        let name = self
            .server
            .clone()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| {
                ValidationError::InvalidInput(
                    "--server option is required for this command".to_string(),
                )
            })?;
        let cli_timeout = self.timeout;
        let connector = Arc::clone(&self.connector);

        let registry = self.registry()?;
        let config = registry.find(&name)?.clone();
        let timeout = cli_timeout.unwrap_or_else(|| registry.timeout());

        tracing::debug!("Running against '{name}' with a {timeout:?} timeout");
        let mut adapter = TransportAdapter::with_connector(connector).with_timeout(timeout);
        with_session(&mut adapter, &config, operation).await
    }

    /// Resolve the configuration once and keep it for output settings.
    fn registry(&mut self) -> Result<&ServerRegistry, InspectorError> {
        let registry = match self.registry.take() {
            Some(registry) => registry,
            None => self.resolver.resolve(self.config_path.as_deref())?,
        };
        Ok(self.registry.insert(registry))
    }

    fn outcome(&self, data: Value, operation: impl Into<String>, target: Option<&str>) -> Outcome {
        let mut metadata = Metadata::new(operation).with_server(self.server.clone());
        if let Some(target) = target {
            metadata = metadata.with_target(target);
        }
        Outcome { data, metadata }
    }
}

fn parse_timeout(secs: f64) -> Result<Duration, ValidationError> {
    let invalid = || {
        ValidationError::InvalidInput(format!(
            "Invalid timeout '{secs}'. Expected a positive number of seconds"
        ))
    };
    if secs <= 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use mcpi_config::ConfigPaths;
    use mcpi_mcp::{Capabilities, McpError, McpFuture, PeerInfo, RemoteClient};
    use mcpi_types::{ConfigError, ErrorKind, ServerConfig};
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    struct StubClient;

    impl RemoteClient for StubClient {
        fn capabilities(&self) -> Capabilities {
            Capabilities {
                tools: true,
                resources: true,
                prompts: false,
            }
        }

        fn peer_info(&self) -> PeerInfo {
            PeerInfo {
                name: Some("stub".into()),
                version: Some("0.1.0".into()),
                protocol_version: None,
            }
        }

        fn list_tools(&self) -> McpFuture<'_, Vec<Value>> {
            Box::pin(async {
                Ok(vec![json!({"name": "echo", "description": "Echo", "inputSchema": {"type": "object"}})])
            })
        }

        fn call_tool<'a>(&'a self, name: &'a str, arguments: Value) -> McpFuture<'a, Value> {
            Box::pin(async move {
                if name == "fail" {
                    return Err(McpError::Protocol("tool exploded".into()));
                }
                Ok(json!({"content": [{"type": "text", "text": arguments.to_string()}]}))
            })
        }

        fn list_resources(&self) -> McpFuture<'_, Vec<Value>> {
            Box::pin(async { Ok(vec![json!({"uri": "file:///notes.txt", "mimeType": "text/plain"})]) })
        }

        fn read_resource<'a>(&'a self, uri: &'a str) -> McpFuture<'a, Value> {
            Box::pin(async move { Ok(json!([{"uri": uri, "text": "hello"}])) })
        }
    }

    struct StubConnector;

    impl Connector for StubConnector {
        fn connect<'a>(
            &'a self,
            _config: &'a ServerConfig,
            _timeout: Duration,
        ) -> McpFuture<'a, Box<dyn RemoteClient>> {
            Box::pin(async { Ok(Box::new(StubClient) as Box<dyn RemoteClient>) })
        }
    }

    const CONFIG: &str = r#"{
        "servers": [
            {"name": "stub", "transport": "stdio", "command": "stub-server --flag"},
            {"name": "remote", "transport": "sse", "url": "http://localhost:8080/sse"}
        ],
        "defaults": {"pretty": false, "timeout": 5}
    }"#;

    fn resolver(dir: &Path) -> ConfigResolver {
        ConfigResolver::with_paths(ConfigPaths {
            user: dir.join("user.json"),
            project: dir.join("project.json"),
        })
    }

    fn configured_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("user.json"), CONFIG).unwrap();
        dir
    }

    async fn run(dir: &Path, argv: &[&str]) -> (Inspector, Result<Outcome, InspectorError>) {
        let cli = Cli::try_parse_from(std::iter::once("mcp-inspector").chain(argv.iter().copied()))
            .unwrap();
        let mut inspector = Inspector::new(resolver(dir), &cli)
            .unwrap()
            .with_connector(Arc::new(StubConnector));
        let outcome = inspector.run(&cli.command).await;
        (inspector, outcome)
    }

    #[tokio::test]
    async fn list_tools_shapes_normalized_descriptors() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["list", "tools", "--server", "stub"]).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data["count"], 1);
        assert_eq!(outcome.data["tools"][0]["name"], "echo");
        assert_eq!(outcome.data["tools"][0]["inputSchema"]["type"], "object");
        assert_eq!(outcome.metadata.operation, "list_tools");
        assert_eq!(outcome.metadata.server.as_deref(), Some("stub"));
    }

    #[tokio::test]
    async fn unadvertised_prompts_list_empty() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["list", "prompts", "-s", "stub"]).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data, json!({"prompts": [], "count": 0}));
    }

    #[tokio::test]
    async fn execute_passes_arguments_through() {
        let dir = configured_dir();
        let (_, outcome) = run(
            dir.path(),
            &["execute", "echo", "--args", r#"{"msg": "hi"}"#, "--server", "stub"],
        )
        .await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data["result"]["content"][0]["text"], r#"{"msg":"hi"}"#);
        assert_eq!(outcome.metadata.operation, "execute_tool");
        assert_eq!(outcome.metadata.target.as_deref(), Some("echo"));
    }

    #[tokio::test]
    async fn failing_tool_reports_operation_error() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["execute", "fail", "--server", "stub"]).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        assert!(err.to_string().contains("Failed to execute tool 'fail'"));
    }

    #[tokio::test]
    async fn malformed_arguments_rejected_before_connecting() {
        let dir = configured_dir();
        // The server does not exist either: validation must come first
        let (_, outcome) = run(dir.path(), &["execute", "echo", "--args", "{oops", "-s", "nope"]).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().starts_with("Invalid JSON arguments:"));
    }

    #[tokio::test]
    async fn read_resource_returns_content() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["read", "file:///notes.txt", "-s", "stub"]).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data["content"][0]["text"], "hello");
        assert_eq!(outcome.metadata.target.as_deref(), Some("file:///notes.txt"));
    }

    #[tokio::test]
    async fn prompt_on_server_without_prompts_is_unsupported() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["prompt", "greet", "-s", "stub"]).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Operation);
        assert!(err.to_string().contains("Prompts"));
    }

    #[tokio::test]
    async fn server_info_reports_capabilities() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["info", "-s", "stub"]).await;
        let info = &outcome.unwrap().data["server_info"];
        assert_eq!(info["name"], "stub");
        assert_eq!(info["transport"], "stdio");
        assert_eq!(info["connected"], true);
        assert_eq!(info["capabilities"], json!(["tools", "resources"]));
        assert_eq!(info["server"]["name"], "stub");
    }

    #[tokio::test]
    async fn server_commands_require_server_option() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["list", "tools"]).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "--server option is required for this command");
    }

    #[tokio::test]
    async fn unknown_server_lists_available() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["info", "-s", "missing"]).await;
        let err = outcome.unwrap_err();
        assert!(matches!(
            err,
            InspectorError::Config(ConfigError::NotFound { .. })
        ));
        assert!(err.to_string().contains("stub, remote"));
    }

    #[tokio::test]
    async fn config_list_summarizes_servers() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["config", "list"]).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data["count"], 2);
        assert_eq!(outcome.data["servers"][0]["description"], "stub-server --flag (stdio)");
        assert_eq!(outcome.metadata.operation, "config_list");
    }

    #[tokio::test]
    async fn config_show_returns_server_record() {
        let dir = configured_dir();
        let (_, outcome) = run(dir.path(), &["config", "show", "remote"]).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data["server_config"]["url"], "http://localhost:8080/sse");
        assert_eq!(outcome.metadata.target.as_deref(), Some("remote"));
    }

    #[tokio::test]
    async fn config_init_writes_example_once() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("inspector.json");
        let target_arg = target.display().to_string();

        let (_, outcome) = run(dir.path(), &["config", "init", &target_arg]).await;
        let outcome = outcome.unwrap();
        assert_eq!(outcome.data["created"], target_arg);
        assert_eq!(outcome.data["servers"], json!(EXAMPLE_SERVER_NAMES));
        assert!(target.exists());

        let (_, outcome) = run(dir.path(), &["config", "init", &target_arg]).await;
        assert!(matches!(
            outcome.unwrap_err(),
            InspectorError::Config(ConfigError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn first_run_creates_example_and_fails() {
        let dir = TempDir::new().unwrap();
        let (_, outcome) = run(dir.path(), &["config", "list"]).await;
        assert!(matches!(
            outcome.unwrap_err(),
            InspectorError::Config(ConfigError::Created { .. })
        ));
        assert!(dir.path().join("user.json").exists());
    }

    #[tokio::test]
    async fn renderer_prefers_flags_over_configured_defaults() {
        let dir = configured_dir();
        let (inspector, _) = run(dir.path(), &["config", "list"]).await;
        assert!(!inspector.renderer().pretty);

        let (inspector, _) = run(dir.path(), &["config", "list", "--pretty"]).await;
        assert!(inspector.renderer().pretty);
    }

    #[tokio::test]
    async fn renderer_defaults_without_configuration() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["mcp-inspector", "config", "list"]).unwrap();
        let inspector = Inspector::new(resolver(dir.path()), &cli).unwrap();
        let renderer = inspector.renderer();
        assert_eq!(renderer.format, OutputFormat::Json);
        assert!(renderer.pretty);
    }

    #[test]
    fn invalid_global_options_rejected() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["mcp-inspector", "-o", "yaml", "info"]).unwrap();
        let err = Inspector::new(resolver(dir.path()), &cli).err().unwrap();
        assert!(err.to_string().starts_with("Invalid output format 'yaml'"));

        let cli = Cli::try_parse_from(["mcp-inspector", "--timeout", "0", "info"]).unwrap();
        assert!(Inspector::new(resolver(dir.path()), &cli).is_err());
    }

    #[test]
    fn timeout_parsing() {
        assert_eq!(parse_timeout(2.5).unwrap(), Duration::from_millis(2500));
        assert!(parse_timeout(-1.0).is_err());
        assert!(parse_timeout(f64::NAN).is_err());

        let err = parse_timeout(1e30).unwrap_err();
        assert!(err.to_string().starts_with("Invalid timeout"));
    }

    #[tokio::test]
    async fn oversized_configured_timeout_uses_default() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("user.json"),
            r#"{"servers": [{"name": "stub", "transport": "stdio", "command": "stub"}],
                "defaults": {"timeout": 1e30}}"#,
        )
        .unwrap();
        let (_, outcome) = run(dir.path(), &["list", "tools", "-s", "stub"]).await;
        assert_eq!(outcome.unwrap().data["count"], 1);
    }

    #[test]
    fn error_metadata_carries_server() {
        let dir = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["mcp-inspector", "info", "-s", "fs"]).unwrap();
        let inspector = Inspector::new(resolver(dir.path()), &cli).unwrap();
        let metadata = inspector.error_metadata();
        assert_eq!(metadata.operation, "error");
        assert_eq!(metadata.server.as_deref(), Some("fs"));
    }
}
