//! Multi-source configuration for mcp-inspector.
//!
//! Reads server definitions from several files with precedence:
//! explicit `--config` path > project `./.mcp-inspector.json` >
//! user `~/.mcp-inspector.json`.
//!
//! When none of them exist an example file is written and resolution fails,
//! so the first run never proceeds on a fabricated configuration.

pub mod example;
pub mod merge;
pub mod registry;
pub mod source;

pub use example::{EXAMPLE_SERVER_NAMES, create_example_config, example_config};
pub use registry::ServerRegistry;

use mcpi_types::ConfigError;
use std::path::{Path, PathBuf};

/// File name used for both the user and the project configuration.
pub const CONFIG_FILE_NAME: &str = ".mcp-inspector.json";

/// Environment variable overriding the directory holding the user config.
pub const HOME_ENV_VAR: &str = "MCP_INSPECTOR_HOME";

/// Where the implicit configuration sources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Lowest precedence source.
    pub user: PathBuf,
    /// Overrides the user source.
    pub project: PathBuf,
}

impl ConfigPaths {
    /// Default search paths: `~/.mcp-inspector.json` and `./.mcp-inspector.json`.
    pub fn discover() -> Self {
        Self {
            user: user_config_dir().join(CONFIG_FILE_NAME),
            project: PathBuf::from(".").join(CONFIG_FILE_NAME),
        }
    }
}

/// Directory holding the user configuration (`$MCP_INSPECTOR_HOME` or `~`).
pub fn user_config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(HOME_ENV_VAR) {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Loads, merges and validates configuration into a [`ServerRegistry`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    paths: ConfigPaths,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self::with_paths(ConfigPaths::discover())
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Existing sources in increasing precedence.
    pub fn sources(&self, explicit: Option<&Path>) -> Vec<PathBuf> {
        let mut sources = Vec::new();
        if self.paths.user.exists() {
            sources.push(self.paths.user.clone());
        }
        if self.paths.project.exists() && !same_file(&self.paths.project, &self.paths.user) {
            sources.push(self.paths.project.clone());
        }
        if let Some(path) = explicit {
            if path.exists() {
                sources.retain(|p| !same_file(p, path));
                sources.push(path.to_path_buf());
            } else {
                tracing::warn!("Configuration file {} does not exist", path.display());
            }
        }
        sources
    }

    /// Resolve the registry, optionally layering an explicit file on top.
    ///
    /// With no sources at all, writes the example configuration (to
    /// `explicit`, or the user path) and returns [`ConfigError::Created`].
    pub fn resolve(&self, explicit: Option<&Path>) -> Result<ServerRegistry, ConfigError> {
        let sources = self.sources(explicit);

        if sources.is_empty() {
            let target = explicit.unwrap_or(self.paths.user.as_path());
            let created = create_example_config(target)?;
            return Err(ConfigError::Created {
                path: created.display().to_string(),
                servers: EXAMPLE_SERVER_NAMES.iter().map(|s| s.to_string()).collect(),
            });
        }

        let records = sources
            .iter()
            .map(|path| source::load_source(path))
            .collect::<Result<Vec<_>, _>>()?;

        let registry = ServerRegistry::from_merged(merge::merge_sources(records))?;
        tracing::info!(
            "Resolved {} server(s) from {} configuration source(s)",
            registry.len(),
            sources.len()
        );
        Ok(registry)
    }
}

/// Whether two paths name the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
