//! Example configuration written for first-time users.

use mcpi_types::ConfigError;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

/// Names of the servers in [`example_config`].
pub const EXAMPLE_SERVER_NAMES: [&str; 2] = ["filesystem-server", "github-server"];

/// Two illustrative stdio servers plus default output settings.
pub fn example_config() -> Value {
    json!({
        "servers": [
            {
                "name": EXAMPLE_SERVER_NAMES[0],
                "transport": "stdio",
                "command": ["npx", "-y", "@modelcontextprotocol/server-filesystem"],
                "args": ["/tmp"],
                "env": {}
            },
            {
                "name": EXAMPLE_SERVER_NAMES[1],
                "transport": "stdio",
                "command": ["npx", "-y", "@modelcontextprotocol/server-github"],
                "env": {
                    "GITHUB_TOKEN": "${GITHUB_TOKEN}"
                }
            }
        ],
        "defaults": {
            "output": "json",
            "pretty": true
        }
    })
}

/// Write [`example_config`] to `path` as pretty JSON.
///
/// Refuses to overwrite an existing file. Parent directories are created.
pub fn create_example_config(path: &Path) -> Result<PathBuf, ConfigError> {
    let write_err = |message: String| ConfigError::Write {
        path: path.display().to_string(),
        message,
    };

    if path.exists() {
        return Err(ConfigError::AlreadyExists {
            path: path.display().to_string(),
        });
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
    }

    let content =
        serde_json::to_string_pretty(&example_config()).map_err(|e| write_err(e.to_string()))?;
    std::fs::write(path, content + "\n").map_err(|e| write_err(e.to_string()))?;

    tracing::info!("Wrote example configuration to {}", path.display());
    Ok(path.to_path_buf())
}
