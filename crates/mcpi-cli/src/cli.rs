//! Command-line surface.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "mcp-inspector",
    version,
    about = "Inspect and exercise Model Context Protocol servers"
)]
pub struct Cli {
    /// Configuration file layered over the user and project files
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the configured server to connect to
    #[arg(short, long, global = true)]
    pub server: Option<String>,

    /// Output format (json, terminal)
    #[arg(short, long, global = true, value_name = "FORMAT")]
    pub output: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true, overrides_with = "no_pretty")]
    pub pretty: bool,

    /// Compact JSON output
    #[arg(long, global = true, overrides_with = "pretty")]
    pub no_pretty: bool,

    /// Seconds to wait for the connection and for each request
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<f64>,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// `Some` only when one of `--pretty` / `--no-pretty` was given.
    pub fn pretty_override(&self) -> Option<bool> {
        match (self.pretty, self.no_pretty) {
            (_, true) => Some(false),
            (true, false) => Some(true),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List tools, resources or prompts offered by a server
    List {
        #[arg(value_enum)]
        kind: ListKind,
    },

    /// Execute a tool
    Execute {
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(short, long, value_name = "JSON")]
        args: Option<String>,
    },

    /// Read a resource by URI
    Read { uri: String },

    /// Render a prompt
    Prompt {
        name: String,
        /// Prompt arguments as a JSON object
        #[arg(short, long, value_name = "JSON")]
        args: Option<String>,
    },

    /// Show server name, transport and capabilities
    Info,

    /// Manage the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    Tools,
    Resources,
    Prompts,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ListKind::Tools => "tools",
            ListKind::Resources => "resources",
            ListKind::Prompts => "prompts",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// List configured servers
    List,
    /// Show one server's configuration
    Show { name: String },
    /// Write an example configuration file
    Init {
        /// Defaults to the user configuration path
        path: Option<PathBuf>,
    },
}
