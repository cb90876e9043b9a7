//! # clidoc-mcp
//!
//! MCP server that turns a free-text CLI question into the matching
//! subcommand's usage documentation. Agents call `command_docs` with what
//! the user wants to do and always get text back: the docs, or a
//! description of why they could not be fetched.
//!
//! ## Usage
//!
//! ```bash
//! # Serve over stdio (what MCP hosts launch)
//! clidoc-mcp
//!
//! # Answer one question and exit
//! clidoc-mcp --ask "how do I build my function"
//!
//! # Use markdown docs instead of `yomo <sub> --help`
//! clidoc-mcp --docs-dir ./docs
//! ```

use std::panic;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::ServerInfo;
use rmcp::{ServerHandler, ServiceExt, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clidoc::{ClidocConfig, Command, Dispatcher, classify};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "clidoc-mcp")]
#[command(about = "MCP server routing CLI questions to subcommand documentation")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Config file (default: .clidoc/config.toml in the current directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root program whose subcommands are documented
    #[arg(long)]
    tool: Option<String>,

    /// Event tag for dispatch log records
    #[arg(long)]
    event: Option<String>,

    /// Read documentation from <DIR>/<subcommand>.md
    #[arg(long, value_name = "DIR")]
    docs_dir: Option<PathBuf>,

    /// Answer one question on stdout and exit
    #[arg(long, value_name = "TEXT", conflicts_with = "classify")]
    ask: Option<String>,

    /// Print the subcommand TEXT routes to and exit
    #[arg(long, value_name = "TEXT")]
    classify: Option<String>,
}

impl Args {
    fn load_config(&self) -> Result<ClidocConfig> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                ClidocConfig::load_from_path(path)
            }
            None => ClidocConfig::load(&std::env::current_dir()?),
        };

        if let Some(tool) = &self.tool {
            config.tool = tool.clone();
        }
        if let Some(event) = &self.event {
            config.event = event.clone();
        }
        if let Some(dir) = &self.docs_dir {
            config.use_docs_dir(dir.clone());
        }
        Ok(config)
    }
}

// ============================================================================
// Tool Parameter Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
struct CommandParams {
    /// CLI subcommand, e.g. init, build, run, serve, version
    command: String,
}

// ============================================================================
// Server State
// ============================================================================

#[derive(Clone)]
struct ClidocServer {
    dispatcher: Arc<Dispatcher>,
    /// Agent-facing description of what the router covers
    instructions: String,
    /// Tool router (generated by macro)
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

impl ClidocServer {
    fn new(dispatcher: Dispatcher, instructions: String) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            instructions,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// MCP Tool Implementations
// ============================================================================

#[tool_router]
impl ClidocServer {
    /// Route a free-text request to a subcommand and return its docs
    #[tool(
        name = "command_docs",
        description = "Identify the CLI subcommand that fits the user's request and return its detailed usage documentation. Falls back to the root command's documentation when no subcommand fits."
    )]
    async fn command_docs(&self, Parameters(params): Parameters<CommandParams>) -> String {
        debug!("command_docs: {:?}", params.command);
        self.dispatcher.handle(&params.command)
    }

    /// List routable subcommands in match priority order
    #[tool(
        name = "list_commands",
        description = "List the subcommands this server can document, in the order keywords are matched."
    )]
    async fn list_commands(&self) -> String {
        let commands: Vec<_> = Command::ALL
            .iter()
            .map(|command| {
                serde_json::json!({
                    "name": self.dispatcher.lookup_name(*command),
                    "root": command.is_root(),
                    "summary": command.summary(),
                })
            })
            .collect();

        let result = serde_json::json!({
            "tool": self.dispatcher.tool(),
            "commands": commands,
        });

        serde_json::to_string_pretty(&result)
            .unwrap_or_else(|e| format!("Serialization error: {}", e))
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler(router = self.tool_router)]
impl ServerHandler for ClidocServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: rmcp::model::ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability::default()),
                ..Default::default()
            },
            server_info: rmcp::model::Implementation {
                name: "clidoc".to_string(),
                title: Some(format!("{} CLI documentation", self.dispatcher.tool())),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(self.instructions.clone()),
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Text carried by a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("Unknown panic")
}

/// Client hung up on stdio; not worth a panic report.
fn is_broken_pipe(msg: &str) -> bool {
    msg.contains("Broken pipe") || msg.contains("os error 32")
}

/// One stderr line describing a panic, prefixed with the binary name.
fn panic_report(msg: &str, location: Option<&panic::Location<'_>>) -> String {
    if is_broken_pipe(msg) {
        return "[clidoc-mcp] Client disconnected (broken pipe), shutting down".to_string();
    }
    match location {
        Some(loc) => format!(
            "[clidoc-mcp] Panic at {}:{}:{}: {}",
            loc.file(),
            loc.line(),
            loc.column(),
            msg
        ),
        None => format!("[clidoc-mcp] Panic: {}", msg),
    }
}

/// Report panics on stderr and exit with 1 instead of 101.
fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        eprintln!("{}", panic_report(panic_message(info.payload()), info.location()));
        std::process::exit(1);
    }));
}

/// Ignore SIGPIPE so writes to a closed stdout fail with EPIPE instead of
/// killing the process.
#[cfg(unix)]
fn ignore_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

#[cfg(not(unix))]
fn ignore_sigpipe() {}

async fn run_server(args: Args) -> Result<()> {
    // Logging MUST go to stderr, stdout is for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    let config = args.load_config()?;

    if let Some(text) = &args.classify {
        println!("{}", classify(text).lookup_name(&config.tool));
        return Ok(());
    }

    let dispatcher = config
        .dispatcher()
        .context("Invalid documentation source")?;

    if let Some(text) = &args.ask {
        println!("{}", dispatcher.handle(text));
        return Ok(());
    }

    info!(
        "Starting clidoc-mcp v{} (tool: {}, source: {:?})",
        env!("CARGO_PKG_VERSION"),
        config.tool,
        config.source.kind
    );

    let server = ClidocServer::new(dispatcher, config.description());

    info!("Server ready. Listening on stdio...");

    server
        .serve(rmcp::transport::stdio())
        .await?
        .waiting()
        .await?;

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    ignore_sigpipe();
    install_panic_hook();

    let args = Args::parse();

    match run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if is_broken_pipe(&format!("{:?}", e)) {
                eprintln!("[clidoc-mcp] Client disconnected, shutting down");
                ExitCode::SUCCESS
            } else {
                eprintln!("[clidoc-mcp] Error: {:#}", e);
                ExitCode::FAILURE
            }
        }
    }
}
