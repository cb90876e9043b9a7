//! Configuration file support for clidoc.
//!
//! Loads optional `.clidoc/config.toml` from the working directory. Every
//! key has a default, so an empty or missing file routes `yomo` subcommands
//! through `yomo <sub> --help`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::command::Command;
use crate::dispatch::Dispatcher;
use crate::source::{DirSource, DocSource, HelpCommandSource, StaticSource};
use crate::{DEFAULT_EVENT, DEFAULT_TOOL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("source kind 'dir' needs a docs directory (source.dir or --docs-dir)")]
    MissingDocsDir,

    #[error("docs directory not found: {}", .0.display())]
    DocsDirNotFound(PathBuf),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClidocConfig {
    /// Root program whose subcommands are documented (default: yomo)
    pub tool: String,
    /// Event tag on dispatch log records
    pub event: String,
    /// Tool description shown to the calling agent
    pub description: Option<String>,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Run `<program> <sub> --help`
    #[default]
    Help,
    /// Read `<dir>/<sub>.md`
    Dir,
    /// Use the `docs` table below
    Inline,
}

/// Where documentation comes from
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Program to run for `help` (default: same as `tool`)
    pub program: Option<String>,
    pub help_flag: String,
    /// Markdown directory for `dir`
    pub dir: Option<PathBuf>,
    /// Command name → text for `inline`
    pub docs: BTreeMap<String, String>,
}

impl Default for ClidocConfig {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            event: DEFAULT_EVENT.to_string(),
            description: None,
            source: SourceConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Help,
            program: None,
            help_flag: "--help".to_string(),
            dir: None,
            docs: BTreeMap::new(),
        }
    }
}

impl ClidocConfig {
    /// Load config from `.clidoc/config.toml` in the given root directory.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(".clidoc").join("config.toml");
        Self::load_from_path(&config_path)
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Point the config at a markdown directory, switching the source kind.
    pub fn use_docs_dir(&mut self, dir: PathBuf) {
        self.source.kind = SourceKind::Dir;
        self.source.dir = Some(dir);
    }

    /// Description advertised to the agent: configured text or the built-in
    /// subcommand guide.
    pub fn description(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| default_description(&self.tool))
    }

    pub fn build_source(&self) -> Result<Arc<dyn DocSource>, ConfigError> {
        let source: Arc<dyn DocSource> = match self.source.kind {
            SourceKind::Help => {
                let program = self.source.program.as_deref().unwrap_or(&self.tool);
                Arc::new(
                    HelpCommandSource::new(program, self.tool.as_str())
                        .with_help_flag(self.source.help_flag.as_str()),
                )
            }
            SourceKind::Dir => {
                let dir = self.source.dir.as_ref().ok_or(ConfigError::MissingDocsDir)?;
                if !dir.is_dir() {
                    return Err(ConfigError::DocsDirNotFound(dir.clone()));
                }
                Arc::new(DirSource::new(dir.clone()))
            }
            SourceKind::Inline => Arc::new(StaticSource::from(self.source.docs.clone())),
        };
        Ok(source)
    }

    /// Dispatcher wired to this config's source, tool name and event tag.
    pub fn dispatcher(&self) -> Result<Dispatcher, ConfigError> {
        Ok(Dispatcher::new(self.build_source()?)
            .with_tool(self.tool.as_str())
            .with_event(self.event.as_str()))
    }
}

fn default_description(tool: &str) -> String {
    let mut text = format!(
        "Analyze the user input, identify the '{tool}' subcommand that meets the user's \
         requirements and provide detailed usage instructions. If no subcommand fits, \
         provide usage instructions for the '{tool}' root command.\n\n"
    );
    for command in Command::ALL {
        if let Some(keyword) = command.keyword() {
            text.push_str(&format!(
                "- {}: use the '{}' subcommand\n",
                command.summary(),
                keyword
            ));
        }
    }
    text
}
