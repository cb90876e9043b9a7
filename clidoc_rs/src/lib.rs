//! # clidoc
//!
//! Natural-language command router for AI agents. Takes a free-text
//! description of what the user wants, picks the matching subcommand of a
//! CLI tool and returns that subcommand's usage documentation.
//!
//! The pipeline is deliberately small:
//!
//! - [`command::classify`] maps raw text to one [`Command`] (first keyword
//!   by priority wins, the root command is the fallback)
//! - [`DocSource`] fetches documentation for a command name
//! - [`Dispatcher`] glues the two together, logs every outcome through an
//!   injected [`DispatchLog`] and always answers with text
//!
//! ```
//! use std::sync::Arc;
//! use clidoc::{Dispatcher, StaticSource};
//!
//! let source = StaticSource::new().with_doc("build", "yomo build <file>");
//! let dispatcher = Dispatcher::new(Arc::new(source));
//! assert_eq!(dispatcher.handle("please build my project"), "yomo build <file>");
//! ```

pub mod command;
pub mod config;
pub mod dispatch;
pub mod observe;
pub mod source;

pub use command::{Command, classify};
pub use config::{ClidocConfig, ConfigError, SourceConfig, SourceKind};
pub use dispatch::{DispatchResult, Dispatcher};
pub use observe::{DispatchLog, Fields, NullLog, TracingLog};
pub use source::{DirSource, DocError, DocSource, HelpCommandSource, StaticSource};

/// Root program whose subcommands are routed when nothing else is configured.
pub const DEFAULT_TOOL: &str = "yomo";

/// Event tag attached to every dispatch log record by default.
pub const DEFAULT_EVENT: &str = "yomo-cli-mcp";
