//! Classification + documentation dispatch.

use std::sync::Arc;

use crate::command::{Command, classify};
use crate::observe::{DispatchLog, TracingLog};
use crate::source::{DocError, DocSource};
use crate::{DEFAULT_EVENT, DEFAULT_TOOL};

/// Outcome of resolving documentation for one command. Exactly one variant
/// per lookup.
#[derive(Debug)]
pub enum DispatchResult {
    Success(String),
    Failure { command: Command, error: DocError },
}

impl DispatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Success(_))
    }

    /// Render for the caller. Failures become a description naming the raw
    /// input the agent sent, so it can see what did not resolve.
    pub fn into_text(self, input: &str) -> String {
        match self {
            DispatchResult::Success(doc) => doc,
            DispatchResult::Failure { error, .. } => failure_message(input, &error),
        }
    }
}

fn failure_message(input: &str, error: &DocError) -> String {
    format!(
        "Error getting documentation for command '{}': {}",
        input, error
    )
}

/// Routes free-text intent to documentation.
///
/// Holds no per-call state; share it freely between concurrent callers.
#[derive(Clone)]
pub struct Dispatcher {
    tool: String,
    event: String,
    source: Arc<dyn DocSource>,
    log: Arc<dyn DispatchLog>,
}

impl Dispatcher {
    pub fn new(source: Arc<dyn DocSource>) -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            event: DEFAULT_EVENT.to_string(),
            source,
            log: Arc::new(TracingLog),
        }
    }

    /// Root program name, used as the lookup name when nothing matches.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Event tag on every log record.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    pub fn with_log(mut self, log: Arc<dyn DispatchLog>) -> Self {
        self.log = log;
        self
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    /// Name the documentation source receives for `command`.
    pub fn lookup_name(&self, command: Command) -> &str {
        command.lookup_name(&self.tool)
    }

    /// Fetch documentation for `command`. `input` is the raw text it was
    /// classified from and only ends up in log records.
    pub fn resolve(&self, command: Command, input: &str) -> DispatchResult {
        let name = self.lookup_name(command);
        match self.source.lookup(name) {
            Ok(doc) => {
                self.log.info(
                    &self.event,
                    &[("command", name), ("input", input), ("doc", doc.as_str())],
                );
                DispatchResult::Success(doc)
            }
            Err(error) => {
                let detail = error.to_string();
                self.log.error(
                    &self.event,
                    &[("command", name), ("input", input), ("error", detail.as_str())],
                );
                DispatchResult::Failure { command, error }
            }
        }
    }

    /// Classify `input`, resolve its documentation and answer with text.
    /// Never fails: retrieval errors come back as a readable message.
    pub fn handle(&self, input: &str) -> String {
        let command = classify(input);
        self.resolve(command, input).into_text(input)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tool", &self.tool)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}
