//! Documentation sources.
//!
//! A [`DocSource`] turns a command name into usage text. The router never
//! interprets that text; it only forwards it.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command as Process, Stdio};

use thiserror::Error;
use tracing::debug;

/// Why documentation could not be produced for a command name.
#[derive(Debug, Error)]
pub enum DocError {
    #[error("no documentation for command \"{0}\"")]
    NotFound(String),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with {status}: {detail}")]
    Failed {
        program: String,
        status: String,
        detail: String,
    },

    #[error("empty documentation for command \"{0}\"")]
    Empty(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Capability to look up usage documentation by command name.
pub trait DocSource: Send + Sync {
    fn lookup(&self, name: &str) -> Result<String, DocError>;
}

// ============================================================================
// Help output of the real tool
// ============================================================================

/// Asks the tool itself: `<program> <name> --help`, or `<program> --help`
/// for the root command.
#[derive(Debug, Clone)]
pub struct HelpCommandSource {
    program: String,
    root: String,
    help_flag: String,
}

impl HelpCommandSource {
    /// `root` is the name the router uses for the root command; looking it
    /// up prints the program's top-level help.
    pub fn new(program: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
            help_flag: "--help".to_string(),
        }
    }

    pub fn with_help_flag(mut self, flag: impl Into<String>) -> Self {
        self.help_flag = flag.into();
        self
    }

    fn args<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        if name == self.root {
            vec![self.help_flag.as_str()]
        } else {
            vec![name, self.help_flag.as_str()]
        }
    }
}

impl DocSource for HelpCommandSource {
    fn lookup(&self, name: &str) -> Result<String, DocError> {
        let args = self.args(name);
        debug!("Running {} {}", self.program, args.join(" "));

        let output = Process::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| DocError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let detail = match stderr.trim() {
                "" => stdout.trim().to_string(),
                s => s.to_string(),
            };
            return Err(DocError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                detail,
            });
        }

        // Some CLIs print help to stderr
        let text = if stdout.trim().is_empty() {
            stderr
        } else {
            stdout
        };
        if text.trim().is_empty() {
            return Err(DocError::Empty(name.to_string()));
        }
        Ok(text.into_owned())
    }
}

// ============================================================================
// Markdown directory
// ============================================================================

/// Reads `<dir>/<name>.md`.
#[derive(Debug, Clone)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocSource for DirSource {
    fn lookup(&self, name: &str) -> Result<String, DocError> {
        // Names come from the fixed command table, but keep lookups inside dir anyway
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(DocError::NotFound(name.to_string()));
        }
        let path = self.dir.join(format!("{}.md", name));
        match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Err(DocError::Empty(name.to_string())),
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(DocError::NotFound(name.to_string()))
            }
            Err(source) => Err(DocError::Io { path, source }),
        }
    }
}

// ============================================================================
// In-memory table
// ============================================================================

/// Fixed name → text table, filled from config or by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    docs: BTreeMap<String, String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doc(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.docs.insert(name.into(), text.into());
        self
    }
}

impl From<BTreeMap<String, String>> for StaticSource {
    fn from(docs: BTreeMap<String, String>) -> Self {
        Self { docs }
    }
}

impl DocSource for StaticSource {
    fn lookup(&self, name: &str) -> Result<String, DocError> {
        self.docs
            .get(name)
            .cloned()
            .ok_or_else(|| DocError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn static_source_hit_and_miss() {
        let source = StaticSource::new().with_doc("init", "init docs");
        assert_eq!(source.lookup("init").unwrap(), "init docs");
        let err = source.lookup("yomo").unwrap_err();
        assert!(matches!(err, DocError::NotFound(ref n) if n == "yomo"));
        assert_eq!(err.to_string(), "no documentation for command \"yomo\"");
    }

    #[test]
    fn dir_source_reads_markdown() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("serve.md"), "# serve\nyomo serve -c zipper.yml\n").unwrap();

        let source = DirSource::new(tmp.path());
        let doc = source.lookup("serve").unwrap();
        assert!(doc.contains("zipper.yml"));
        assert!(matches!(source.lookup("run"), Err(DocError::NotFound(_))));
    }

    #[test]
    fn dir_source_rejects_blank_and_escaping_names() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("build.md"), "  \n").unwrap();

        let source = DirSource::new(tmp.path());
        assert!(matches!(source.lookup("build"), Err(DocError::Empty(_))));
        assert!(matches!(source.lookup("../secret"), Err(DocError::NotFound(_))));
        assert!(matches!(source.lookup(""), Err(DocError::NotFound(_))));
    }

    #[test]
    fn help_source_builds_args() {
        let source = HelpCommandSource::new("yomo", "yomo");
        assert_eq!(source.args("build"), ["build", "--help"]);
        assert_eq!(source.args("yomo"), ["--help"]);

        let source = source.with_help_flag("-h");
        assert_eq!(source.args("run"), ["run", "-h"]);
    }

    #[test]
    fn help_source_missing_program_is_spawn_error() {
        let source = HelpCommandSource::new("clidoc-definitely-not-installed", "x");
        let err = source.lookup("init").unwrap_err();
        assert!(matches!(err, DocError::Spawn { .. }));
        assert!(err.to_string().contains("clidoc-definitely-not-installed"));
    }

    #[cfg(unix)]
    #[test]
    fn help_source_captures_stdout() {
        let source = HelpCommandSource::new("echo", "echo").with_help_flag("usage");
        let doc = source.lookup("build").unwrap();
        assert_eq!(doc.trim(), "build usage");
    }

    #[cfg(unix)]
    #[test]
    fn help_source_nonzero_exit_is_failure() {
        let source = HelpCommandSource::new("false", "false");
        let err = source.lookup("run").unwrap_err();
        assert!(matches!(err, DocError::Failed { .. }));
    }

    /// `sh <script> --help`: the script path stands in for the subcommand.
    #[cfg(unix)]
    fn script(dir: &TempDir, body: &str) -> String {
        let path = dir.path().join("help.sh");
        std::fs::write(&path, body).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[cfg(unix)]
    #[test]
    fn help_source_falls_back_to_stderr() {
        let tmp = TempDir::new().unwrap();
        let name = script(&tmp, "echo \"usage on stderr $1\" >&2\n");

        let source = HelpCommandSource::new("sh", "sh");
        let doc = source.lookup(&name).unwrap();
        assert_eq!(doc.trim(), "usage on stderr --help");
    }

    #[cfg(unix)]
    #[test]
    fn help_source_prefers_stdout_over_stderr() {
        let tmp = TempDir::new().unwrap();
        let name = script(&tmp, "echo noise >&2\necho usage\n");

        let doc = HelpCommandSource::new("sh", "sh").lookup(&name).unwrap();
        assert_eq!(doc.trim(), "usage");
    }

    #[cfg(unix)]
    #[test]
    fn help_source_silent_success_is_empty() {
        let tmp = TempDir::new().unwrap();
        let name = script(&tmp, "exit 0\n");

        let err = HelpCommandSource::new("sh", "sh").lookup(&name).unwrap_err();
        assert!(matches!(err, DocError::Empty(ref n) if *n == name));
    }
}
