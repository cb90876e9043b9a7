//! Intent classification.
//!
//! Free text is matched against a fixed keyword table. Matching is plain,
//! case-sensitive substring containment: no trimming, no case folding, no
//! tokenization. The table order is the priority order, so `"build then run"`
//! resolves to `build` no matter where each word sits in the input.

use std::fmt;

/// Canonical command identifier understood by the documentation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Init,
    Build,
    Run,
    Serve,
    Version,
    /// Nothing matched: document the root program itself.
    Root,
}

/// Keyword table in priority order. First hit wins.
const KEYWORDS: [(&str, Command); 5] = [
    ("init", Command::Init),
    ("build", Command::Build),
    ("run", Command::Run),
    ("serve", Command::Serve),
    ("version", Command::Version),
];

impl Command {
    /// Every identifier in priority order, the root fallback last.
    pub const ALL: [Command; 6] = [
        Command::Init,
        Command::Build,
        Command::Run,
        Command::Serve,
        Command::Version,
        Command::Root,
    ];

    /// Keyword that selects this command, `None` for the root fallback.
    pub fn keyword(&self) -> Option<&'static str> {
        KEYWORDS
            .iter()
            .find(|(_, cmd)| cmd == self)
            .map(|(keyword, _)| *keyword)
    }

    /// Name to hand to the documentation source.
    ///
    /// Subcommands use their keyword; the root fallback uses the tool name
    /// (e.g. `yomo`).
    pub fn lookup_name<'a>(&self, tool: &'a str) -> &'a str {
        self.keyword().unwrap_or(tool)
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Command::Root)
    }

    /// One-line usage hint shown to agents.
    pub fn summary(&self) -> &'static str {
        match self {
            Command::Init => "Initialize a serverless LLM function project",
            Command::Build => "Build a stream function",
            Command::Run => "Run a serverless LLM function",
            Command::Serve => {
                "Run a zipper: create zipper.yml first, then `serve -c zipper.yml`"
            }
            Command::Version => "Print the tool version",
            Command::Root => "Root command: general usage when no subcommand fits",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword().unwrap_or("<root>"))
    }
}

/// Map free-form intent text to exactly one command.
///
/// Total and pure: every input yields a command, empty input included.
pub fn classify(input: &str) -> Command {
    KEYWORDS
        .iter()
        .find(|(keyword, _)| input.contains(keyword))
        .map(|(_, cmd)| *cmd)
        .unwrap_or(Command::Root)
}
