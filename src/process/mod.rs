//! External command execution

pub mod subprocess;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub use subprocess::ProcessExecutor;

/// Error types for command execution
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {limit:?}")]
    Timeout { program: String, limit: Duration },
}

/// A program with its arguments, run without a shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,

    /// Working directory; inherited from the caller when absent
    pub cwd: Option<PathBuf>,

    /// Extra environment variables, on top of the inherited environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<(String, String)>,
}

impl CommandLine {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Build from an argument vector whose first element is the program
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable for this command only
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of a variable set with [`CommandLine::with_env`]
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Arguments only, without the program
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Quote an argument for display so copy-pasting the line into a shell works
fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Exit status and combined output of a finished command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Process exit code; -1 when the process was killed by a signal
    pub exit_code: i32,

    /// Stdout and stderr lines in the order they arrived
    pub lines: Vec<String>,
}

impl CommandOutput {
    /// What a dry run reports for every command
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last line of output, if any
    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

/// Trait for command execution - allows swapping the process layer in tests
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run one command
    ///
    /// With `dry_run` set nothing is executed and a synthetic success is
    /// returned, so callers never need to branch on dry-run themselves.
    async fn run(&self, command: &CommandLine, dry_run: bool) -> Result<CommandOutput, ExecutorError>;
}
