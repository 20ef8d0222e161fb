//! Classification of a working copy's HEAD

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Where HEAD points after a checkout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "branch", rename_all = "kebab-case")]
pub enum GitState {
    /// The path is not a git working copy
    NotARepository,
    /// HEAD is on a named branch
    Attached(String),
    /// HEAD points at a commit (tag or raw hash)
    Detached,
}

/// Markers git prints instead of a branch name when HEAD is detached.
///
/// Older git prints `(no branch)` or `(detached from <rev>)`, newer git
/// `(HEAD detached at <rev>)` or `(HEAD detached from <rev>)`. Rebase and
/// bisect print `(no branch, rebasing <branch>)` and similar.
fn detached_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\(\s*(?:HEAD\s+)?(?:no branch\b|detached\s+(?:from|at)\b)")
            .expect("detached marker pattern is valid")
    })
}

impl GitState {
    /// Classify the output of `git branch`
    ///
    /// Only the line flagged with `*` matters. A listing without one (an
    /// unborn branch, or no output at all) is treated as detached so no merge
    /// is attempted against a branch that does not exist.
    pub fn from_branch_listing(listing: &str) -> Self {
        let current = listing
            .lines()
            .find_map(|line| line.trim_start().strip_prefix('*'));

        match current {
            Some(rest) => Self::from_current_branch(rest.trim()),
            None => GitState::Detached,
        }
    }

    fn from_current_branch(name: &str) -> Self {
        if name.is_empty() || detached_marker().is_match(name) {
            GitState::Detached
        } else {
            GitState::Attached(name.to_string())
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, GitState::Attached(_))
    }

    /// Branch name when attached
    pub fn branch(&self) -> Option<&str> {
        match self {
            GitState::Attached(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for GitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GitState::NotARepository => f.write_str("not a repository"),
            GitState::Attached(name) => write!(f, "on branch {}", name),
            GitState::Detached => f.write_str("detached HEAD"),
        }
    }
}
