//! Operator confirmation for optional steps

pub mod terminal;

use crate::core::request::Decision;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub use terminal::{PromptStream, TerminalPrompter};

/// Something that can put a question to the operator
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Show `question` and wait for one line of input
    ///
    /// Returns `Ok(None)` when input is closed.
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>>;
}

/// Resolves optional-step decisions from flags or, failing that, the operator
#[derive(Clone)]
pub struct ConfirmationGate {
    prompter: Arc<dyn Prompter>,
}

impl ConfirmationGate {
    pub fn new(prompter: Arc<dyn Prompter>) -> Self {
        Self { prompter }
    }

    /// Resolve a yes/no decision; the default answer is no
    pub async fn confirm(&self, decision: &Decision<bool>, question: &str) -> bool {
        match decision {
            Decision::Forced(value) => *value,
            Decision::Forbidden => false,
            Decision::AskOperator => {
                let answer = self.read(&format!("{} [y/N] ", question)).await;
                parse_confirmation(answer.as_deref())
            }
        }
    }

    /// Resolve a name; an empty answer means skip the step
    pub async fn choose_name(&self, decision: &Decision<String>, question: &str) -> Option<String> {
        match decision {
            Decision::Forced(name) => non_blank(name),
            Decision::Forbidden => None,
            Decision::AskOperator => {
                let answer = self.read(&format!("{} ", question)).await;
                answer.as_deref().and_then(non_blank)
            }
        }
    }

    async fn read(&self, question: &str) -> Option<String> {
        match self.prompter.ask(question).await {
            Ok(answer) => {
                debug!("Operator answered {:?}", answer);
                answer
            }
            Err(e) => {
                warn!("Could not read operator input, using the default answer: {}", e);
                None
            }
        }
    }
}

/// An answer starting with `y` means yes; anything else, including no answer, means no
fn parse_confirmation(answer: Option<&str>) -> bool {
    answer
        .and_then(|a| a.trim_start().chars().next())
        .is_some_and(|c| c.eq_ignore_ascii_case(&'y'))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
