//! Terminal prompter - asks on stdout or stderr, reads answers from stdin

use crate::prompt::Prompter;
use async_trait::async_trait;
use console::style;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Stream the questions are written to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PromptStream {
    #[default]
    Stdout,
    /// Keeps stdout free for machine-readable output
    Stderr,
}

/// Prompter bound to the process's terminal
pub struct TerminalPrompter {
    // Kept across questions so buffered input is not lost between prompts
    input: Mutex<BufReader<Stdin>>,
    stream: PromptStream,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::on(PromptStream::Stdout)
    }

    /// Prompter that writes its questions to `stream`
    pub fn on(stream: PromptStream) -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
            stream,
        }
    }

    pub fn stream(&self) -> PromptStream {
        self.stream
    }

    fn write(&self, text: &str) -> std::io::Result<()> {
        match self.stream {
            PromptStream::Stdout => write_prompt(&mut std::io::stdout().lock(), text, self.stream),
            PromptStream::Stderr => write_prompt(&mut std::io::stderr().lock(), text, self.stream),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a styled question without a trailing newline
fn write_prompt<W: Write>(out: &mut W, question: &str, stream: PromptStream) -> std::io::Result<()> {
    let styled = match stream {
        PromptStream::Stdout => style(question).cyan(),
        PromptStream::Stderr => style(question).for_stderr().cyan(),
    };
    write!(out, "{}", styled)?;
    out.flush()
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&self, question: &str) -> std::io::Result<Option<String>> {
        self.write(question)?;

        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            // Keep the next message off the prompt line
            self.write("\n")?;
            return Ok(None);
        }

        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }
}
