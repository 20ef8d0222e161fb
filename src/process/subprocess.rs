//! Subprocess executor - spawns commands with tokio and captures their output

use crate::process::{CommandExecutor, CommandLine, CommandOutput, ExecutorError};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Executor that runs commands as child processes
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    /// Optional limit on a single command's run time
    timeout: Option<Duration>,
}

impl ProcessExecutor {
    /// Create an executor without a time limit
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `limit`
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    async fn spawn_and_collect(&self, command: &CommandLine) -> Result<CommandOutput, ExecutorError> {
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.cwd {
            process.current_dir(dir);
        }
        process.envs(command.env.iter().map(|(key, value)| (key, value)));

        let mut child = process.spawn().map_err(|source| ExecutorError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let io_error = |source: std::io::Error| ExecutorError::Io {
            program: command.program.clone(),
            source,
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(std::io::Error::other("stdout was not captured")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io_error(std::io::Error::other("stderr was not captured")))?;

        let lines = collect_interleaved(stdout, stderr).await.map_err(io_error)?;
        let status = child.wait().await.map_err(io_error)?;

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(-1),
            lines,
        })
    }
}

#[async_trait]
impl CommandExecutor for ProcessExecutor {
    async fn run(&self, command: &CommandLine, dry_run: bool) -> Result<CommandOutput, ExecutorError> {
        if dry_run {
            debug!("Dry run, not executing: {}", command);
            return Ok(CommandOutput::synthetic());
        }

        debug!("Spawning: {}", command);

        let output = match self.timeout {
            Some(limit) => timeout(limit, self.spawn_and_collect(command))
                .await
                .map_err(|_| ExecutorError::Timeout {
                    program: command.program.clone(),
                    limit,
                })??,
            None => self.spawn_and_collect(command).await?,
        };

        if output.success() {
            debug!("{} exited successfully ({} lines of output)", command.program, output.lines.len());
        } else {
            warn!("{} exited with code {}", command, output.exit_code);
        }

        Ok(output)
    }
}

/// Read stdout and stderr line by line, keeping the order lines arrive in
async fn collect_interleaved<O, E>(stdout: O, stderr: E) -> std::io::Result<Vec<String>>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let mut out_buf = Vec::new();
    let mut err_buf = Vec::new();
    let mut out_open = true;
    let mut err_open = true;
    let mut lines = Vec::new();

    while out_open || err_open {
        tokio::select! {
            read = out.read_until(b'\n', &mut out_buf), if out_open => {
                if read? == 0 {
                    out_open = false;
                } else {
                    lines.push(decode_line(&out_buf));
                    out_buf.clear();
                }
            }
            read = err.read_until(b'\n', &mut err_buf), if err_open => {
                if read? == 0 {
                    err_open = false;
                } else {
                    lines.push(decode_line(&err_buf));
                    err_buf.clear();
                }
            }
        }
    }

    Ok(lines)
}

fn decode_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_end_matches(['\n', '\r']).to_string()
}
