//! Process launch for the agent executable.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Fully resolved agent invocation.
#[derive(Clone, Copy)]
pub struct AgentCommand<'a> {
    pub program: &'a Path,
    /// `[mode, site_code, site_password, payload]`
    pub args: [&'a str; 4],
    pub timeout: Duration,
}

impl std::fmt::Debug for AgentCommand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [mode, site_code, _, payload] = self.args;
        f.debug_struct("AgentCommand")
            .field("program", &self.program)
            .field("mode", &mode)
            .field("site_code", &site_code)
            .field("payload_len", &payload.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// What a finished agent process left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawExit {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
}

/// Extension point for launching the agent.
///
/// Lets tests substitute scripted exits for the real executable.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run(&self, command: AgentCommand<'_>) -> Result<RawExit>;
}

/// Spawns the agent as a child process with tokio.
///
/// The child is killed if it outlives `command.timeout`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl AgentRunner for ProcessRunner {
    async fn run(&self, command: AgentCommand<'_>) -> Result<RawExit> {
        let child = Command::new(command.program)
            .args(command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Error::unavailable(format!(
                    "failed to launch {}: {}",
                    command.program.display(),
                    e
                ))
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::unavailable(format!(
                    "failed to wait for agent: {}",
                    e
                )));
            }
            Err(_) => {
                tracing::warn!(timeout = ?command.timeout, "Agent timed out, killing");
                return Err(Error::unavailable(format!(
                    "agent did not exit within {:?}",
                    command.timeout
                )));
            }
        };

        if !output.stderr.is_empty() {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Agent wrote to stderr"
            );
        }

        Ok(RawExit {
            status: output.status.code(),
            stdout: output.stdout,
        })
    }
}
