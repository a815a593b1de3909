use std::sync::Arc;

use crate::config::AgentConfig;
use crate::error::Result;

use super::{AgentCommand, AgentMode, AgentOutcome, AgentRunner, ProcessRunner, classify};

/// Runs the agent with injected credentials and classifies each result.
///
/// Stateless between calls: every call spawns exactly one process.
pub struct AgentInvoker {
    config: AgentConfig,
    runner: Arc<dyn AgentRunner>,
}

impl AgentInvoker {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            config,
            runner: Arc::new(ProcessRunner),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn AgentRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub async fn invoke_encrypt(&self, wire_payload: &str) -> Result<AgentOutcome> {
        self.invoke(AgentMode::Encrypt, wire_payload).await
    }

    pub async fn invoke_decrypt(&self, encoded_blob: &str) -> Result<AgentOutcome> {
        self.invoke(AgentMode::Decrypt, encoded_blob).await
    }

    async fn invoke(&self, mode: AgentMode, payload: &str) -> Result<AgentOutcome> {
        let credentials = &self.config.credentials;
        let command = AgentCommand {
            program: &self.config.program,
            args: [
                mode.as_arg(),
                credentials.site_code(),
                credentials.site_password(),
                payload,
            ],
            timeout: self.config.timeout,
        };

        tracing::debug!(%mode, payload_len = payload.len(), "Invoking agent");
        let exit = self.runner.run(command).await.inspect_err(|e| {
            tracing::error!(%mode, error = %e, "Agent invocation failed");
        })?;

        let outcome = classify(mode, self.config.completion_status, exit).inspect_err(|e| {
            tracing::error!(%mode, error = %e, "Agent exited outside its convention");
        })?;

        match &outcome {
            AgentOutcome::Success(output) => {
                tracing::debug!(%mode, output_len = output.len(), "Agent completed");
            }
            AgentOutcome::Failure { signal, .. } => {
                tracing::warn!(%mode, code = signal.code(), %signal, "Agent reported failure");
            }
        }
        Ok(outcome)
    }
}
