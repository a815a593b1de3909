//! In-process agent stand-ins for tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::agent::{AgentCommand, AgentInvoker, AgentRunner, RawExit};
use crate::config::{AgentConfig, CodecProfile, SiteCredentials};
use crate::error::Result;
use crate::session::SessionCodec;

pub(crate) fn agent_config() -> AgentConfig {
    AgentConfig::new("/opt/CPClient", SiteCredentials::new("AB123", "pw"))
}

pub(crate) fn invoker(runner: Arc<dyn AgentRunner>) -> AgentInvoker {
    AgentInvoker::new(agent_config()).with_runner(runner)
}

pub(crate) fn session_codec(runner: Arc<dyn AgentRunner>) -> SessionCodec {
    SessionCodec::new(invoker(runner), CodecProfile::default())
}

/// Returns a canned exit and records the argument vectors it was given.
pub(crate) struct ScriptedRunner {
    exit: RawExit,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub(crate) fn new(status: i32, stdout: impl AsRef<[u8]>) -> Arc<Self> {
        Arc::new(Self {
            exit: RawExit {
                status: Some(status),
                stdout: stdout.as_ref().to_vec(),
            },
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AgentRunner for ScriptedRunner {
    async fn run(&self, command: AgentCommand<'_>) -> Result<RawExit> {
        self.calls
            .lock()
            .unwrap()
            .push(command.args.iter().map(|s| s.to_string()).collect());
        Ok(self.exit.clone())
    }
}

/// Completes normally and prints its payload argument back, after `delay`.
pub(crate) struct EchoRunner {
    pub(crate) delay: Duration,
}

#[async_trait::async_trait]
impl AgentRunner for EchoRunner {
    async fn run(&self, command: AgentCommand<'_>) -> Result<RawExit> {
        tokio::time::sleep(self.delay).await;
        Ok(RawExit {
            status: Some(1),
            stdout: command.args[3].as_bytes().to_vec(),
        })
    }
}
