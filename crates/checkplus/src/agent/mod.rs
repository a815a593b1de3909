//! External agent protocol.
//!
//! The agent is launched once per call as
//! `<program> <ENC|DEC> <site_code> <site_password> <payload>`.
//!
//! It exits with status 1 on every completed run, successful or not. A
//! failure is only distinguishable by stdout being one of a fixed set of
//! negative integer codes for that mode; anything else on stdout is the
//! result. Classification is a separate pure step ([`classify`]) from the
//! process launch ([`AgentRunner`]).

mod invoker;
mod runner;

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

pub use invoker::AgentInvoker;
pub use runner::{AgentCommand, AgentRunner, ProcessRunner, RawExit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Encrypt,
    Decrypt,
}

impl AgentMode {
    /// First positional argument understood by the agent.
    pub fn as_arg(&self) -> &'static str {
        match self {
            Self::Encrypt => "ENC",
            Self::Decrypt => "DEC",
        }
    }

    /// Signal codes the agent may emit in this mode.
    pub fn signals(&self) -> &'static [AgentSignal] {
        match self {
            Self::Encrypt => ENCRYPT_SIGNALS,
            Self::Decrypt => DECRYPT_SIGNALS,
        }
    }
}

impl fmt::Display for AgentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encrypt => f.write_str("encrypt"),
            Self::Decrypt => f.write_str("decrypt"),
        }
    }
}

const ENCRYPT_SIGNALS: &[AgentSignal] = &[
    AgentSignal::SystemFault,
    AgentSignal::EncryptionFault,
    AgentSignal::EncryptedDataFault,
    AgentSignal::InvalidInput,
];

const DECRYPT_SIGNALS: &[AgentSignal] = &[
    AgentSignal::SystemFault,
    AgentSignal::DecryptionFault,
    AgentSignal::HashMismatch,
    AgentSignal::DecryptedDataFault,
    AgentSignal::InvalidInput,
    AgentSignal::SitePasswordFault,
];

/// Failure code reported by the agent on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentSignal {
    /// -1
    SystemFault,
    /// -2
    EncryptionFault,
    /// -3
    EncryptedDataFault,
    /// -4
    DecryptionFault,
    /// -5: the agent also hands back decrypted data with this code; it must
    /// not be trusted.
    HashMismatch,
    /// -6
    DecryptedDataFault,
    /// -9
    InvalidInput,
    /// -12
    SitePasswordFault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalCategory {
    System,
    Processing,
    Data,
    Input,
    Hash,
    Password,
}

impl AgentSignal {
    pub fn code(&self) -> i32 {
        match self {
            Self::SystemFault => -1,
            Self::EncryptionFault => -2,
            Self::EncryptedDataFault => -3,
            Self::DecryptionFault => -4,
            Self::HashMismatch => -5,
            Self::DecryptedDataFault => -6,
            Self::InvalidInput => -9,
            Self::SitePasswordFault => -12,
        }
    }

    /// Exact stdout text the agent prints for this code.
    fn as_output(&self) -> &'static str {
        match self {
            Self::SystemFault => "-1",
            Self::EncryptionFault => "-2",
            Self::EncryptedDataFault => "-3",
            Self::DecryptionFault => "-4",
            Self::HashMismatch => "-5",
            Self::DecryptedDataFault => "-6",
            Self::InvalidInput => "-9",
            Self::SitePasswordFault => "-12",
        }
    }

    pub fn category(&self) -> SignalCategory {
        match self {
            Self::SystemFault => SignalCategory::System,
            Self::EncryptionFault | Self::DecryptionFault => SignalCategory::Processing,
            Self::EncryptedDataFault | Self::DecryptedDataFault => SignalCategory::Data,
            Self::InvalidInput => SignalCategory::Input,
            Self::HashMismatch => SignalCategory::Hash,
            Self::SitePasswordFault => SignalCategory::Password,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SystemFault => "encryption system fault",
            Self::EncryptionFault => "encryption processing fault",
            Self::EncryptedDataFault => "encrypted data fault",
            Self::DecryptionFault => "decryption processing fault",
            Self::HashMismatch => "hash mismatch",
            Self::DecryptedDataFault => "decrypted data fault",
            Self::InvalidInput => "invalid input parameters",
            Self::SitePasswordFault => "site password fault",
        }
    }

    /// Match agent stdout against the codes known for `mode`.
    pub fn from_output(mode: AgentMode, stdout: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(strip_line_terminator(stdout)).ok()?;
        mode.signals()
            .iter()
            .copied()
            .find(|signal| signal.as_output() == text)
    }
}

impl fmt::Display for AgentSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

/// Classified result of one agent run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Success(Vec<u8>),
    Failure { signal: AgentSignal, raw: Vec<u8> },
}

impl AgentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Successful output, or the signal as [`Error::AgentSignal`].
    pub fn into_output(self, mode: AgentMode) -> Result<Vec<u8>> {
        match self {
            Self::Success(output) => Ok(output),
            Self::Failure { signal, .. } => Err(Error::AgentSignal { mode, signal }),
        }
    }
}

/// Two-step classification of a finished agent process.
///
/// 1. Any exit status other than `completion_status` is [`Error::AgentUnavailable`].
/// 2. Stdout equal to a known code for `mode` is a `Failure`; anything else is
///    `Success`, including codes that belong only to the other mode.
pub fn classify(mode: AgentMode, completion_status: i32, exit: RawExit) -> Result<AgentOutcome> {
    match exit.status {
        Some(status) if status == completion_status => {}
        Some(status) => {
            return Err(Error::unavailable(format!(
                "agent {mode} exited with unexpected status {status}"
            )));
        }
        None => {
            return Err(Error::unavailable(format!(
                "agent {mode} was terminated by a signal"
            )));
        }
    }

    Ok(match AgentSignal::from_output(mode, &exit.stdout) {
        Some(signal) => AgentOutcome::Failure {
            signal,
            raw: exit.stdout,
        },
        None => AgentOutcome::Success(exit.stdout),
    })
}

pub(crate) fn strip_line_terminator(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}
