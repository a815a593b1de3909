//! Error taxonomy for the codec and agent protocol.

use thiserror::Error;

use crate::agent::{AgentMode, AgentSignal};

#[derive(Debug, Error)]
pub enum Error {
    /// No valid length prefix at `offset`, or the declared length runs past the input.
    #[error("malformed wire format at byte {offset}: {reason}")]
    MalformedWireFormat { offset: usize, reason: String },

    #[error("decoded token stream has an unpaired trailing token ({count} tokens)")]
    OddTokenCount { count: usize },

    #[error("field '{field}' is not valid {encoding}")]
    TextDecode {
        field: String,
        encoding: &'static str,
    },

    /// The agent completed and reported one of its documented failure codes.
    #[error("agent reported {signal} during {mode}")]
    AgentSignal { mode: AgentMode, signal: AgentSignal },

    #[error("agent unavailable: {reason}")]
    AgentUnavailable { reason: String },
}

impl Error {
    pub fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Self::MalformedWireFormat {
            offset,
            reason: reason.into(),
        }
    }

    pub fn text_decode(field: impl Into<String>, encoding: &'static str) -> Self {
        Self::TextDecode {
            field: field.into(),
            encoding,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::AgentUnavailable {
            reason: reason.into(),
        }
    }

    /// Stable identifier for transports that render error kinds separately.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedWireFormat { .. } => "malformed_wire_format",
            Self::OddTokenCount { .. } => "odd_token_count",
            Self::TextDecode { .. } => "text_decode",
            Self::AgentSignal { .. } => "agent_signal",
            Self::AgentUnavailable { .. } => "agent_unavailable",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
