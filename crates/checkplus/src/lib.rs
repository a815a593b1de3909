//! checkplus: wire codec and agent protocol for CheckPlus identity verification.
//!
//! The provider's agent executable does the cryptography. This crate builds
//! the length-prefixed request payload it encrypts, runs it, classifies its
//! exit convention, and parses the decrypted result back into fields.

mod version;

pub mod agent;
pub mod config;
pub mod error;
pub mod payload;
pub mod session;
pub mod transport;
pub mod wire;

#[cfg(test)]
mod testing;

pub use agent::{AgentInvoker, AgentMode, AgentOutcome, AgentSignal, SignalCategory};
pub use config::{AgentConfig, CodecProfile, NameEncoding, SiteCredentials};
pub use error::{Error, Result};
pub use payload::{DecodedRecord, PayloadParser};
pub use session::{
    AuthType, Customize, Gender, RequestId, SessionCodec, SessionOptions, SessionRequest,
};
pub use version::{CHECKPLUS_VERSION, VersionInfo};
