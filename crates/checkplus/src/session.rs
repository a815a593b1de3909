//! Session orchestration: build-and-encrypt, decrypt-and-parse.
//!
//! Transport-agnostic. The HTTP adapter (and anything else) talks to the
//! agent only through [`SessionCodec::build_session`] and
//! [`SessionCodec::resolve_session`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentInvoker, AgentMode, strip_line_terminator};
use crate::config::CodecProfile;
use crate::error::{Error, Result};
use crate::payload::{DecodedRecord, PayloadParser};
use crate::wire::{self, FieldSet};

/// Unique identifier for one verification attempt (`REQ_SEQ`).
///
/// The provider echoes it back in the decrypted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn parse(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Verification method offered on the provider's page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    Certificate,
    Mobile,
    Card,
}

impl AuthType {
    fn as_field(&self) -> &'static str {
        match self {
            Self::Certificate => "X",
            Self::Mobile => "M",
            Self::Card => "C",
        }
    }
}

/// Page variant served by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Customize {
    Mobile,
}

impl Customize {
    fn as_field(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
        }
    }
}

/// Gender preselected on the provider's page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    fn as_field(&self) -> &'static str {
        match self {
            Self::Female => "0",
            Self::Male => "1",
        }
    }
}

/// Presentation and routing options for a new session.
///
/// Unset options fall back to the provider's selection screen, except
/// `popup` and `customize`, which fall back to the [`CodecProfile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub success_url: String,
    pub fail_url: String,
    pub auth_type: Option<AuthType>,
    /// Show a cancel button on the provider's page.
    pub popup: Option<bool>,
    pub customize: Option<Customize>,
    pub gender: Option<Gender>,
}

impl SessionOptions {
    pub fn new(success_url: impl Into<String>, fail_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            fail_url: fail_url.into(),
            auth_type: None,
            popup: None,
            customize: None,
            gender: None,
        }
    }

    pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }

    pub fn with_popup(mut self, popup: bool) -> Self {
        self.popup = Some(popup);
        self
    }

    pub fn with_customize(mut self, customize: Customize) -> Self {
        self.customize = Some(customize);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }
}

/// Encrypted session request ready to hand to the provider's page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub request_id: RequestId,
    /// Agent output, submitted to the provider as `EncodeData`.
    pub encoded: String,
}

pub struct SessionCodec {
    invoker: AgentInvoker,
    profile: CodecProfile,
    parser: PayloadParser,
}

impl SessionCodec {
    pub fn new(invoker: AgentInvoker, profile: CodecProfile) -> Self {
        let parser = PayloadParser::new(profile.name_encoding);
        Self {
            invoker,
            profile,
            parser,
        }
    }

    pub fn profile(&self) -> &CodecProfile {
        &self.profile
    }

    /// Fields of a session request, in the order the provider expects them.
    pub fn request_fields(&self, request_id: &RequestId, options: &SessionOptions) -> FieldSet {
        let popup = options.popup.unwrap_or(self.profile.default_popup);
        let customize = options.customize.or(self.profile.default_customize);

        FieldSet::new()
            .with("REQ_SEQ", request_id.to_string())
            .with("SITECODE", self.invoker.config().credentials.site_code())
            .with("AUTH_TYPE", options.auth_type.map_or("", |a| a.as_field()))
            .with("RTN_URL", options.success_url.as_str())
            .with("ERR_URL", options.fail_url.as_str())
            .with("POPUP_GUBUN", if popup { "Y" } else { "N" })
            .with("CUSTOMIZE", customize.map_or("", |c| c.as_field()))
            .with("GENDER", options.gender.map_or("", |g| g.as_field()))
    }

    /// Encode a fresh session request and encrypt it with the agent.
    pub async fn build_session(&self, options: &SessionOptions) -> Result<SessionRequest> {
        let request_id = RequestId::new();
        let wire_payload = wire::encode(&self.request_fields(&request_id, options));

        let output = self
            .invoker
            .invoke_encrypt(&wire_payload)
            .await?
            .into_output(AgentMode::Encrypt)?;

        let encoded = std::str::from_utf8(strip_line_terminator(&output))
            .map_err(|_| Error::text_decode("EncodeData", "UTF-8"))?
            .to_string();

        tracing::info!(%request_id, encoded_len = encoded.len(), "Built session request");
        Ok(SessionRequest {
            request_id,
            encoded,
        })
    }

    /// Decrypt a blob returned by the provider and parse its fields.
    pub async fn resolve_session(&self, encoded_blob: &str) -> Result<DecodedRecord> {
        let output = self
            .invoker
            .invoke_decrypt(encoded_blob)
            .await?
            .into_output(AgentMode::Decrypt)?;

        let record = self.parser.parse(strip_line_terminator(&output))?;
        tracing::info!(
            request_id = record.get("req_seq").unwrap_or_default(),
            "Resolved session"
        );
        Ok(record)
    }
}
