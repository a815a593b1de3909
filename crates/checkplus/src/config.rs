//! Configuration values injected into the agent invoker and session codec.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::session::Customize;

/// Site identity issued by the verification provider.
///
/// Passed to the agent as positional arguments on every call.
#[derive(Clone, PartialEq, Eq)]
pub struct SiteCredentials {
    site_code: String,
    site_password: String,
}

impl SiteCredentials {
    pub fn new(site_code: impl Into<String>, site_password: impl Into<String>) -> Self {
        Self {
            site_code: site_code.into(),
            site_password: site_password.into(),
        }
    }

    pub fn site_code(&self) -> &str {
        &self.site_code
    }

    pub fn site_password(&self) -> &str {
        &self.site_password
    }
}

impl fmt::Debug for SiteCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiteCredentials")
            .field("site_code", &self.site_code)
            .field("site_password", &"<redacted>")
            .finish()
    }
}

/// Character encoding of the agent's `name` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NameEncoding {
    /// Korean national encoding used by the stock agent builds.
    #[default]
    EucKr,
    Utf8,
}

impl NameEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EucKr => "EUC-KR",
            Self::Utf8 => "UTF-8",
        }
    }

    /// Strict decode; `None` if any byte sequence is invalid.
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Option<Cow<'a, str>> {
        match self {
            Self::EucKr => {
                encoding_rs::EUC_KR.decode_without_bom_handling_and_without_replacement(bytes)
            }
            Self::Utf8 => std::str::from_utf8(bytes).ok().map(Cow::Borrowed),
        }
    }
}

impl FromStr for NameEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "euc-kr" | "euckr" | "cp949" => Ok(Self::EucKr),
            "utf-8" | "utf8" => Ok(Self::Utf8),
            other => Err(format!("unsupported name encoding '{other}'")),
        }
    }
}

/// Behaviour switches that differ between deployments of the same protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecProfile {
    pub name_encoding: NameEncoding,
    /// Show the provider's cancel button when the request doesn't say.
    pub default_popup: bool,
    /// Page variant when the request doesn't say.
    pub default_customize: Option<Customize>,
}

impl Default for CodecProfile {
    fn default() -> Self {
        Self {
            name_encoding: NameEncoding::EucKr,
            default_popup: false,
            default_customize: Some(Customize::Mobile),
        }
    }
}

impl CodecProfile {
    pub fn with_name_encoding(mut self, encoding: NameEncoding) -> Self {
        self.name_encoding = encoding;
        self
    }

    pub fn with_default_popup(mut self, popup: bool) -> Self {
        self.default_popup = popup;
        self
    }

    pub fn with_default_customize(mut self, customize: Option<Customize>) -> Self {
        self.default_customize = customize;
        self
    }
}

/// How to launch the agent executable.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub program: PathBuf,
    pub credentials: SiteCredentials,
    /// Exit status the agent uses for a completed run. The stock binary exits 1.
    pub completion_status: i32,
    pub timeout: Duration,
}

impl AgentConfig {
    pub fn new(program: impl Into<PathBuf>, credentials: SiteCredentials) -> Self {
        Self {
            program: program.into(),
            credentials,
            completion_status: 1,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_completion_status(mut self, status: i32) -> Self {
        self.completion_status = status;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = SiteCredentials::new("AB123", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AB123"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn agent_config_defaults() {
        let config = AgentConfig::new("/opt/cp/CPClient", SiteCredentials::new("AB123", "pw"));
        assert_eq!(config.completion_status, 1);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!format!("{:?}", config).contains("\"pw\""));
    }

    #[test]
    fn name_encoding_parses_labels() {
        assert_eq!("EUC-KR".parse::<NameEncoding>().unwrap(), NameEncoding::EucKr);
        assert_eq!("cp949".parse::<NameEncoding>().unwrap(), NameEncoding::EucKr);
        assert_eq!("utf-8".parse::<NameEncoding>().unwrap(), NameEncoding::Utf8);
        assert!("latin1".parse::<NameEncoding>().is_err());
    }

    #[test]
    fn euc_kr_decodes_hangul() {
        let bytes = [0xc8, 0xab, 0xb1, 0xe6, 0xb5, 0xbf];
        assert_eq!(NameEncoding::EucKr.decode(&bytes).unwrap(), "홍길동");
        assert!(NameEncoding::Utf8.decode(&bytes).is_none());
    }

    #[test]
    fn euc_kr_rejects_truncated_sequence() {
        assert!(NameEncoding::EucKr.decode(&[0xc8]).is_none());
    }

    #[test]
    fn profile_defaults_match_mobile_deployment() {
        let profile = CodecProfile::default();
        assert_eq!(profile.name_encoding, NameEncoding::EucKr);
        assert!(!profile.default_popup);
        assert_eq!(profile.default_customize, Some(Customize::Mobile));
    }
}
