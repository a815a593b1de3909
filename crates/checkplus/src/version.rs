//! Version information for checkplus.

/// checkplus version from Cargo.toml
pub const CHECKPLUS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version information reported by the health endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct VersionInfo {
    pub checkplus: &'static str,
    /// Agent build identifier, if the deployment pins one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            checkplus: CHECKPLUS_VERSION,
            agent: None,
        }
    }
}

impl VersionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent: String) -> Self {
        self.agent = Some(agent);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_info_has_crate_version() {
        let info = VersionInfo::new();
        assert_eq!(info.checkplus, CHECKPLUS_VERSION);
        assert!(info.agent.is_none());
    }

    #[test]
    fn version_info_serializes_minimal() {
        let info = VersionInfo {
            checkplus: "0.1.0",
            agent: None,
        };
        insta::assert_json_snapshot!(info, @r#"
        {
          "checkplus": "0.1.0"
        }
        "#);
    }

    #[test]
    fn version_info_serializes_agent() {
        let info = VersionInfo {
            checkplus: "0.1.0",
            agent: None,
        }
        .with_agent("Linux_x64".to_string());
        insta::assert_json_snapshot!(info, @r#"
        {
          "checkplus": "0.1.0",
          "agent": "Linux_x64"
        }
        "#);
    }
}
