//! Startup configuration: command-line flags over environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use checkplus::{AgentConfig, CodecProfile, NameEncoding, SiteCredentials};

/// Flags that override the environment.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub agent: Option<PathBuf>,
}

pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut cli = CliArgs::default();

    let mut i = 1; // skip argv[0]
    while i < args.len() {
        match args[i].as_str() {
            "--host" => {
                i += 1;
                cli.host = Some(args.get(i).ok_or("--host requires a value")?.clone());
            }
            "--port" => {
                i += 1;
                let port = args.get(i).ok_or("--port requires a value")?;
                cli.port = Some(port.parse().map_err(|_| format!("invalid port '{port}'"))?);
            }
            "--agent" => {
                i += 1;
                cli.agent = Some(PathBuf::from(
                    args.get(i).ok_or("--agent requires a value")?,
                ));
            }
            "--help" | "-h" => return Err(String::new()),
            arg => return Err(format!("unexpected argument: {arg}")),
        }
        i += 1;
    }

    Ok(cli)
}

#[derive(Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub agent_path: PathBuf,
    pub credentials: SiteCredentials,
    pub public_url: Option<String>,
    pub cors_origin: Option<String>,
    pub name_encoding: NameEncoding,
    pub agent_timeout: Duration,
}

impl Settings {
    /// Resolve settings, reading variables through `env`.
    pub fn load(cli: CliArgs, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| env(key).filter(|v| !v.is_empty());

        let site_code = var("SITE_CODE").context("SITE_CODE is not set")?;
        let site_password = var("SITE_PASSWORD").context("SITE_PASSWORD is not set")?;

        let agent_path = match cli.agent {
            Some(path) => path,
            None => PathBuf::from(
                var("CPCLIENT_PATH").context("CPCLIENT_PATH is not set and --agent not given")?,
            ),
        };

        let port = match (cli.port, var("PORT")) {
            (Some(port), _) => port,
            (None, Some(port)) => port
                .parse()
                .with_context(|| format!("invalid PORT '{port}'"))?,
            (None, None) => 8888,
        };

        let name_encoding = match var("CHECKPLUS_NAME_ENCODING") {
            Some(label) => match label.parse() {
                Ok(encoding) => encoding,
                Err(e) => bail!("invalid CHECKPLUS_NAME_ENCODING: {e}"),
            },
            None => NameEncoding::default(),
        };

        let agent_timeout = match var("CHECKPLUS_AGENT_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .with_context(|| format!("invalid CHECKPLUS_AGENT_TIMEOUT_SECS '{secs}'"))?,
            ),
            None => Duration::from_secs(10),
        };

        Ok(Self {
            host: cli
                .host
                .or_else(|| var("HOST"))
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            agent_path,
            credentials: SiteCredentials::new(site_code, site_password),
            public_url: var("CHECKPLUS_PUBLIC_URL"),
            cors_origin: var("CHECKPLUS_CORS_ORIGIN"),
            name_encoding,
            agent_timeout,
        })
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::new(&self.agent_path, self.credentials.clone())
            .with_timeout(self.agent_timeout)
    }

    pub fn codec_profile(&self) -> CodecProfile {
        CodecProfile::default().with_name_encoding(self.name_encoding)
    }
}
