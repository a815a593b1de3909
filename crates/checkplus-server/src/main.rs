//! checkplus-server: HTTP front for CheckPlus identity-verification sessions.

mod settings;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use checkplus::transport::http::{AppState, ServerConfig, serve};
use checkplus::{AgentInvoker, SessionCodec};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use settings::{Settings, parse_args};

/// Initialize tracing.
///
/// `RUST_LOG` wins when set; otherwise `CHECKPLUS_LOG` picks the level for
/// this workspace's crates. `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let base_level = match std::env::var("CHECKPLUS_LOG").as_deref() {
            Ok("debug") => "debug",
            Ok("warn") | Ok("warning") => "warn",
            Ok("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!(
            "checkplus={level},checkplus_server={level}",
            level = base_level
        ))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

fn print_usage() {
    eprintln!("Usage: checkplus-server [--host <addr>] [--port <port>] [--agent <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --host <addr>    Bind address [env: HOST, default: 0.0.0.0]");
    eprintln!("  --port <port>    Bind port [env: PORT, default: 8888]");
    eprintln!("  --agent <path>   CPClient executable [env: CPCLIENT_PATH]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SITE_CODE, SITE_PASSWORD         Site credentials (required)");
    eprintln!("  CHECKPLUS_PUBLIC_URL             Default success/fail redirect URL");
    eprintln!("  CHECKPLUS_CORS_ORIGIN            Allowed CORS origin for /api routes");
    eprintln!("  CHECKPLUS_NAME_ENCODING          euc-kr (default) or utf-8");
    eprintln!("  CHECKPLUS_AGENT_TIMEOUT_SECS     Agent timeout [default: 10]");
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        agent = %settings.agent_path.display(),
        site_code = settings.credentials.site_code(),
        name_encoding = settings.name_encoding.label(),
        timeout = ?settings.agent_timeout,
        "Configured agent"
    );

    let codec = SessionCodec::new(
        AgentInvoker::new(settings.agent_config()),
        settings.codec_profile(),
    );

    let mut state = AppState::new(codec);
    if let Some(url) = &settings.public_url {
        state = state.with_public_url(url);
    }
    if let Some(origin) = &settings.cors_origin {
        state = state
            .with_cors_origin(origin)
            .with_context(|| format!("invalid CHECKPLUS_CORS_ORIGIN '{origin}'"))?;
    }

    let config = ServerConfig {
        host: settings.host,
        port: settings.port,
    };
    serve(config, Arc::new(state)).await
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            if !msg.is_empty() {
                eprintln!("error: {msg}");
                eprintln!();
            }
            print_usage();
            process::exit(2);
        }
    };

    init_tracing();

    let result = match Settings::load(cli, |key| std::env::var(key).ok()) {
        Ok(settings) => run(settings).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "checkplus-server failed");
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
