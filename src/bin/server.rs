use anyhow::Context;
use clap::Parser;
use std::net::IpAddr;
use techmate::config::ServerConfig;
use techmate::server::{app, AppState};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "TechMate learning-assistant API server", long_about = None)]
#[command(after_help = "ENVIRONMENT VARIABLES:
    HF_API_KEY              Bearer credential for the chat-completion router
    HOST, PORT              Listen address [default: 0.0.0.0:5000]
    LLM_BASE_URL            Router base URL [default: https://router.huggingface.co/v1]
    LLM_MODEL, NOTES_MODEL  Model overrides
    CODE_EXEC_URL           Piston base URL [default: https://emkc.org/api/v2/piston]
    LLM_TIMEOUT_SECS        Optional upstream deadline for model calls
    CODE_EXEC_TIMEOUT_SECS  Optional upstream deadline for code runs
    CORS_ORIGINS            Comma-separated allowed origins
    REPLY_CAPTURE_DIR       Write every prompt/reply pair here
    FIXTURES_PATH           JSON file replacing the demo dashboard data
    RUST_LOG                Log filter [default: info]")]
struct Args {
    /// Address to bind, overrides HOST
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to bind, overrides PORT
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let args = Args::parse();
    let mut config = ServerConfig::from_env().context("invalid configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let state = AppState::from_config(&config).context("failed to build application state")?;
    let app = app(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.socket_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.socket_addr()))?;
    info!(addr = %listener.local_addr()?, "TechMate API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown requested");
}
