//! AthletIQ coach API server binary.
//!
//! Serves `POST /coach`. Configuration comes from the environment (optionally
//! a `.env` file); see `athletiq_api::config::ApiConfig::from_env`.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use athletiq_api::config::ApiConfig;

const DEFAULT_LOG_FILTER: &str = "info,athletiq_api=debug,athletiq_core=debug";

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "athletiq_api_server", about = "AthletIQ coach API server")]
struct Args {
    /// Address to listen on; overrides `BIND_ADDR`.
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (0 = ephemeral); replaces the port of the bind address.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(port) = args.port {
        config.bind_addr = with_port(&config.bind_addr, port);
    }

    info!(
        version = athletiq_core::version(),
        model = %config.model,
        auth_mode = ?config.auth_mode,
        "starting athletiq_api_server"
    );
    if config.openai_api_key.is_none() {
        info!("OPENAI_API_KEY is not set; coach requests will fail until it is");
    }

    let bind_addr = config.bind_addr.clone();
    let state = athletiq_api::AppState::from_config(config)?;
    let app = athletiq_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Replace the port of a `host:port` address.
fn with_port(bind_addr: &str, port: u16) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map_or(bind_addr, |(host, _)| host);
    format!("{host}:{port}")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
