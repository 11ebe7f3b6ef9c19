//! BioSarthi API - Main Entry Point

use clap::Parser;
use mimalloc::MiMalloc;

use biosarthi_api::config::AppConfig;
use biosarthi_api::logging::init_tracing;
use biosarthi_api::server::create_app;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Command-line arguments. Each one overrides the loaded configuration.
#[derive(Parser, Debug)]
#[command(name = "biosarthi-api")]
#[command(about = "BioSarthi API - chat persistence, sharing and admin views")]
#[command(version)]
struct Args {
    /// Host to bind to.
    #[arg(long, env = "BIOSARTHI_API_HOST")]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long, env = "BIOSARTHI_API_PORT")]
    port: Option<u16>,

    /// Log level or filter directive.
    #[arg(long)]
    log_level: Option<String>,

    /// Use the in-memory store even when Redis is configured.
    #[arg(long, env = "BIOSARTHI_IN_MEMORY")]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load()?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging);
    tracing::info!("Starting BioSarthi API v{}", env!("CARGO_PKG_VERSION"));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = create_app(config, args.in_memory).await?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down...");
        }
    }
}
