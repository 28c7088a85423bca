use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use vanish_media::ImageTranscoder;
use vanish_server::api::AppState;
use vanish_server::config::VanishConfig;
use vanish_server::error::ServerError;
use vanish_vault::{Argon2Hasher, SecretStore};

/// Vanish one-time photo sharing server.
#[derive(Parser, Debug)]
#[command(name = "vanish-server", about = "Standalone HTTP server for vanish")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "vanish.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let cli = Cli::parse();

    // Load configuration from TOML file, or use defaults if the file does not exist.
    let loaded = VanishConfig::load(Path::new(&cli.config))?;
    let config_found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    vanish_server::telemetry::init(&config.logging);

    if !config_found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    let kv = vanish_server::state_factory::create_kv_store(&config.state).await?;
    let transcoder = Arc::new(ImageTranscoder::new(config.media.options()));
    let hasher = Arc::new(Argon2Hasher::default());
    let vault = Arc::new(SecretStore::new(kv, transcoder, hasher));

    let state = AppState {
        vault,
        upload: Arc::new(config.upload.clone()),
    };
    let app = vanish_server::api::router(state);

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "vanish-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM, then give in-flight
    // requests a bounded window to finish.
    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = signalled_tx.send(());
            })
            .await
    });

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    if signalled_rx.await.is_ok() {
        info!(
            timeout_secs = config.server.shutdown_timeout_seconds,
            "draining in-flight requests..."
        );
        match tokio::time::timeout(shutdown_timeout, server).await {
            Ok(joined) => joined.map_err(join_failed)??,
            Err(_) => warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, dropping in-flight requests"
            ),
        }
    } else {
        // The server stopped before any signal arrived.
        server.await.map_err(join_failed)??;
    }

    info!("vanish-server shut down");
    Ok(())
}

fn join_failed(e: tokio::task::JoinError) -> ServerError {
    ServerError::Io(std::io::Error::other(e))
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
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
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
