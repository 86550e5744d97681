use anyhow::Result;
use clap::Parser;
use rcs7100::{Cli, Config, ConnectionController, FatalError, MonitorBridge, TlsTransport};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Remote Control System for IC-7100");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<FatalError>()
                .map(FatalError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let cfg = Config::load(&cli.config)?;
    let session = cfg.session_config(&cli)?;

    info!("Server: {}", session.address);
    info!("Username: {}", session.credentials.username);

    let controller = ConnectionController::new(
        session,
        Arc::new(TlsTransport::new()),
        Arc::new(MonitorBridge::new()),
    );

    controller.run(shutdown_signal()).await
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Unable to listen for interrupt: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }

    info!("Interrupt received, shutting down");
}
