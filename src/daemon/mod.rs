mod app;
mod charger;
mod polling;
mod price;
mod server;

use crate::core::settings::Settings;
use crate::core::shutdown;
use anyhow::{Context, Result};
use app::Orchestrator;

pub async fn run(settings: Settings) -> Result<()> {
    tracing::info!("Starting electric-eye daemon");

    settings.validate()?;
    settings.validate_endpoints()?;

    let orchestrator = Orchestrator::from_settings(&settings)?;
    let (trigger, shutdown) = shutdown::channel();
    let mut task = tokio::spawn(orchestrator.run(shutdown));

    tokio::select! {
        result = &mut task => {
            return result.context("Orchestrator task panicked")?;
        }
        _ = shutdown_signal() => {}
    }

    trigger.trigger();
    task.await.context("Orchestrator task panicked")?
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
