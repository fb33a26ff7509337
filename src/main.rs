//! Kubescrub Kubernetes Operator
//!
//! Main entry point for the operator. Parses configuration, sets up the
//! Kubernetes client, registers the Reaper controller, and runs the
//! reconciliation loop.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use kube::Client;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kubescrub_operator::{
    config::OperatorConfig,
    controllers::{self, Context},
    metrics,
    reconcilers::Reconciler,
    store::KubeStore,
};

/// How long in-flight reconciles get to observe cancellation on shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = OperatorConfig::parse();
    info!(
        naming = ?config.child_naming,
        metrics_port = config.metrics_port,
        "Starting Kubescrub Operator"
    );

    let reconciler_config = config.reconciler_config()?;

    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    let shutdown = CancellationToken::new();
    let reconciler = Reconciler::new(KubeStore::new(client.clone()), reconciler_config);
    let context = Arc::new(Context::new(reconciler, shutdown.clone()));

    let mut metrics_handle = tokio::spawn(metrics::serve(config.metrics_port, shutdown.clone()));
    info!("Metrics server starting on port {}", config.metrics_port);

    let mut controller_handle = tokio::spawn(controllers::run_reaper_controller(client, context));

    tokio::select! {
        _ = &mut controller_handle => {
            error!("Reaper controller exited unexpectedly");
        }
        _ = &mut metrics_handle => {
            error!("Metrics server exited unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal, stopping operator");
        }
    }

    shutdown.cancel();
    if !controller_handle.is_finished()
        && tokio::time::timeout(SHUTDOWN_GRACE, controller_handle).await.is_err()
    {
        warn!("Reaper controller did not stop within the grace period");
    }

    info!("Kubescrub Operator stopped");
    Ok(())
}

/// Initialize tracing subscriber
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kube=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
