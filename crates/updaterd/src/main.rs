//! updaterd — the deployment updater daemon.
//!
//! Assembles the updater:
//! - Configuration (flags / environment)
//! - Kubernetes client (in-cluster or kubeconfig)
//! - Rollout trigger + outcome counters
//! - HTTP server (`/`, `/metrics`, `/healthz`) behind the access log
//!
//! # Usage
//!
//! ```text
//! NAMESPACE=prod DEPLOYMENT=web TOKEN=... updaterd --listen :8080
//! ```

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use updater_api::Updater;
use updater_core::{KubePatcher, RolloutTrigger};
use updater_metrics::OutcomeCounters;

use crate::config::{Config, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,updaterd=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_format);

    config.validate().context("invalid configuration")?;
    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(?config, "deployment updater starting");

    let client = kube_client(config.kube_timeout).await?;
    info!(timeout = ?config.kube_timeout, "kubernetes client initialized");

    let trigger = RolloutTrigger::new(
        Arc::new(KubePatcher::new(client)),
        config.namespace.as_str(),
        config.deployment.as_str(),
    );
    let counters = Arc::new(OutcomeCounters::new());
    let updater = Arc::new(Updater::new(config.token.into_bytes(), trigger, counters));

    let router = updater_api::build_router(updater);
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("unable to listen on {}", config.listen))?;

    info!(
        addr = %config.listen,
        namespace = %config.namespace,
        deployment = %config.deployment,
        "listening"
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("deployment updater stopped");
    Ok(())
}

/// Build a client from in-cluster credentials, falling back to kubeconfig.
async fn kube_client(timeout: Duration) -> anyhow::Result<kube::Client> {
    let mut config = kube::Config::infer()
        .await
        .context("unable to load kubernetes config")?;
    config.connect_timeout = Some(timeout);
    config.read_timeout = Some(timeout);
    config.write_timeout = Some(timeout);
    kube::Client::try_from(config).context("unable to create kubernetes client")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
