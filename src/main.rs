// src/main.rs
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use site_monitor::{
    config::{self, DEFAULT_CONFIG_PATH},
    dashboard::Dashboard,
    metrics::{start_metrics_server, MetricsRegistry},
    probe::ProbeAggregator,
    server::{RequestHandler, ServerBuilder},
    sites::SiteGroups,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("site_monitor=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            config::load_config(&path).await?
        }
        None => config::load_config_or_default(DEFAULT_CONFIG_PATH).await?,
    };

    // Initialize metrics
    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let metrics = metrics_registry.collector();

    if config.metrics.enabled {
        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, metrics_registry.clone(), config.metrics.path.clone())
            .await?;
    }

    let groups = SiteGroups::builtin();
    info!(
        "Monitoring {} sites ({} in {}, {} in {})",
        groups.total_sites(),
        groups.server1.urls.len(),
        groups.server1.title,
        groups.server2.urls.len(),
        groups.server2.title,
    );

    let aggregator = Arc::new(ProbeAggregator::new(&config.probe, Some(metrics.clone()))?);
    let dashboard = Arc::new(Dashboard::new(
        aggregator,
        groups,
        &config.dashboard,
        Some(metrics.clone()),
    ));

    // Start the scheduled refresh; its first tick checks immediately.
    let scheduler = tokio::spawn(dashboard.clone().start());

    let handler = RequestHandler::new(dashboard.clone(), Some(metrics));

    info!("Starting site monitor on {}", config.listen_addr);
    let served = ServerBuilder::new(config.listen_addr)
        .with_handler(handler)
        .serve(shutdown_signal())
        .await;

    dashboard.shutdown();
    if let Err(e) = scheduler.await {
        error!("Dashboard scheduler task failed: {}", e);
    }

    served
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
