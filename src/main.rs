//! Gallery Cache - asset cache server
//!
//! Serves the cache admin API and proxies asset requests to the origin.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallery_cache::cache::FileStorage;
use gallery_cache::clock::SystemClock;
use gallery_cache::proxy::HttpUpstream;
use gallery_cache::{
    create_router, run_startup_sweep, spawn_sweep_task, AppState, CacheCoordinator, Config,
    NetworkCacheProxy,
};

/// Main entry point for the gallery cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the persistent tier and the proxy store
/// 4. Activate the current proxy generation and sweep expired entries
/// 5. Start the periodic sweep task if configured
/// 6. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gallery_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Gallery Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: memory_capacity={}, port={}, origin={}, sweep_interval={}s",
        config.memory_capacity,
        config.server_port,
        config.origin_url,
        config.sweep_interval
    );

    let entries = FileStorage::open(config.persistent_dir())
        .with_context(|| format!("opening {}", config.persistent_dir().display()))?;
    let coordinator = Arc::new(CacheCoordinator::from_config(&config, Arc::new(entries)));

    let responses = FileStorage::open(config.proxy_dir())
        .with_context(|| format!("opening {}", config.proxy_dir().display()))?;
    let proxy = Arc::new(NetworkCacheProxy::new(
        Arc::new(HttpUpstream::new(config.origin_url.clone())),
        Arc::new(responses),
        config.proxy_generation.clone(),
        config.asset_prefix.clone(),
        Arc::new(SystemClock),
    ));
    proxy.activate();

    run_startup_sweep(&coordinator);
    let sweep_handle = (config.sweep_interval > 0)
        .then(|| spawn_sweep_task(coordinator.clone(), config.sweep_interval));

    let app = create_router(AppState::new(coordinator, proxy));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = sweep_handle {
        handle.abort();
        warn!("Sweep task aborted");
    }
}
