use anyhow::Result;
use homeplan_planner::{LocalStorage, Planner, SyncMode};
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::{config::Config, routes::AppState};

/// Mode Selector: builds the planner the configuration asks for.
///
/// Cloud mode opens the document store right away, so an unreachable store
/// or a rejected api key stops the process before it starts serving.
pub async fn planner(config: &Config) -> Result<Planner> {
    let storage = LocalStorage::new(&config.storage.data_dir);

    let planner = match config.sync_mode() {
        SyncMode::Local => {
            tracing::info!(data_dir = %config.storage.data_dir.display(), "Starting in local mode");
            Planner::local(storage)
        }
        SyncMode::Cloud => {
            tracing::info!(url = %config.cloud.url, "Starting in cloud mode");
            let backend = homeplan_store::open(
                &config.cloud.url,
                config.cloud.api_key.trim(),
                config.cloud.poll_interval(),
            )
            .await?;

            Planner::cloud(storage, backend)
        }
    };

    planner.start().await;

    Ok(planner)
}

pub fn app(state: AppState) -> axum::Router {
    crate::routes::router(state)
        .layer(axum::middleware::from_fn(
            crate::middleware::cache_control_middleware,
        ))
        // Minify HTML responses before compression
        .layer(axum::middleware::map_response(
            crate::middleware::minify_html_middleware,
        ))
        .layer(CompressionLayer::new().br(true).gzip(true))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(
    config: Config,
    host_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    tracing::info!("Starting homeplan server...");

    let host = host_override.unwrap_or(config.server.host.to_owned());
    let port = port_override.unwrap_or(config.server.port);

    let state = AppState::new(planner(&config).await?);
    let app = app(state.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C signal");
            },
            _ = terminate => {
                tracing::info!("Received SIGTERM signal");
            },
        }

        tracing::info!("Starting graceful shutdown...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    tracing::info!("Closing household subscriptions...");
    state.planner.shutdown().await;

    tracing::info!("Graceful shutdown complete");

    Ok(())
}
