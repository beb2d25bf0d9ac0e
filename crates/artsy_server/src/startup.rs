use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use artsy_engine::{
    backfill_descriptions, ArtProvider, ArticClient, BackfillSummary, Broadcaster, DiscoverEngine,
    ImageStore, SessionController, StateStore,
};
use artsy_logging::{artsy_info, artsy_warn};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::routes::router;

/// Wire the controller for `config` over the given provider. Creates the data
/// directories and clears temp images left by a previous process.
pub fn build_controller(
    config: &ServerConfig,
    provider: Arc<dyn ArtProvider>,
) -> Result<SessionController> {
    let images = ImageStore::new(&config.data_dir);
    images
        .ensure_dirs()
        .with_context(|| format!("preparing data directory {:?}", config.data_dir))?;
    match images.clear_temp() {
        Ok(0) => {}
        Ok(count) => artsy_info!("Removed {} stale temp image(s)", count),
        Err(err) => artsy_warn!("Could not clear {:?}: {}", images.temp_dir(), err),
    }

    let discover = DiscoverEngine::new(provider, images.clone(), config.image_size);
    Ok(SessionController::new(
        StateStore::new(&config.data_dir),
        images,
        discover,
        Broadcaster::new(),
    ))
}

pub async fn serve(config: &ServerConfig) -> Result<()> {
    let client = ArticClient::new(config.provider_settings()).context("building HTTP client")?;
    let controller = Arc::new(build_controller(config, Arc::new(client))?);

    let applied = controller
        .initialize()
        .await
        .context("initializing session")?;
    artsy_info!(
        "Session ready: mode={} saved={} current={:?}",
        applied.session.mode.as_str(),
        applied.session.saved_count(),
        applied.current_artwork.as_ref().map(|artwork| artwork.id)
    );

    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    artsy_info!("Listening on http://{}", listener.local_addr()?);

    run_server(listener, controller, shutdown_signal()).await?;
    artsy_info!("Server stopped");
    Ok(())
}

/// Serve the API on `listener` until `stop` resolves, then close open event
/// streams and let in-flight requests finish.
pub async fn run_server<F>(
    listener: TcpListener,
    controller: Arc<SessionController>,
    stop: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (stopping_tx, stopping_rx) = watch::channel(false);
    axum::serve(listener, router(controller, stopping_rx))
        .with_graceful_shutdown(async move {
            stop.await;
            stopping_tx.send_replace(true);
        })
        .await
        .context("HTTP server failed")
}

pub async fn run_backfill(config: &ServerConfig) -> Result<BackfillSummary> {
    let client = ArticClient::new(config.provider_settings()).context("building HTTP client")?;
    let store = StateStore::new(&config.data_dir);
    let summary = backfill_descriptions(&store, &client)
        .await
        .with_context(|| format!("writing {:?}", store.path()))?;
    Ok(summary)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        artsy_warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    artsy_info!("Shutdown requested");
}
