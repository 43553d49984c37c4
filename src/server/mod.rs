//! HTTP Server module
//!
//! Wires the stats router, binds the listener and runs it until a shutdown
//! signal, then drains in-flight requests for a bounded time.

use crate::api::{create_api_router, StatsState};
use crate::config::{AppConfig, ServerConfig};
use crate::error::{ServerError, StartupError};
use crate::youtube::{ChannelSource, UpstreamError, YoutubeClient};
use axum::Router;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

/// Create the main server router
pub fn create_server_router(state: Arc<StatsState>) -> Router {
    create_api_router(state).layer(TraceLayer::new_for_http())
}

/// Validate credentials and construct the upstream client through `connect`
///
/// `connect` receives the base URL and API key and runs at most once, only
/// after both required values are present.
pub fn build_state_with<S, F>(config: &AppConfig, connect: F) -> Result<Arc<StatsState>, StartupError>
where
    S: ChannelSource + 'static,
    F: FnOnce(&str, String) -> Result<S, UpstreamError>,
{
    let credentials = config.credentials()?;
    let source = connect(&config.youtube.base_url, credentials.api_key)?;

    Ok(Arc::new(StatsState::new(
        Arc::new(source),
        credentials.channel_id,
    )))
}

/// Build handler state backed by the real YouTube client
pub fn build_state(config: &AppConfig) -> Result<Arc<StatsState>, StartupError> {
    build_state_with(config, |base_url, api_key| {
        let client = YoutubeClient::new(base_url, api_key)?;
        tracing::info!(upstream = %client.endpoint(), "YouTube client ready");
        Ok(client)
    })
}

/// Wire the gateway from `config` and serve until SIGINT/SIGTERM
///
/// Nothing is bound unless the configuration is complete.
pub async fn run(config: &AppConfig) -> Result<(), StartupError> {
    let state = build_state(config)?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        channel_id = %state.channel_id,
        "Starting channel stats gateway"
    );

    start_server(&config.server, state).await?;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}

/// Serve `app` on `listener` until `shutdown` resolves
///
/// Once `shutdown` fires the listener stops accepting; requests already in
/// flight get `drain_timeout` to finish before [`ServerError::DrainTimeout`]
/// is returned.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (draining_tx, mut draining_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Received an interrupt signal, shutting down...");
            let _ = draining_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => result?,
        Ok(()) = &mut draining_rx => {
            match tokio::time::timeout(drain_timeout, &mut server).await {
                Ok(result) => result?,
                Err(_) => return Err(ServerError::DrainTimeout(drain_timeout)),
            }
        }
    }

    tracing::info!("HTTP server shutdown complete");
    Ok(())
}

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn start_server(config: &ServerConfig, state: Arc<StatsState>) -> Result<(), ServerError> {
    let addr = config.addr();
    let app = create_server_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(addr = %addr, "Service started");

    serve(listener, app, shutdown_signal(), config.shutdown_timeout()).await?;

    tracing::info!("Service stopped");
    Ok(())
}
