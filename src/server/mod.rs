//! HTTP API over [`SpreadsheetServices`].
//!
//! Routes, relative to the base path:
//!
//! | method | path             | operation |
//! |--------|------------------|-----------|
//! | GET    | `/{sheet}`       | dump      |
//! | PUT    | `/{sheet}`       | load      |
//! | DELETE | `/{sheet}`       | clear     |
//! | GET    | `/{sheet}/{cell}`| query     |
//! | PATCH  | `/{sheet}/{cell}`| evaluate (`?expr=`) or copy (`?srcCellId=`) |
//! | DELETE | `/{sheet}/{cell}`| remove    |

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use gridcalc_core::SpreadsheetServices;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::ServerConfig;

/// Shared application state
pub struct AppState {
    pub services: Arc<SpreadsheetServices>,
}

/// Build the router, mounting the API under `base_path`.
pub fn router(services: Arc<SpreadsheetServices>, base_path: &str) -> Router {
    let state = Arc::new(AppState { services });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route(
            "/:sheet",
            get(handlers::dump)
                .put(handlers::load)
                .delete(handlers::clear)
                .fallback(handlers::not_found),
        )
        .route(
            "/:sheet/:cell",
            get(handlers::query)
                .patch(handlers::update)
                .delete(handlers::remove)
                .fallback(handlers::not_found),
        );

    let base = base_path.trim_matches('/');
    let app = if base.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{}", base), api)
    };

    app.fallback(handlers::not_found)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Serve until SIGINT/SIGTERM.
pub async fn run_server(
    services: Arc<SpreadsheetServices>,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let app = router(services, &config.base_path);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Gridcalc listening on http://{}{}", addr, config.base_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gridcalc shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
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
                error!("failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, stopping server...");
}
