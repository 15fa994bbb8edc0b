//! Router and listener for the browser dashboard.
//!
//! | Route | Method | Description |
//! |-------|--------|-------------|
//! | `/` | GET | Single-page dashboard |
//! | `/health` | GET | Liveness and active provider |
//! | `/api/presets` | GET | Symbols, periods, styles, refresh interval |
//! | `/api/dashboard` | GET | Submit inputs and return the resulting state |
//! | `/api/refresh` | POST | Re-fetch the current inputs |
//! | `/api/state` | GET | Current state without fetching |

use std::net::SocketAddr;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers::{self, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/presets", get(handlers::presets))
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/refresh", post(handlers::refresh))
        .route("/api/state", get(handlers::current))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("tickdash dashboard on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}
