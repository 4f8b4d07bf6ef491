pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::Result;
use crate::services::advisor::Advisor;
use crate::services::store::SqliteStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub advisor: Arc<Advisor>,
}

/// Start the dashboard server.
pub async fn serve(store: Arc<SqliteStore>, advisor: Arc<Advisor>, port: u16) -> Result<()> {
    let state = AppState { store, advisor };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    info!("Registering routes:");
    info!("  GET  /                        dashboard page");
    info!("  GET  /api/codes");
    info!("  GET  /api/stocks/{{code}}");
    info!("  GET  /charts/{{code}}/price.svg");
    info!("  GET  /charts/{{code}}/volume.svg");
    info!("  POST /api/advice");
    info!("  GET  /health");

    let app = Router::new()
        .route("/", get(api::dashboard_page))
        .route("/api/codes", get(api::list_codes_handler))
        .route("/api/stocks/{code}", get(api::stock_rows_handler))
        .route("/charts/{code}/price.svg", get(api::price_chart_handler))
        .route("/charts/{code}/volume.svg", get(api::volume_chart_handler))
        .route("/api/advice", post(api::advice_handler))
        .route("/health", get(api::health_handler))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
