use std::future::Future;
use std::net::SocketAddr;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{
    services::{get_danger, get_rain, get_wind_direction, get_wind_speed, health},
    state::AppState,
};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Build the read API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/rain", get(get_rain))
        .route("/api/v1/wind/speed", get(get_wind_speed))
        .route("/api/v1/wind/direction", get(get_wind_direction))
        .route("/api/v1/danger", get(get_danger))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve the read API until `shutdown` resolves
pub async fn run<F>(address: SocketAddr, state: AppState, shutdown: F) -> Result<(), AnyError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(state);

    let listener = TcpListener::bind(address).await?;
    info!(%address, "weatherfusion API listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
