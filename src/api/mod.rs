// file: src/api/mod.rs
// description: inbound HTTP surface, router construction and server loop
// reference: https://docs.rs/axum

pub mod handlers;
pub mod state;

pub use state::AppState;

use crate::error::Result;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/repository/setup", post(handlers::repository_setup))
        .route("/test", get(handlers::hello))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Binds `bind` and serves until the process is stopped.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
