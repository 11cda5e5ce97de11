use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::handlers::{ask, health, AppState};
use crate::config::Config;
use crate::services::{OllamaClient, Warehouse};

/// Create the application router with its state
pub fn create_router(warehouse: Arc<Warehouse>, llm: Arc<OllamaClient>, config: Config) -> Router {
    let state = AppState {
        config,
        llm,
        warehouse,
    };

    Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthcheck))
        .route("/ask", post(ask::ask))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
