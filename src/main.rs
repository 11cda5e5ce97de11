use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::{error, info};

mod api;
mod config;
mod models;
mod services;
mod validation;

use config::Config;
use services::{OllamaClient, Warehouse};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting server on {} (warehouse: {}, model: {})",
        config.server_address(),
        config.warehouse.path,
        config.llm.model
    );

    let warehouse = Arc::new(Warehouse::new(&config.warehouse.path));
    if let Err(e) = warehouse.require_exists() {
        // Not fatal at boot: ingestion may still be populating the file
        error!("{e}");
    }

    let llm = Arc::new(OllamaClient::new(&config)?);

    // Best-effort model warm-up; /healthz reports if the model is missing
    {
        let llm = llm.clone();
        tokio::spawn(async move {
            llm.warm_up().await;
        });
    }

    let app: Router = api::routes::create_router(warehouse, llm, config.clone());

    let addr: SocketAddr = config.server_address().parse()?;
    info!("Server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
