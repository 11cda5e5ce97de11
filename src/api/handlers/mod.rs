pub mod ask;
pub mod health;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{OllamaClient, Warehouse};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: Arc<OllamaClient>,
    pub warehouse: Arc<Warehouse>,
}
