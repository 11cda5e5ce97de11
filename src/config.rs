use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub warehouse: WarehouseConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    pub max_rows: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env first so the overrides below can see it
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("warehouse.path", "/opt/data/warehouse/f1.duckdb")?
            .set_default("llm.endpoint", "http://ollama:11434")?
            .set_default("llm.model", "llama3.2:3b")?
            .set_default("llm.timeout_secs", 90)?
            .set_default("limits.max_rows", 200)?
            .set_default("logging.level", "info")?;

        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(8000))?;
        }

        if let Ok(path) = env::var("F1_WAREHOUSE") {
            builder = builder.set_override("warehouse.path", path)?;
        }

        if let Ok(endpoint) = env::var("OLLAMA_URL") {
            builder = builder.set_override("llm.endpoint", endpoint)?;
        }

        if let Ok(model) = env::var("OLLAMA_MODEL") {
            builder = builder.set_override("llm.model", model)?;
        }

        if let Ok(timeout) = env::var("OLLAMA_TIMEOUT_SECS") {
            builder = builder.set_override("llm.timeout_secs", timeout.parse::<u64>().unwrap_or(90))?;
        }

        if let Ok(max_rows) = env::var("AI_MAX_ROWS") {
            builder = builder.set_override("limits.max_rows", max_rows.parse::<u64>().unwrap_or(200))?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
