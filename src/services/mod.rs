pub mod chart;
pub mod llm_service;
pub mod prompt_builder;
pub mod schema_service;
pub mod warehouse;

pub use chart::*;
pub use llm_service::*;
pub use warehouse::*;
