use axum::{extract::State, Json};

use crate::api::handlers::AppState;
use crate::services::{schema_service, warehouse};

/// Service banner
pub async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "service": "f1-copilot",
        "model": state.config.llm.model,
        "warehouse": state.config.warehouse.path,
    }))
}

/// Health probe covering the warehouse file, a live read-only session, the
/// layered schemas, and the model endpoint. Degrades fields instead of
/// failing the request.
pub async fn healthcheck(State(state): State<AppState>) -> Json<serde_json::Value> {
    let wh = state.warehouse.clone();
    let (db_ok, schemas_ok) = tokio::task::spawn_blocking(move || {
        if wh.require_exists().is_err() {
            return (false, false);
        }
        let conn = match wh.open_read_only() {
            Ok(conn) => conn,
            Err(_) => return (false, false),
        };
        let db_ok = warehouse::ping(&conn);
        let schemas_ok = schema_service::resolve_schema_with_table(&conn, "silver", "laps")
            .ok()
            .flatten()
            .is_some()
            && schema_service::resolve_schema_with_table(&conn, "gold", "driver_session_summary")
                .ok()
                .flatten()
                .is_some();
        (db_ok, schemas_ok)
    })
    .await
    .unwrap_or((false, false));

    let ollama_ok = state.llm.tags_ok().await;

    Json(serde_json::json!({
        "status": "ok",
        "warehouse": state.config.warehouse.path,
        "db_ok": db_ok,
        "schemas_ok": schemas_ok,
        "ollama_ok": ollama_ok,
        "model": state.config.llm.model,
    }))
}
