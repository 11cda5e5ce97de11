use axum::{extract::State, Json};

use crate::api::handlers::AppState;
use crate::api::middleware::AppError;
use crate::models::{AskRequest, AskResponse};
use crate::services::{chart, llm_service, prompt_builder, schema_service, warehouse};
use crate::validation::{qualify_schema_names, SqlGuard};

/// Answer a natural-language question about the warehouse: resolve the
/// schema manifest, ask the model for SQL, guard it, execute it read-only,
/// and attach a chart hint.
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AppError::Validation("Question cannot be empty".to_string()));
    }
    tracing::info!("answering question: {question}");

    state.warehouse.require_exists()?;
    let max_rows = state.config.limits.max_rows;

    // Catalog discovery on the blocking pool; the driver is synchronous
    let wh = state.warehouse.clone();
    let (silver_schema, gold_schema, schema_doc) = tokio::task::spawn_blocking(
        move || -> Result<(String, String, String), AppError> {
            let conn = wh.open_read_only()?;

            let silver = schema_service::resolve_schema(&conn, "silver")?.ok_or_else(|| {
                AppError::SchemaUnavailable("run the transformation build first".to_string())
            })?;
            let gold = schema_service::resolve_schema(&conn, "gold")?.ok_or_else(|| {
                AppError::SchemaUnavailable("run the transformation build first".to_string())
            })?;

            let parts = [
                schema_service::schema_overview(&conn, &silver)?,
                schema_service::schema_overview(&conn, &gold)?,
            ];
            let schema_doc = parts
                .iter()
                .filter(|part| !part.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join("\n");

            Ok((silver, gold, schema_doc))
        },
    )
    .await
    .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))??;

    let system = prompt_builder::system_prompt(max_rows);
    let user = prompt_builder::build_user_prompt(
        &payload,
        &schema_doc,
        &silver_schema,
        &gold_schema,
        max_rows,
    );

    let raw = state.llm.generate(&system, &user).await?;
    let suggestion = llm_service::parse_suggestion(&raw)?;

    let candidate = qualify_schema_names(&suggestion.sql, &silver_schema, &gold_schema);
    let guarded = SqlGuard::guard(&candidate, max_rows)?;
    tracing::info!("guarded SQL: {}", guarded.sql);

    let wh = state.warehouse.clone();
    let sql = guarded.sql.clone();
    let result = tokio::task::spawn_blocking(move || {
        let conn = wh.open_read_only()?;
        warehouse::execute_query(&conn, &sql)
    })
    .await
    .map_err(|e| AppError::Internal(format!("blocking task failed: {e}")))??;

    let chart = chart::suggest_chart(&result, &suggestion);

    Ok(Json(AskResponse {
        sql: guarded.sql,
        rows: result.rows,
        columns: result.columns,
        row_count: result.row_count,
        chart,
        message: suggestion.justification,
        silver_schema,
        gold_schema,
    }))
}
