use duckdb::Connection;

use crate::api::middleware::AppError;

/// The transformation layer registers its schemas either with a `main_`
/// prefix or with the plain layer name, depending on how the warehouse was
/// built. Candidates are probed in that priority order.
fn candidates(base: &str) -> [String; 2] {
    [format!("main_{base}"), base.to_string()]
}

/// Resolve the physical schema name for a logical layer ("silver", "gold").
/// Returns `None` when neither naming convention is present.
pub fn resolve_schema(conn: &Connection, base: &str) -> Result<Option<String>, AppError> {
    for candidate in candidates(base) {
        let exists = conn
            .prepare("SELECT 1 FROM information_schema.schemata WHERE schema_name = ? LIMIT 1")
            .and_then(|mut stmt| stmt.query([candidate.as_str()]).and_then(|mut rows| {
                rows.next().map(|row| row.is_some())
            }))
            .map_err(catalog_error)?;
        if exists {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Stronger variant that also requires a known table inside the candidate
/// schema. Used by the health probe to tell an empty schema from a
/// populated one.
pub fn resolve_schema_with_table(
    conn: &Connection,
    base: &str,
    table: &str,
) -> Result<Option<String>, AppError> {
    for candidate in candidates(base) {
        let exists = conn
            .prepare(
                "SELECT 1 FROM information_schema.tables \
                 WHERE table_schema = ? AND table_name = ? LIMIT 1",
            )
            .and_then(|mut stmt| {
                stmt.query([candidate.as_str(), table])
                    .and_then(|mut rows| rows.next().map(|row| row.is_some()))
            })
            .map_err(catalog_error)?;
        if exists {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// Render one line per table, `schema.table(col type, col type, ...)`,
/// tables in name order and columns in ordinal order. This is the textual
/// manifest the prompt grounds the model on.
pub fn schema_overview(conn: &Connection, schema: &str) -> Result<String, AppError> {
    let mut stmt = conn
        .prepare(
            "SELECT table_name, column_name, data_type \
             FROM information_schema.columns \
             WHERE table_schema = ? \
             ORDER BY table_name, ordinal_position",
        )
        .map_err(catalog_error)?;
    let mut rows = stmt.query([schema]).map_err(catalog_error)?;

    let mut lines: Vec<String> = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    loop {
        let row = match rows.next().map_err(catalog_error)? {
            Some(row) => row,
            None => break,
        };
        let table: String = row.get(0).map_err(catalog_error)?;
        let column: String = row.get(1).map_err(catalog_error)?;
        let data_type: String = row.get(2).map_err(catalog_error)?;

        match current.as_mut() {
            Some((name, columns)) if *name == table => {
                columns.push(format!("{column} {data_type}"));
            }
            _ => {
                if let Some((name, columns)) = current.take() {
                    lines.push(render_table(schema, &name, &columns));
                }
                current = Some((table, vec![format!("{column} {data_type}")]));
            }
        }
    }

    if let Some((name, columns)) = current {
        lines.push(render_table(schema, &name, &columns));
    }

    Ok(lines.join("\n"))
}

fn render_table(schema: &str, table: &str, columns: &[String]) -> String {
    format!("{schema}.{table}({})", columns.join(", "))
}

fn catalog_error(e: duckdb::Error) -> AppError {
    AppError::Internal(format!("catalog query failed: {e}"))
}
