use std::path::{Path, PathBuf};

use duckdb::types::ValueRef;
use duckdb::{AccessMode, Connection};

use crate::api::middleware::AppError;
use crate::models::QueryResult;

/// Handle to the DuckDB warehouse file. Connections are opened read-only,
/// per request, and dropped on every exit path.
pub struct Warehouse {
    path: PathBuf,
}

impl Warehouse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Checked before any connection attempt
    pub fn require_exists(&self) -> Result<(), AppError> {
        if self.path.exists() {
            Ok(())
        } else {
            Err(AppError::WarehouseUnavailable(format!(
                "warehouse not found at {}",
                self.path.display()
            )))
        }
    }

    pub fn open_read_only(&self) -> Result<Connection, AppError> {
        self.require_exists()?;
        let config = duckdb::Config::default()
            .access_mode(AccessMode::ReadOnly)
            .map_err(|e| AppError::Internal(format!("invalid connection config: {e}")))?;
        Connection::open_with_flags(&self.path, config)
            .map_err(|e| AppError::WarehouseUnavailable(format!("failed to open warehouse: {e}")))
    }
}

/// Liveness probe used by the health endpoint
pub fn ping(conn: &Connection) -> bool {
    conn.query_row("select 1", [], |row| row.get::<_, i32>(0))
        .is_ok()
}

/// Execute a guarded statement and materialize rows as records keyed by
/// column name. Engine rejections (unknown column, binder errors) are a
/// client-fault outcome, not a service failure.
pub fn execute_query(conn: &Connection, sql: &str) -> Result<QueryResult, AppError> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| AppError::QueryExecutionFailed(e.to_string()))?;

    let column_count = stmt.column_count();
    let columns: Vec<String> = (0..column_count)
        .map(|i| {
            stmt.column_name(i)
                .map(|name| name.to_string())
                .unwrap_or_else(|_| format!("col_{i}"))
        })
        .collect();

    let mut rows = stmt
        .query([])
        .map_err(|e| AppError::QueryExecutionFailed(e.to_string()))?;

    let mut records = Vec::new();
    loop {
        let row = match rows.next() {
            Ok(Some(row)) => row,
            Ok(None) => break,
            Err(e) => return Err(AppError::QueryExecutionFailed(e.to_string())),
        };

        let mut record = serde_json::Map::with_capacity(column_count);
        for (i, column) in columns.iter().enumerate() {
            let value_ref = row
                .get_ref(i)
                .map_err(|e| AppError::QueryExecutionFailed(e.to_string()))?;
            record.insert(column.clone(), value_ref_to_json(value_ref));
        }
        records.push(serde_json::Value::Object(record));
    }

    let row_count = records.len();
    Ok(QueryResult {
        columns,
        rows: records,
        row_count,
    })
}

fn value_ref_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(i) => serde_json::Value::from(i),
        ValueRef::SmallInt(i) => serde_json::Value::from(i),
        ValueRef::Int(i) => serde_json::Value::from(i),
        ValueRef::BigInt(i) => serde_json::Value::from(i),
        ValueRef::HugeInt(i) => serde_json::Value::String(i.to_string()),
        ValueRef::UTinyInt(i) => serde_json::Value::from(i),
        ValueRef::USmallInt(i) => serde_json::Value::from(i),
        ValueRef::UInt(i) => serde_json::Value::from(i),
        ValueRef::UBigInt(i) => serde_json::Value::from(i),
        ValueRef::Float(f) => serde_json::json!(f),
        ValueRef::Double(f) => serde_json::json!(f),
        ValueRef::Text(bytes) => {
            // Lossy so malformed text degrades visibly instead of vanishing
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Timestamp(_, t) => serde_json::Value::from(t),
        // Remaining engine types (blobs, intervals, nested) have no JSON
        // counterpart the dashboard consumes
        _ => serde_json::Value::Null,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::validation::SqlGuard;
    use tempfile::TempDir;

    /// Builds a populated warehouse file under a temp directory
    pub(crate) fn seed_warehouse() -> (TempDir, Warehouse) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f1.duckdb");

        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"
            CREATE SCHEMA silver;
            CREATE SCHEMA gold;
            CREATE TABLE silver.laps (
                driver VARCHAR,
                team VARCHAR,
                lapnumber INTEGER,
                lap_time BIGINT
            );
            CREATE TABLE gold.team_event_summary (
                team VARCHAR,
                team_best_lap_time BIGINT
            );
            CREATE TABLE gold.driver_session_summary (
                driver VARCHAR,
                team VARCHAR,
                best_lap_time BIGINT,
                laps_total INTEGER
            );
            INSERT INTO silver.laps
            SELECT 'VER', 'Red Bull', n, 90000000000 + n * 1000
            FROM range(1, 11) t(n);
            INSERT INTO gold.team_event_summary VALUES
                ('Red Bull', 90000000000),
                ('Ferrari', 90500000000),
                ('McLaren', 90300000000);
            INSERT INTO gold.driver_session_summary VALUES
                ('VER', 'Red Bull', 90000000000, 57);
            "#,
        )
        .unwrap();
        drop(conn);

        (dir, Warehouse::new(path))
    }

    #[test]
    fn test_require_exists_missing_file() {
        let warehouse = Warehouse::new("/nonexistent/f1.duckdb");
        let err = warehouse.require_exists().unwrap_err();
        assert!(matches!(err, AppError::WarehouseUnavailable(_)));
    }

    #[test]
    fn test_open_read_only_and_ping() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();
        assert!(ping(&conn));
    }

    #[test]
    fn test_read_only_session_rejects_writes() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();
        assert!(conn
            .execute_batch("INSERT INTO gold.team_event_summary VALUES ('Alpine', 1)")
            .is_err());
    }

    #[test]
    fn test_execute_query_returns_records() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();

        let result = execute_query(
            &conn,
            "select team, team_best_lap_time from gold.team_event_summary order by team",
        )
        .unwrap();
        assert_eq!(result.columns, vec!["team", "team_best_lap_time"]);
        assert_eq!(result.row_count, 3);
        assert_eq!(result.rows[0]["team"], "Ferrari");
        assert_eq!(result.rows[0]["team_best_lap_time"], 90500000000i64);
    }

    #[test]
    fn test_guarded_statement_caps_rows() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();

        let guarded = SqlGuard::guard("select * from silver.laps", 5).unwrap();
        let result = execute_query(&conn, &guarded.sql).unwrap();
        assert_eq!(result.row_count, 5);
    }

    #[test]
    fn test_guarded_statement_with_trailing_comment_executes() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();

        let guarded = SqlGuard::guard("select * from silver.laps -- raw laps", 4).unwrap();
        let result = execute_query(&conn, &guarded.sql).unwrap();
        assert_eq!(result.row_count, 4);
    }

    #[test]
    fn test_invalid_utf8_text_degrades_visibly() {
        let value = value_ref_to_json(ValueRef::Text(&[0xff, b'o', b'k']));
        assert_eq!(value, serde_json::Value::String("\u{FFFD}ok".to_string()));
    }

    #[test]
    fn test_outer_cap_beats_inner_limit() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();

        let guarded = SqlGuard::guard("select * from silver.laps limit 500", 3).unwrap();
        let result = execute_query(&conn, &guarded.sql).unwrap();
        assert_eq!(result.row_count, 3);
    }

    #[test]
    fn test_execute_query_engine_error_is_client_fault() {
        let (_dir, warehouse) = seed_warehouse();
        let conn = warehouse.open_read_only().unwrap();

        let err = execute_query(&conn, "select no_such_column from silver.laps").unwrap_err();
        assert!(matches!(err, AppError::QueryExecutionFailed(_)));
    }
}
