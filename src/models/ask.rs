use serde::{Deserialize, Deserializer, Serialize};

/// Inbound natural-language question about the warehouse
#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Optional season hint, e.g. 2024
    pub season: Option<i32>,
    /// Optional session hint such as R, Q, FP1
    pub session_code: Option<String>,
}

/// Terminal response returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub sql: String,
    pub rows: Vec<serde_json::Value>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub chart: ChartHint,
    pub message: String,
    pub silver_schema: String,
    pub gold_schema: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Table,
    Line,
    Bar,
    Scatter,
}

/// Axis mapping for a suggested chart
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChartFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

/// Suggested visualization for a result set
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChartHint {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub fields: ChartFields,
}

impl ChartHint {
    pub fn table() -> Self {
        Self {
            chart_type: ChartType::Table,
            fields: ChartFields::default(),
        }
    }
}

/// Structured result parsed from raw model output
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ParsedSuggestion {
    /// Missing SQL is deferred to the guard, which rejects an empty statement
    #[serde(default)]
    pub sql: String,
    #[serde(default)]
    pub chart_type: ChartType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chart_fields: ChartFields,
    #[serde(default = "default_justification")]
    pub justification: String,
}

impl ParsedSuggestion {
    /// Suggestion carrying only a statement, used for the fenced-SQL output shape
    pub fn from_sql(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            chart_type: ChartType::Table,
            chart_fields: ChartFields::default(),
            justification: default_justification(),
        }
    }
}

fn default_justification() -> String {
    "Query executed successfully.".to_string()
}

// Some models emit "chart_fields": null instead of omitting the key
fn null_as_default<'de, D>(deserializer: D) -> Result<ChartFields, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ChartFields>::deserialize(deserializer)?.unwrap_or_default())
}

/// Materialized tabular result of a guarded statement
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    /// Records keyed by column name
    pub rows: Vec<serde_json::Value>,
    pub row_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_suggestion_round_trip() {
        let payload = r#"{"sql":"select 1","chart_type":"bar","chart_fields":{"x":"a","y":"b"},"justification":"ok"}"#;
        let parsed: ParsedSuggestion = serde_json::from_str(payload).unwrap();
        assert_eq!(parsed.sql, "select 1");
        assert_eq!(parsed.chart_type, ChartType::Bar);
        assert_eq!(parsed.chart_fields.x.as_deref(), Some("a"));
        assert_eq!(parsed.chart_fields.y.as_deref(), Some("b"));
        assert_eq!(parsed.justification, "ok");
    }

    #[test]
    fn test_parsed_suggestion_defaults() {
        let parsed: ParsedSuggestion = serde_json::from_str(r#"{"sql":"select 1"}"#).unwrap();
        assert_eq!(parsed.chart_type, ChartType::Table);
        assert_eq!(parsed.chart_fields, ChartFields::default());
        assert_eq!(parsed.justification, "Query executed successfully.");
    }

    #[test]
    fn test_parsed_suggestion_null_chart_fields() {
        let parsed: ParsedSuggestion =
            serde_json::from_str(r#"{"sql":"select 1","chart_fields":null}"#).unwrap();
        assert_eq!(parsed.chart_fields, ChartFields::default());
    }

    #[test]
    fn test_missing_sql_defaults_to_empty() {
        let parsed: ParsedSuggestion = serde_json::from_str(r#"{"chart_type":"line"}"#).unwrap();
        assert!(parsed.sql.is_empty());
    }

    #[test]
    fn test_chart_hint_serialization() {
        let hint = ChartHint {
            chart_type: ChartType::Line,
            fields: ChartFields {
                x: Some("lapnumber".to_string()),
                y: Some("lap_time".to_string()),
            },
        };
        let value = serde_json::to_value(&hint).unwrap();
        assert_eq!(value["type"], "line");
        assert_eq!(value["fields"]["x"], "lapnumber");
    }
}
