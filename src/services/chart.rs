use crate::models::{ChartFields, ChartHint, ChartType, ParsedSuggestion, QueryResult};

/// Column names that suggest a progression axis
const TREND_COLUMNS: &[&str] = &["lapnumber", "lap_number", "round", "season"];

/// Bar charts stop being readable past this many rows
const SMALL_RESULT_ROWS: usize = 25;

/// Pick a visualization for the result set. The model's own hint wins when
/// it names real columns; otherwise a deterministic heuristic over the
/// result shape applies. A wrong guess only degrades presentation.
pub fn suggest_chart(result: &QueryResult, suggestion: &ParsedSuggestion) -> ChartHint {
    if suggestion.chart_type != ChartType::Table {
        let fields = &suggestion.chart_fields;
        if let (Some(x), Some(y)) = (&fields.x, &fields.y) {
            if result.columns.contains(x) && result.columns.contains(y) {
                return ChartHint {
                    chart_type: suggestion.chart_type.clone(),
                    fields: fields.clone(),
                };
            }
        }
    }

    let numeric: Vec<&String> = result
        .columns
        .iter()
        .filter(|column| is_numeric_column(result, column))
        .collect();

    if numeric.is_empty() {
        return ChartHint::table();
    }

    if let Some(trend) = result
        .columns
        .iter()
        .find(|column| TREND_COLUMNS.contains(&column.to_lowercase().as_str()))
    {
        let y = numeric
            .iter()
            .find(|column| **column != trend)
            .copied()
            .or_else(|| numeric.first().copied());
        return ChartHint {
            chart_type: ChartType::Line,
            fields: ChartFields {
                x: Some(trend.clone()),
                y: y.cloned(),
            },
        };
    }

    if result.row_count <= SMALL_RESULT_ROWS {
        let x = result
            .columns
            .iter()
            .find(|column| !numeric.contains(column))
            .or_else(|| result.columns.first());
        return ChartHint {
            chart_type: ChartType::Bar,
            fields: ChartFields {
                x: x.cloned(),
                y: numeric.first().map(|column| (*column).clone()),
            },
        };
    }

    ChartHint::table()
}

fn is_numeric_column(result: &QueryResult, column: &str) -> bool {
    result
        .rows
        .iter()
        .any(|row| row.get(column).is_some_and(|value| value.is_number()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(columns: &[&str], rows: Vec<serde_json::Value>) -> QueryResult {
        QueryResult {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            row_count: rows.len(),
            rows,
        }
    }

    fn suggestion(chart_type: ChartType, x: Option<&str>, y: Option<&str>) -> ParsedSuggestion {
        ParsedSuggestion {
            sql: "select 1".to_string(),
            chart_type,
            chart_fields: ChartFields {
                x: x.map(str::to_string),
                y: y.map(str::to_string),
            },
            justification: "ok".to_string(),
        }
    }

    #[test]
    fn test_model_hint_honored_when_columns_exist() {
        let result = result(
            &["team", "avg_lap"],
            vec![json!({"team": "Red Bull", "avg_lap": 90.1})],
        );
        let hint = suggest_chart(&result, &suggestion(ChartType::Bar, Some("team"), Some("avg_lap")));
        assert_eq!(hint.chart_type, ChartType::Bar);
        assert_eq!(hint.fields.x.as_deref(), Some("team"));
        assert_eq!(hint.fields.y.as_deref(), Some("avg_lap"));
    }

    #[test]
    fn test_model_hint_ignored_when_columns_missing() {
        let rows = vec![json!({"team": "Red Bull", "avg_lap": 90.1})];
        let result = result(&["team", "avg_lap"], rows);
        // y names a column the query never produced; heuristic takes over
        let hint = suggest_chart(&result, &suggestion(ChartType::Scatter, Some("team"), Some("nope")));
        assert_eq!(hint.chart_type, ChartType::Bar);
        assert_eq!(hint.fields.y.as_deref(), Some("avg_lap"));
    }

    #[test]
    fn test_trend_column_prefers_line() {
        let rows: Vec<_> = (1..=40)
            .map(|n| json!({"lapnumber": n, "lap_time": 90_000 + n}))
            .collect();
        let result = result(&["lapnumber", "lap_time"], rows);
        let hint = suggest_chart(&result, &suggestion(ChartType::Table, None, None));
        assert_eq!(hint.chart_type, ChartType::Line);
        assert_eq!(hint.fields.x.as_deref(), Some("lapnumber"));
        assert_eq!(hint.fields.y.as_deref(), Some("lap_time"));
    }

    #[test]
    fn test_small_numeric_result_prefers_bar() {
        let rows = vec![
            json!({"team": "Red Bull", "pitstops": 3}),
            json!({"team": "Ferrari", "pitstops": 4}),
        ];
        let result = result(&["team", "pitstops"], rows);
        let hint = suggest_chart(&result, &suggestion(ChartType::Table, None, None));
        assert_eq!(hint.chart_type, ChartType::Bar);
        assert_eq!(hint.fields.x.as_deref(), Some("team"));
        assert_eq!(hint.fields.y.as_deref(), Some("pitstops"));
    }

    #[test]
    fn test_large_result_falls_back_to_table() {
        let rows: Vec<_> = (0..60)
            .map(|n| json!({"driver": format!("D{n}"), "points": n}))
            .collect();
        let result = result(&["driver", "points"], rows);
        let hint = suggest_chart(&result, &suggestion(ChartType::Table, None, None));
        assert_eq!(hint.chart_type, ChartType::Table);
    }

    #[test]
    fn test_no_numeric_columns_falls_back_to_table() {
        let rows = vec![json!({"driver": "VER", "team": "Red Bull"})];
        let result = result(&["driver", "team"], rows);
        let hint = suggest_chart(&result, &suggestion(ChartType::Table, None, None));
        assert_eq!(hint, ChartHint::table());
    }

    #[test]
    fn test_empty_result_is_a_table() {
        let result = result(&["team"], vec![]);
        let hint = suggest_chart(&result, &suggestion(ChartType::Table, None, None));
        assert_eq!(hint.chart_type, ChartType::Table);
    }
}
