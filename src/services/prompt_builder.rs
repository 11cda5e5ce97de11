use crate::models::AskRequest;

/// Fixed safety and style policy sent as the system message. JSON is the
/// output convention; the response extractor also tolerates a fenced SQL
/// block for models that ignore the last rule.
pub fn system_prompt(max_rows: u64) -> String {
    format!(
        r#"You are an analytics SQL copilot for a Formula 1 DuckDB warehouse.
You must ONLY produce read-only DuckDB SQL queries against the provided schemas.
Rules:
- Use fully qualified names with the resolved schemas.
- Never mutate data (no INSERT/UPDATE/DELETE/CREATE/ALTER/DROP).
- Limit every result set to at most {max_rows} rows.
- If the user requests unsupported data, explain gracefully.
- Respond strictly in compact JSON: {{"sql": "...", "chart_type": "table|line|bar|scatter", "chart_fields": {{"x": "...", "y": "..."}}, "justification": "..."}}."#
    )
}

/// Deterministic assembly of the user message: policy, table-usage
/// guidance, schema manifest, request hints, then the question.
pub fn build_user_prompt(
    request: &AskRequest,
    schema_doc: &str,
    silver_schema: &str,
    gold_schema: &str,
    max_rows: u64,
) -> String {
    let mut hints: Vec<String> = Vec::new();
    if let Some(season) = request.season {
        hints.push(format!("Season hint: {season}"));
    }
    if let Some(session_code) = request
        .session_code
        .as_deref()
        .filter(|code| !code.trim().is_empty())
    {
        hints.push(format!("Session hint: {session_code}"));
    }
    let hint_block = if hints.is_empty() {
        "Hints: none provided.".to_string()
    } else {
        format!("Hints:\n{}", hints.join("\n"))
    };

    let table_guidance = format!(
        r#"Important modeling guidance:
- Use {gold_schema}.driver_session_summary for driver-level metrics (driver, team, best_lap_time, laps_total, personal_best_laps).
- Use {gold_schema}.team_event_summary for team-level metrics (team_laps_on_track, team_pitstops, team_best_lap_time).
- Use {silver_schema}.laps for raw lap telemetry (lap_time, lapnumber, driver, driver_number, team, pit_in_time, pit_out_time, sector1time..3time).
Do NOT reference columns that are not listed in the schema dump below.
Always prefer the gold tables when best_lap_time or aggregated insights are requested."#
    );

    format!(
        "{policy}\n\n{table_guidance}\n\nSchemas:\n{schema_doc}\n\n{hint_block}\n\nQuestion:\n{question}\n\nRespond strictly with JSON (no markdown) containing sql, chart_type, chart_fields, and justification.",
        policy = system_prompt(max_rows),
        question = request.question.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(question: &str, season: Option<i32>, session_code: Option<&str>) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            season,
            session_code: session_code.map(str::to_string),
        }
    }

    #[test]
    fn test_system_prompt_carries_row_cap() {
        let prompt = system_prompt(200);
        assert!(prompt.contains("at most 200 rows"));
        assert!(prompt.contains(r#""chart_type": "table|line|bar|scatter""#));
    }

    #[test]
    fn test_build_user_prompt_with_hints() {
        let request = request("fastest team?", Some(2024), Some("Q"));
        let prompt = build_user_prompt(
            &request,
            "gold.team_event_summary(team VARCHAR, team_best_lap_time BIGINT)",
            "main_silver",
            "main_gold",
            100,
        );

        assert!(prompt.contains("Season hint: 2024"));
        assert!(prompt.contains("Session hint: Q"));
        assert!(prompt.contains("main_gold.team_event_summary"));
        assert!(prompt.contains("main_silver.laps"));
        assert!(prompt.contains("gold.team_event_summary(team VARCHAR"));
        assert!(prompt.contains("Question:\nfastest team?"));
    }

    #[test]
    fn test_build_user_prompt_without_hints() {
        let request = request("average lap time", None, None);
        let prompt = build_user_prompt(&request, "silver.laps(lap_time BIGINT)", "silver", "gold", 200);
        assert!(prompt.contains("Hints: none provided."));
        assert!(!prompt.contains("Season hint"));
    }

    #[test]
    fn test_build_user_prompt_is_deterministic() {
        let request = request("laps per driver", Some(2023), None);
        let a = build_user_prompt(&request, "doc", "silver", "gold", 50);
        let b = build_user_prompt(&request, "doc", "silver", "gold", 50);
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_session_code_is_ignored() {
        let request = request("q", None, Some("  "));
        let prompt = build_user_prompt(&request, "doc", "silver", "gold", 50);
        assert!(prompt.contains("Hints: none provided."));
    }
}
