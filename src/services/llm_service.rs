use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::json;

use crate::api::middleware::AppError;
use crate::config::Config;
use crate::models::ParsedSuggestion;

/// Near-deterministic sampling for SQL generation
const TEMPERATURE: f64 = 0.1;

/// Client for the local Ollama chat endpoint. No retries: retry policy, if
/// any, belongs to the caller.
pub struct OllamaClient {
    endpoint: String,
    model: String,
    http_client: HttpClient,
}

impl OllamaClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: config.llm.endpoint.trim_end_matches('/').to_string(),
            model: config.llm.model.clone(),
            http_client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one non-streaming chat request and return the raw text content.
    /// Transport failures (including timeout expiry) map to
    /// `EndpointUnreachable`; non-success statuses and empty content map to
    /// `EndpointError`.
    pub async fn generate(&self, system: &str, user: &str) -> Result<String, AppError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "stream": false,
            "options": {"temperature": TEMPERATURE},
        });

        let response = self
            .http_client
            .post(format!("{}/api/chat", self.endpoint))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                AppError::EndpointUnreachable(format!("model endpoint connection failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::EndpointError(format!(
                "model endpoint returned {status}: {body}"
            )));
        }

        let data: serde_json::Value = response.json().await.map_err(|e| {
            AppError::EndpointError(format!("failed to decode model endpoint response: {e}"))
        })?;

        let content = data
            .pointer("/message/content")
            .and_then(|v| v.as_str())
            .or_else(|| data.get("response").and_then(|v| v.as_str()))
            .unwrap_or("");

        if content.trim().is_empty() {
            return Err(AppError::EndpointError(
                "model endpoint returned no content".to_string(),
            ));
        }

        Ok(content.to_string())
    }

    /// Best-effort startup warm-up: pull the configured model if the
    /// endpoint does not have it yet. Failures are logged and swallowed;
    /// the health endpoint surfaces a missing model.
    pub async fn warm_up(&self) {
        let tags = match self
            .http_client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
        {
            Ok(response) => response.json::<serde_json::Value>().await.ok(),
            Err(e) => {
                tracing::warn!("model endpoint not reachable during warm-up: {e}");
                return;
            }
        };

        let present = tags
            .as_ref()
            .and_then(|v| v.get("models"))
            .and_then(|v| v.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m.get("name").and_then(|n| n.as_str()))
                    .any(|name| name == self.model)
            })
            .unwrap_or(false);

        if present {
            return;
        }

        tracing::info!("pulling model {}", self.model);
        if let Err(e) = self
            .http_client
            .post(format!("{}/api/pull", self.endpoint))
            .json(&json!({"name": self.model}))
            .send()
            .await
        {
            tracing::warn!("model pull failed: {e}");
        }
    }

    /// Reachability probe used by the health endpoint
    pub async fn tags_ok(&self) -> bool {
        self.http_client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
            .map(|response| response.status().is_success())
            .unwrap_or(false)
    }
}

/// Parse raw model output into a structured suggestion.
///
/// The richer JSON shape is attempted first, after stripping a surrounding
/// markdown fence if present. When that fails, a ```sql fenced block is
/// accepted as a narrower fallback carrying only the statement. Anything
/// else is `MalformedModelOutput` with the decode error attached.
pub fn parse_suggestion(raw: &str) -> Result<ParsedSuggestion, AppError> {
    let cleaned = strip_fence(raw);
    match serde_json::from_str::<ParsedSuggestion>(cleaned) {
        Ok(suggestion) => Ok(suggestion),
        Err(decode_err) => match extract_sql_fence(raw) {
            Some(sql) => Ok(ParsedSuggestion::from_sql(sql)),
            None => Err(AppError::MalformedModelOutput(decode_err.to_string())),
        },
    }
}

/// Strip a surrounding markdown fence, tolerating a language tag on the
/// opening line
fn strip_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if cleaned.starts_with("```") {
        cleaned = cleaned
            .split_once('\n')
            .map(|(_, rest)| rest)
            .unwrap_or("");
        if let Some(end) = cleaned.find("```") {
            cleaned = &cleaned[..end];
        }
    }
    cleaned.trim()
}

/// Extract the statement from a ```sql fenced block, case-insensitive on
/// the tag
fn extract_sql_fence(raw: &str) -> Option<String> {
    let tag = b"```sql";
    let start = raw
        .as_bytes()
        .windows(tag.len())
        .position(|window| window.eq_ignore_ascii_case(tag))?;
    let body = &raw[start + tag.len()..];
    let end = body.find("```").unwrap_or(body.len());
    let sql = body[..end].trim();
    if sql.is_empty() {
        None
    } else {
        Some(sql.to_string())
    }
}
