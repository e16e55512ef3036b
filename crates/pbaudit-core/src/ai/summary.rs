//! AI summarization of audit output.
//!
//! The language model is a black-box text-completion service: one blocking
//! request carrying a compact prompt built from selected signals and the
//! rule findings, one plain-text response expected to be a JSON object.
//! A non-JSON response is preserved verbatim under a `raw` key rather than
//! discarded, so the report still renders. Single attempt, no retry:
//! callers needing resilience wrap this with their own timeout/retry.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::AuditError;
use crate::rules::catalog::Finding;
use crate::signals::model::Signals;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "OPENAI_MODEL";
pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Blocking client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug)]
pub struct AiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AiClient {
    /// Build a client from the environment. The API key is required; the
    /// model falls back to [`DEFAULT_MODEL`].
    pub fn from_env() -> Result<Self, AuditError> {
        let api_key = std::env::var(API_KEY_VAR)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(AuditError::MissingCredential { var: API_KEY_VAR })?;
        let model = std::env::var(MODEL_VAR)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }

    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "failed to build HTTP client with timeout, using default");
                reqwest::blocking::Client::new()
            });
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Override the endpoint base URL (compatible self-hosted gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Ask the model for a structured review of the audit output.
    pub fn generate_summary(&self, signals: &Signals, findings: &[Finding]) -> Result<Value> {
        let prompt = build_prompt(signals, findings);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
        };

        let response: ChatResponse = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("AI summarization request failed")?
            .error_for_status()
            .context("AI summarization request rejected")?
            .json()
            .context("AI summarization response was not valid JSON")?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(coerce_summary(&text))
    }
}

/// Compact prompt over selected signal fields; raw definition files are
/// never sent.
fn build_prompt(signals: &Signals, findings: &[Finding]) -> String {
    let findings_json = serde_json::to_string(findings).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"You are a senior Power BI / Fabric BI engineer and QA lead.
Given the following extracted signals from a PBIP project, produce actionable Power Query recommendations.

OUTPUT STRICT JSON with keys:
- "summary" (1 paragraph)
- "findings" (array of objects: {{severity, title, why_it_matters, evidence, fix_steps[]}})
- "quick_wins" (array of short action bullets)
- "questions_for_dev" (array of concrete questions)

SIGNALS:
project_model_tables={tables}
relationships_count={rels}
report_pages={pages}
pq_query_count={pq_count}
pq_top_breakers={breakers}
incremental={incremental}
parameters={parameters}
hardcoding_hits={hardcoding}
naming={naming}

RULE_BASED_FINDINGS={findings_json}

Be practical. Focus on query folding, parameterization, naming consistency, refresh readiness, and developer actionability."#,
        tables = signals.model.tables_count,
        rels = signals.model.relationships_count,
        pages = signals.report.page_count,
        pq_count = signals.power_query.count,
        breakers = serde_json::to_string(&signals.power_query.top_folding_breakers)
            .unwrap_or_default(),
        incremental = serde_json::to_string(&signals.incremental).unwrap_or_default(),
        parameters = serde_json::to_string(&signals.parameters).unwrap_or_default(),
        hardcoding = signals.hardcoding.count,
        naming = serde_json::to_string(&signals.naming).unwrap_or_default(),
    )
}

/// Best-effort coercion of the model response into the summary schema.
///
/// An object gets its required keys defaulted; anything else (arrays,
/// scalars, non-JSON text) is preserved under `raw`.
fn coerce_summary(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut obj)) => {
            obj.entry("summary").or_insert_with(|| json!(""));
            obj.entry("findings").or_insert_with(|| json!([]));
            obj.entry("quick_wins").or_insert_with(|| json!([]));
            obj.entry("questions_for_dev").or_insert_with(|| json!([]));
            Value::Object(obj)
        }
        _ => json!({ "raw": text }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::{Category, RuleId, Severity};

    #[test]
    fn prompt_embeds_signal_fields_and_findings() {
        let mut signals = Signals::default();
        signals.model.tables_count = 7;
        signals.report.page_count = 3;
        signals.power_query.count = 5;
        let findings = vec![Finding {
            rule_id: RuleId("PQ020".into()),
            category: Category::PowerQuery,
            severity: Severity::HIGH,
            title: "Hard-coded source references detected".into(),
            message: "m".into(),
            recommendation: "r".into(),
            evidence: json!({}),
        }];

        let prompt = build_prompt(&signals, &findings);
        assert!(prompt.contains("project_model_tables=7"));
        assert!(prompt.contains("report_pages=3"));
        assert!(prompt.contains("pq_query_count=5"));
        assert!(prompt.contains("PQ020"));
        assert!(prompt.contains("OUTPUT STRICT JSON"));
    }

    #[test]
    fn object_response_gets_missing_keys_defaulted() {
        let v = coerce_summary(r#"{"summary": "looks fine"}"#);
        assert_eq!(v["summary"], "looks fine");
        assert_eq!(v["findings"], json!([]));
        assert_eq!(v["quick_wins"], json!([]));
        assert_eq!(v["questions_for_dev"], json!([]));
    }

    #[test]
    fn complete_object_passes_through() {
        let v = coerce_summary(
            r#"{"summary": "s", "findings": [{"severity": "HIGH"}], "quick_wins": ["w"], "questions_for_dev": ["q"]}"#,
        );
        assert_eq!(v["findings"][0]["severity"], "HIGH");
        assert_eq!(v["quick_wins"][0], "w");
    }

    #[test]
    fn non_json_response_is_preserved_raw() {
        let v = coerce_summary("Sorry, I cannot produce JSON today.");
        assert_eq!(v["raw"], "Sorry, I cannot produce JSON today.");
    }

    #[test]
    fn non_object_json_is_preserved_raw() {
        let v = coerce_summary(r#"["not", "an", "object"]"#);
        assert!(v["raw"].as_str().unwrap().contains("not"));
    }

    #[test]
    fn from_env_without_key_is_missing_credential() {
        // Key deliberately cleared for this process-local check.
        unsafe { std::env::remove_var(API_KEY_VAR) };
        let err = AiClient::from_env().unwrap_err();
        assert!(matches!(err, AuditError::MissingCredential { var } if var == API_KEY_VAR));
    }
}
