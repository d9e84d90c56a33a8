//! GradioScoringClient - REST client for the hosted text-moderation Space.
//!
//! The Space exposes its scoring function through the Gradio queue API:
//! a `POST` submits the call and returns an event id, a `GET` on that id
//! streams server-sent events until a `complete` (or `error`) event.
//! Token priority: explicit config value > `HF_TOKEN` environment variable.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use moderator_core::analysis::{AnalysisResult, ScoringClient};
use moderator_core::config::ClassifierConfig;
use moderator_core::error::{ModeratorError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary fields of the analysis object that are not categories.
const SUMMARY_KEYS: &[&str] = &["max_value", "sum_value", "safer_value"];

/// Scoring client that talks to a Gradio Space over HTTP.
#[derive(Clone)]
pub struct GradioScoringClient {
    client: Client,
    base_url: String,
    api_name: String,
    api_token: Option<String>,
}

impl GradioScoringClient {
    /// Creates a client without a request timeout.
    pub fn new(base_url: impl Into<String>, api_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_name: api_name.into(),
            api_token: None,
        }
    }

    /// Builds a client from the `[classifier]` config section.
    ///
    /// `timeout_secs` bounds each HTTP request when set; when absent the
    /// client waits as long as the service takes.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ModeratorError::config(format!("Failed to build HTTP client: {e}")))?;

        let api_token = config
            .api_token
            .clone()
            .or_else(|| env::var("HF_TOKEN").ok())
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_name: config.api_name.clone(),
            api_token,
        })
    }

    /// Sets the bearer token sent with every request.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    fn call_url(&self) -> String {
        format!(
            "{}/gradio_api/call/{}",
            self.base_url.trim_end_matches('/'),
            self.api_name.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn submit(&self, text: &str, safety_margin: f64) -> Result<String> {
        let body = CallRequest {
            data: vec![Value::from(text), Value::from(safety_margin)],
        };

        let response = self
            .authorize(self.client.post(self.call_url()).json(&body))
            .send()
            .await
            .map_err(|err| {
                ModeratorError::classification(format!("Scoring request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: CallResponse = response.json().await.map_err(|err| {
            ModeratorError::classification(format!("Failed to parse call response: {err}"))
        })?;

        Ok(parsed.event_id)
    }

    async fn fetch_result(&self, event_id: &str) -> Result<Value> {
        let url = format!("{}/{}", self.call_url(), event_id);
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|err| {
                ModeratorError::classification(format!("Result request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let body = response.text().await.map_err(|err| {
            ModeratorError::classification(format!("Failed to read event stream: {err}"))
        })?;

        parse_event_stream(&body)
    }
}

#[async_trait]
impl ScoringClient for GradioScoringClient {
    async fn score(&self, text: &str, safety_margin: f64) -> Result<AnalysisResult> {
        let event_id = self.submit(text, safety_margin).await?;
        let output = self.fetch_result(&event_id).await?;
        parse_analysis(&output)
    }
}

#[derive(Serialize)]
struct CallRequest {
    data: Vec<Value>,
}

#[derive(Deserialize)]
struct CallResponse {
    event_id: String,
}

/// Extracts the payload of the `complete` event from a Gradio event stream.
fn parse_event_stream(body: &str) -> Result<Value> {
    let mut current_event: Option<&str> = None;

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(name) = line.strip_prefix("event:") {
            current_event = Some(name.trim());
        } else if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            match current_event {
                Some("complete") => {
                    return serde_json::from_str(data).map_err(|err| {
                        ModeratorError::classification(format!(
                            "Malformed complete event payload: {err}"
                        ))
                    });
                }
                Some("error") => {
                    return Err(ModeratorError::classification(format!(
                        "Scoring service reported an error: {data}"
                    )));
                }
                _ => {}
            }
        }
    }

    Err(ModeratorError::classification(
        "Event stream ended without a complete event",
    ))
}

/// Reads the analysis object out of the call output.
///
/// The output is the function's return tuple; its second element is the
/// analysis, sometimes JSON-encoded as a string. An analysis without a
/// numeric score is an error, so the failure policy decides the outcome.
fn parse_analysis(output: &Value) -> Result<AnalysisResult> {
    let raw = output
        .get(1)
        .ok_or_else(|| ModeratorError::classification("Call output has no analysis element"))?;

    let analysis = match raw {
        Value::String(encoded) => serde_json::from_str::<Value>(encoded).map_err(|err| {
            ModeratorError::classification(format!("Analysis is not valid JSON: {err}"))
        })?,
        other => other.clone(),
    };

    let object = analysis
        .as_object()
        .ok_or_else(|| ModeratorError::classification("Analysis is not a JSON object"))?;

    // Older Space builds report only the `toxicity` score.
    let max_value = object
        .get("max_value")
        .and_then(Value::as_f64)
        .or_else(|| object.get("toxicity").and_then(Value::as_f64))
        .ok_or_else(|| ModeratorError::classification("Analysis has no max_value"))?;

    let categories: BTreeMap<String, f64> = object
        .iter()
        .filter(|(key, _)| !SUMMARY_KEYS.contains(&key.as_str()))
        .filter_map(|(key, value)| value.as_f64().map(|score| (key.clone(), score)))
        .collect();

    Ok(AnalysisResult::new(max_value, categories))
}

fn map_http_error(status: StatusCode, body: String) -> ModeratorError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error)
        .unwrap_or(body);

    ModeratorError::classification(format!("HTTP {}: {}", status.as_u16(), message))
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use serde_json::json;

    #[test]
    fn test_parse_event_stream_complete() {
        let body = "event: generating\ndata: null\n\nevent: complete\ndata: [\"ok\", {\"max_value\": 0.5}]\n\n";
        let value = parse_event_stream(body).unwrap();
        assert_eq!(value[1]["max_value"], 0.5);
    }

    #[test]
    fn test_parse_event_stream_error_event() {
        let err = parse_event_stream("event: error\ndata: \"queue full\"\n\n").unwrap_err();
        assert!(err.is_classification());
        assert!(err.to_string().contains("queue full"));
    }

    #[test]
    fn test_parse_event_stream_without_complete() {
        let err = parse_event_stream("event: heartbeat\ndata: null\n\n").unwrap_err();
        assert!(err.to_string().contains("without a complete event"));
    }

    #[test]
    fn test_parse_analysis_from_encoded_string() {
        let encoded = json!({
            "harassment": 0.12,
            "violence": 0.85,
            "max_value": 0.85,
            "max_key": "violence",
            "sum_value": 0.97,
            "is_flagged": true
        })
        .to_string();
        let output = json!(["<html/>", encoded]);

        let analysis = parse_analysis(&output).unwrap();
        assert_eq!(analysis.max_value, 0.85);
        assert_eq!(analysis.categories.len(), 2);
        assert_eq!(analysis.categories["violence"], 0.85);
        assert!(!analysis.categories.contains_key("sum_value"));
        assert!(analysis.error.is_none());
    }

    #[test]
    fn test_parse_analysis_missing_element() {
        let err = parse_analysis(&json!(["only one"])).unwrap_err();
        assert!(err.is_classification());
    }

    #[test]
    fn test_parse_analysis_falls_back_to_toxicity() {
        let output = json!(["plot", { "toxicity": 0.95, "insult": 0.4 }]);

        let analysis = parse_analysis(&output).unwrap();
        assert_eq!(analysis.max_value, 0.95);
        assert_eq!(analysis.categories["insult"], 0.4);
    }

    #[test]
    fn test_parse_analysis_without_score_is_an_error() {
        let missing = json!(["plot", { "insult": 0.4 }]);
        let err = parse_analysis(&missing).unwrap_err();
        assert!(err.is_classification());
        assert!(err.to_string().contains("no max_value"));

        let non_numeric = json!(["plot", { "max_value": "high" }]);
        assert!(parse_analysis(&non_numeric).unwrap_err().is_classification());
    }

    #[test]
    fn test_call_url_normalises_slashes() {
        let client = GradioScoringClient::new("http://localhost:7860/", "/fetch_toxicity_level");
        assert_eq!(
            client.call_url(),
            "http://localhost:7860/gradio_api/call/fetch_toxicity_level"
        );
    }

    async fn spawn_space(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_score_round_trip_against_local_space() {
        let router = Router::new()
            .route(
                "/gradio_api/call/fetch_toxicity_level",
                post(
                    |headers: HeaderMap, axum::Json(body): axum::Json<Value>| async move {
                        if !has_bearer(&headers, "hf_test") {
                            return Err(StatusCode::UNAUTHORIZED);
                        }
                        assert_eq!(body["data"][0], "I will destroy you");
                        assert_eq!(body["data"][1], 0.02);
                        Ok(axum::Json(json!({ "event_id": "evt-1" })))
                    },
                ),
            )
            .route(
                "/gradio_api/call/fetch_toxicity_level/:event_id",
                get(|headers: HeaderMap, Path(event_id): Path<String>| async move {
                    if !has_bearer(&headers, "hf_test") {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    assert_eq!(event_id, "evt-1");
                    let analysis = json!({ "violence": 0.85, "max_value": 0.85 }).to_string();
                    let data = json!(["plot", analysis]).to_string();
                    Ok(format!("event: complete\ndata: {data}\n\n"))
                }),
            );
        let base_url = spawn_space(router).await;

        let client =
            GradioScoringClient::new(base_url, "fetch_toxicity_level").with_api_token("hf_test");
        let analysis = client.score("I will destroy you", 0.02).await.unwrap();

        assert_eq!(analysis.max_value, 0.85);
        assert_eq!(analysis.categories["violence"], 0.85);
    }

    fn has_bearer(headers: &HeaderMap, token: &str) -> bool {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            == Some(format!("Bearer {token}").as_str())
    }

    #[tokio::test]
    async fn test_score_without_token_is_rejected_by_private_space() {
        let router = Router::new().route(
            "/gradio_api/call/fetch_toxicity_level",
            post(|headers: HeaderMap| async move {
                if has_bearer(&headers, "hf_test") {
                    Ok(axum::Json(json!({ "event_id": "evt-1" })))
                } else {
                    Err(StatusCode::UNAUTHORIZED)
                }
            }),
        );
        let base_url = spawn_space(router).await;

        let client = GradioScoringClient::new(base_url, "fetch_toxicity_level");
        let err = client.score("hello", 0.02).await.unwrap_err();

        assert!(err.to_string().contains("401"));
    }

    #[tokio::test]
    async fn test_unscored_analysis_follows_closed_policy() {
        let router = Router::new()
            .route(
                "/gradio_api/call/fetch_toxicity_level",
                post(|| async { axum::Json(json!({ "event_id": "evt-2" })) }),
            )
            .route(
                "/gradio_api/call/fetch_toxicity_level/:event_id",
                get(|| async {
                    let data = json!(["plot", { "insult": 0.4 }]).to_string();
                    format!("event: complete\ndata: {data}\n\n")
                }),
            );
        let base_url = spawn_space(router).await;

        let scorer = std::sync::Arc::new(GradioScoringClient::new(base_url, "fetch_toxicity_level"));
        let classifier = crate::classifier::ClassifierClient::new(scorer, 0.02)
            .with_failure_policy(moderator_core::analysis::FailurePolicy::Closed);
        let analysis = classifier.classify("you are awful").await;

        assert_eq!(analysis.max_value, 1.0);
        assert!(analysis.is_error());
    }

    #[tokio::test]
    async fn test_score_maps_http_failure() {
        let router = Router::new().route(
            "/gradio_api/call/fetch_toxicity_level",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    axum::Json(json!({ "error": "Space is sleeping" })),
                )
            }),
        );
        let base_url = spawn_space(router).await;

        let client = GradioScoringClient::new(base_url, "fetch_toxicity_level");
        let err = client.score("hello", 0.02).await.unwrap_err();

        assert!(err.is_classification());
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Space is sleeping"));
    }
}
