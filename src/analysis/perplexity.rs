//! Perplexity chat-completion client
//!
//! One POST per analysis, no retries.
//! Uses a long-lived reqwest::Client for connection pooling.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

use super::think::strip_think_tags;
use super::AnalysisProvider;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::models::{AnalysisRequest, AnalysisResult, NO_ANALYSIS_PLACEHOLDER};

const TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 2000;

const SYSTEM_PROMPT: &str = "You are a helpful assistant providing concise and accurate information about stocks. \
Keep a neutral, factual tone and do not give personal investment advice. \
Restrict your sources to The Wall Street Journal, Bloomberg, Financial Times, CNBC, Reuters, Barrons, \
The Economist, MarketWatch, Morningstar, NPR Marketplace, and Refinitiv. \
Keep the answer under 300 words. \
Format the answer in Markdown with short paragraphs separated by blank lines. \
Be concise.";

/// Reusable Perplexity client (connection-pooled)
pub struct PerplexityClient {
    client: Client,
    base_url: String,
    model: String,
}

impl PerplexityClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Self::new(&config.api_url, &config.model, config.request_timeout)
    }

    fn build_request(&self, symbol: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_prompt(symbol),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[async_trait]
impl AnalysisProvider for PerplexityClient {
    async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> std::result::Result<AnalysisResult, AnalysisError> {
        let credential = request
            .credential
            .as_ref()
            .ok_or(AnalysisError::MissingCredential)?;

        let body = self.build_request(&request.symbol);

        info!(
            request_id = %request.request_id,
            symbol = %request.symbol,
            model = %self.model,
            "Calling Perplexity API"
        );

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(request_id = %request.request_id, "Perplexity request failed: {}", e);
                AnalysisError::NetworkError {
                    message: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(
                request_id = %request.request_id,
                status = status.as_u16(),
                "Perplexity API error response: {}",
                error_text
            );
            return Err(AnalysisError::HttpError {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let raw = response.text().await.map_err(|e| {
            error!(request_id = %request.request_id, "Failed to read Perplexity response: {}", e);
            AnalysisError::NetworkError {
                message: e.to_string(),
            }
        })?;

        let result = parse_response(&raw, &self.model)?;

        info!(
            request_id = %request.request_id,
            symbol = %request.symbol,
            references = result.references.len(),
            "Perplexity response received"
        );

        Ok(result)
    }
}

fn build_user_prompt(symbol: &str) -> String {
    format!(
        "Explain {} recent price movements, news and analyst sentiments/ratings.",
        symbol
    )
}

/// Turn a successful response body into a result
fn parse_response(raw: &str, requested_model: &str) -> std::result::Result<AnalysisResult, AnalysisError> {
    let parsed: ChatResponse = serde_json::from_str(raw).map_err(|e| {
        error!("Failed to parse Perplexity response: {}", e);
        AnalysisError::MalformedResponse(e.to_string())
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|text| strip_think_tags(&text))
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| {
            warn!("Perplexity response carried no content");
            NO_ANALYSIS_PLACEHOLDER.to_string()
        });

    Ok(AnalysisResult::new(
        content,
        parsed.citations.unwrap_or_default(),
        parsed.model.unwrap_or_else(|| requested_model.to_string()),
    ))
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Option<Vec<String>>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Credential;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(Option<String>, Option<String>, Value)>>>;

    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/chat/completions", addr)
    }

    fn recording_router(seen: Seen, status: StatusCode, reply: String) -> Router {
        Router::new()
            .route(
                "/chat/completions",
                post(
                    move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| {
                        let reply = reply.clone();
                        async move {
                            let header = |name: &str| {
                                headers
                                    .get(name)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string)
                            };
                            seen.lock()
                                .unwrap()
                                .push((header("authorization"), header("content-type"), body));
                            (status, reply)
                        }
                    },
                ),
            )
            .with_state(seen)
    }

    fn client(url: &str) -> PerplexityClient {
        PerplexityClient::new(url, "sonar-pro", Duration::from_secs(5)).unwrap()
    }

    fn request(symbol: &str, key: Option<&str>) -> AnalysisRequest {
        AnalysisRequest::new(symbol, key.map(|k| Credential::new(k).unwrap()))
    }

    #[test]
    fn test_request_serialization() {
        let client = client("http://localhost/unused");
        let json = serde_json::to_value(client.build_request("AAPL")).unwrap();

        assert_eq!(json["model"], "sonar-pro");
        assert_eq!(json["max_tokens"], 2000);
        assert!((json["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0]["content"].as_str().unwrap().contains("Reuters"));
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json["messages"][1]["content"].as_str().unwrap().contains("Explain AAPL recent"));
    }

    #[test]
    fn test_parse_extracts_content_and_citations() {
        let raw = json!({
            "id": "abc",
            "model": "sonar-pro",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "<think>plan</think>Apple rose."}}],
            "citations": ["https://www.reuters.com/a", "https://www.ft.com/b"]
        })
        .to_string();

        let result = parse_response(&raw, "sonar-pro").unwrap();
        assert_eq!(result.content, "Apple rose.");
        assert_eq!(result.references.len(), 2);
    }

    #[test]
    fn test_parse_empty_choices_uses_placeholder() {
        let result = parse_response(r#"{"choices": []}"#, "sonar-pro").unwrap();
        assert_eq!(result.content, NO_ANALYSIS_PLACEHOLDER);
        assert!(result.references.is_empty());
        assert_eq!(result.model, "sonar-pro");

        let result = parse_response(r#"{"choices": [{"message": {"content": ""}}]}"#, "m").unwrap();
        assert_eq!(result.content, NO_ANALYSIS_PLACEHOLDER);

        let result = parse_response(r#"{"choices": [{"message": {"content": "<think>x</think>  "}}]}"#, "m").unwrap();
        assert_eq!(result.content, NO_ANALYSIS_PLACEHOLDER);
    }

    #[test]
    fn test_parse_rejects_unexpected_shape() {
        let err = parse_response(r#"{"error": "nope"}"#, "m").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));

        let err = parse_response("<html>Bad Gateway</html>", "m").unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_successful_call_sends_bearer_and_json() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let reply = json!({
            "choices": [{"message": {"content": "Visible summary"}}],
            "citations": ["https://www.bloomberg.com/x"]
        })
        .to_string();
        let url = spawn_server(recording_router(seen.clone(), StatusCode::OK, reply)).await;

        let result = client(&url).analyze(&request("MSFT", Some("pplx-key"))).await.unwrap();
        assert_eq!(result.content, "Visible summary");
        assert_eq!(result.references, vec!["https://www.bloomberg.com/x".to_string()]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, content_type, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer pplx-key"));
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert!(body["messages"][1]["content"].as_str().unwrap().contains("MSFT"));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_http_error() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_server(recording_router(
            seen,
            StatusCode::UNAUTHORIZED,
            "invalid api key".to_string(),
        ))
        .await;

        let err = client(&url).analyze(&request("MSFT", Some("bad"))).await.unwrap_err();
        assert_eq!(
            err,
            AnalysisError::HttpError {
                status: 401,
                body: "invalid api key".to_string()
            }
        );
        assert!(err.user_message().contains("401"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_malformed() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_server(recording_router(seen, StatusCode::OK, "<html>ok</html>".to_string())).await;

        let err = client(&url).analyze(&request("MSFT", Some("k"))).await.unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let url = spawn_server(recording_router(seen.clone(), StatusCode::OK, "{}".to_string())).await;

        let err = client(&url).analyze(&request("MSFT", None)).await.unwrap_err();
        assert_eq!(err, AnalysisError::MissingCredential);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = format!("http://{}/chat/completions", addr);
        let err = client(&url).analyze(&request("MSFT", Some("k"))).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NetworkError { .. }));
        assert!(err.user_message().contains("network"));
    }
}
