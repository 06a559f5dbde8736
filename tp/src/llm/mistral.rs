//! Mistral chat-completions client
//!
//! Implements the LlmClient trait for the Mistral API. Each call is a single
//! system + user exchange; transient network failures go through the
//! configured [`RetryPolicy`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{
    CompletionRequest, CompletionResponse, LlmClient, LlmError, RetryPolicy, Sleeper, StopReason, TokenUsage,
    TokioSleeper,
};
use crate::config::LlmConfig;

/// Mistral API client
pub struct MistralClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    timeout: Duration,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl MistralClient {
    /// Create a new client from configuration
    ///
    /// Fails when the API key variable is unset.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config.get_api_key()?;
        Self::new(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let timeout = config.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
            retry: config.retry.policy(),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replace the sleeper used between retry attempts
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Build the request body for the chat-completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, json_mode = request.json_mode, "build_request_body: called");

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(serde_json::json!({
                "role": "system",
                "content": system,
            }));
        }
        messages.push(serde_json::json!({
            "role": "user",
            "content": request.prompt,
        }));

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature.clamp(0.0, 1.0),
            "max_tokens": request.max_tokens,
        });

        if request.json_mode {
            debug!("build_request_body: json mode");
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        body
    }

    /// Map a reqwest failure onto the transport taxonomy
    fn classify(&self, err: reqwest::Error, max_tokens: u32) -> LlmError {
        if err.is_timeout() {
            debug!("classify: timeout");
            LlmError::Timeout {
                timeout: self.timeout,
                max_tokens,
            }
        } else if err.is_builder() {
            LlmError::Config(err.to_string())
        } else {
            debug!(error = %err, "classify: connection error");
            LlmError::Connection(err.to_string())
        }
    }

    /// One HTTP round trip, no retries
    async fn send_once(&self, body: &serde_json::Value, max_tokens: u32) -> Result<CompletionResponse, LlmError> {
        let response = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json; charset=utf-8")
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e, max_tokens))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "send_once: API error");
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), &text, retry_after));
        }

        // An interrupted body is a transient failure, same as a dropped connection
        let text = response.text().await.map_err(|e| self.classify(e, max_tokens))?;
        let api_response: MistralResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::InvalidResponse(format!("Malformed envelope: {}", e)))?;

        parse_response(api_response)
    }
}

/// Pull the reply text out of the provider envelope
fn parse_response(api_response: MistralResponse) -> Result<CompletionResponse, LlmError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| LlmError::InvalidResponse("Response message has no content".to_string()))?;

    let usage = api_response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: content.trim().to_string(),
        stop_reason: StopReason::from_finish_reason(choice.finish_reason.as_deref()),
        usage,
    })
}

#[async_trait]
impl LlmClient for MistralClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let body = self.build_request_body(&request);
        let body = &body;
        let max_tokens = request.max_tokens;

        let response = self
            .retry
            .run(self.sleeper.as_ref(), move |attempt| {
                debug!(attempt, "complete: sending");
                self.send_once(body, max_tokens)
            })
            .await?;

        debug!(
            stop_reason = ?response.stop_reason,
            output_tokens = response.usage.output_tokens,
            "complete: success"
        );
        Ok(response)
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct MistralResponse {
    choices: Vec<MistralChoice>,
    usage: Option<MistralUsage>,
}

#[derive(Debug, Deserialize)]
struct MistralChoice {
    message: MistralMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MistralMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MistralUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::retry::fake::RecordingSleeper;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> LlmConfig {
        LlmConfig {
            base_url: base_url.to_string(),
            ..LlmConfig::default()
        }
    }

    fn test_client(base_url: &str) -> MistralClient {
        MistralClient::new(&test_config(base_url), "test-key").unwrap()
    }

    fn envelope(content: &str, finish_reason: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "cmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": finish_reason
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 34, "total_tokens": 46 }
        })
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client("https://api.mistral.ai");
        let request = CompletionRequest::new("Hello").with_system("Be brief").with_temperature(0.3);

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "mistral-large-latest");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "Be brief");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Hello");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_build_request_body_json_mode_without_system() {
        let client = test_client("https://api.mistral.ai");
        let request = CompletionRequest::new("Plan").with_json_mode(true).with_temperature(1.7);

        let body = client.build_request_body(&request);

        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["temperature"], 1.0);
    }

    #[test]
    fn test_parse_response_without_choices_is_invalid() {
        let envelope: MistralResponse = serde_json::from_value(serde_json::json!({ "choices": [] })).unwrap();
        assert!(matches!(parse_response(envelope), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig {
            api_key_env: "TRIPPLANNER_UNSET_KEY_FOR_TEST".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(MistralClient::from_config(&config), Err(LlmError::Config(_))));
    }

    #[tokio::test]
    async fn test_complete_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope("  {\"ok\": true}\n", "stop")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let response = client.complete(CompletionRequest::new("hi")).await.unwrap();

        assert_eq!(response.content, "{\"ok\": true}");
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.output_tokens, 34);
    }

    #[tokio::test]
    async fn test_length_finish_reason_maps_to_max_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope("{\"daily_plans\": [", "length")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri())
            .complete(CompletionRequest::new("plan"))
            .await
            .unwrap();
        assert_eq!(response.stop_reason, StopReason::MaxTokens);
    }

    #[tokio::test]
    async fn test_status_errors_are_fatal_and_not_retried() {
        for status in [429u16, 401, 500] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
                .expect(1)
                .mount(&server)
                .await;

            let sleeper = Arc::new(RecordingSleeper::new());
            let client = test_client(&server.uri()).with_sleeper(sleeper.clone());
            let err = client.complete(CompletionRequest::new("x")).await.unwrap_err();

            let expected = match status {
                429 => matches!(err, LlmError::RateLimited { .. }),
                401 => matches!(err, LlmError::Authentication { .. }),
                _ => matches!(err, LlmError::Api { status: 500, .. }),
            };
            assert!(expected, "status {} produced {:?}", status, err);
            assert!(sleeper.slept().is_empty());
        }
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .complete(CompletionRequest::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(envelope("{}", "stop"))
                    .set_delay(Duration::from_millis(500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = LlmConfig {
            timeout_ms: 50,
            ..test_config(&server.uri())
        };
        let sleeper = Arc::new(RecordingSleeper::new());
        let client = MistralClient::new(&config, "test-key")
            .unwrap()
            .with_sleeper(sleeper.clone());

        let err = client
            .complete(CompletionRequest::new("x").with_max_tokens(8000))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Timeout { max_tokens: 8000, .. }), "got {:?}", err);
        assert!(sleeper.slept().is_empty());
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts_retries() {
        // Bind then drop a listener so the port is closed
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        let sleeper = Arc::new(RecordingSleeper::new());
        let client = test_client(&format!("http://{}", addr)).with_sleeper(sleeper.clone());
        let err = client.complete(CompletionRequest::new("x")).await.unwrap_err();

        assert!(matches!(err, LlmError::RetriesExhausted { attempts: 5, .. }), "got {:?}", err);
        assert_eq!(
            sleeper.slept(),
            vec![
                Duration::from_secs(3),
                Duration::from_secs(6),
                Duration::from_secs(9),
                Duration::from_secs(12)
            ]
        );
    }
}
