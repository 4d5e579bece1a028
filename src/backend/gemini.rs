//! Backend for the Google Gemini REST API.
//!
//! Endpoint: `POST {base}/v1beta/models/{model}:generateContent`.
//! Authentication: `x-goog-api-key` header.

use super::{Backend, LlmRequest, LlmResponse};
use crate::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Public Gemini API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Backend for Gemini `generateContent`.
///
/// # Example
///
/// ```
/// use trivia_forge::backend::GeminiBackend;
///
/// let backend = GeminiBackend::new("AIza-example-key");
/// assert!(!format!("{:?}", backend).contains("example-key"));
/// ```
#[derive(Clone)]
pub struct GeminiBackend {
    api_key: String,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let masked = match self.api_key.get(..4) {
            Some(prefix) if self.api_key.len() > 8 => format!("{}***", prefix),
            _ => "***".to_string(),
        };
        f.debug_struct("GeminiBackend")
            .field("api_key", &masked)
            .finish()
    }
}

impl GeminiBackend {
    /// Create a backend authenticating with `api_key`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Build the request body for `generateContent`.
    fn build_body(request: &LlmRequest) -> Value {
        let mut generation_config = json!({
            "temperature": request.config.temperature,
            "maxOutputTokens": request.config.max_tokens,
        });

        if request.config.json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}],
            }],
            "generationConfig": generation_config,
        })
    }

    fn endpoint(base_url: &str, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        )
    }

    /// Parse a `Retry-After` header value as seconds.
    fn parse_retry_after(value: &str) -> Option<Duration> {
        value.trim().parse::<u64>().ok().map(Duration::from_secs)
    }

    /// Build the reqwest request with the API key header.
    fn build_http_request(
        &self,
        client: &Client,
        url: &str,
        body: &Value,
    ) -> reqwest::RequestBuilder {
        client
            .post(url)
            .header("x-goog-api-key", self.api_key.as_str())
            .json(body)
    }

    /// Pull the generated text out of a `generateContent` response.
    ///
    /// Text parts of the first candidate are concatenated. A prompt-level
    /// block or a candidate stopped for safety is [`ModelError::Blocked`];
    /// no text at all is [`ModelError::EmptyResponse`].
    fn extract_text(json_resp: &Value) -> Result<String, ModelError> {
        if let Some(reason) = json_resp
            .pointer("/promptFeedback/blockReason")
            .and_then(|v| v.as_str())
        {
            return Err(ModelError::Blocked(reason.to_string()));
        }

        let candidate = json_resp
            .get("candidates")
            .and_then(|c| c.get(0))
            .ok_or(ModelError::EmptyResponse)?;

        let text: String = candidate
            .pointer("/content/parts")
            .and_then(|p| p.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return match candidate.get("finishReason").and_then(|v| v.as_str()) {
                Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                    Err(ModelError::Blocked(reason.to_string()))
                }
                _ => Err(ModelError::EmptyResponse),
            };
        }
        Ok(text)
    }

    /// Extract metadata from a Gemini response.
    fn extract_metadata(json_resp: &Value) -> Option<Value> {
        let mut meta = serde_json::Map::new();
        if let Some(v) = json_resp.get("usageMetadata") {
            meta.insert("usage".into(), v.clone());
        }
        if let Some(v) = json_resp.get("modelVersion") {
            meta.insert("model".into(), v.clone());
        }
        if let Some(v) = json_resp.pointer("/candidates/0/finishReason") {
            meta.insert("finish_reason".into(), v.clone());
        }
        if meta.is_empty() {
            None
        } else {
            Some(Value::Object(meta))
        }
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn complete(
        &self,
        client: &Client,
        base_url: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, ModelError> {
        let url = Self::endpoint(base_url, &request.model);
        let body = Self::build_body(request);

        let resp = self.build_http_request(client, &url, &body).send().await?;

        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(Self::parse_retry_after);
            let text = resp.text().await.unwrap_or_default();
            return Err(ModelError::HttpError {
                status,
                body: text,
                retry_after,
            });
        }

        let json_resp: Value = resp.json().await?;
        let text = Self::extract_text(&json_resp)?;

        Ok(LlmResponse {
            text,
            status,
            metadata: Self::extract_metadata(&json_resp),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmConfig;

    fn test_request() -> LlmRequest {
        LlmRequest {
            model: "gemini-2.5-flash".into(),
            prompt: "Generate 3 trivia questions".into(),
            config: LlmConfig::default(),
        }
    }

    #[test]
    fn test_gemini_payload() {
        let body = GeminiBackend::build_body(&test_request());

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Generate 3 trivia questions");
        assert_eq!(body["generationConfig"]["temperature"], 0.7);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_gemini_json_mode() {
        let mut request = test_request();
        request.config.json_mode = true;
        let body = GeminiBackend::build_body(&request);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn test_endpoint_format() {
        assert_eq!(
            GeminiBackend::endpoint("https://example.test/", "gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_api_key_header() {
        let backend = GeminiBackend::new("secret-key-123");
        let client = Client::new();
        let req = backend
            .build_http_request(&client, "https://example.test/x", &json!({}))
            .build()
            .expect("build request");
        assert_eq!(req.headers().get("x-goog-api-key").expect("key header"), "secret-key-123");
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let resp = json!({
            "candidates": [{
                "content": {"parts": [{"text": "[{\"a\":"}, {"text": " 1}]"}]},
                "finishReason": "STOP",
            }],
            "modelVersion": "gemini-2.5-flash",
        });
        assert_eq!(GeminiBackend::extract_text(&resp).unwrap(), "[{\"a\": 1}]");
        let meta = GeminiBackend::extract_metadata(&resp).unwrap();
        assert_eq!(meta["finish_reason"], "STOP");
        assert_eq!(meta["model"], "gemini-2.5-flash");
    }

    #[test]
    fn test_extract_text_blocked_prompt() {
        let resp = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert!(matches!(
            GeminiBackend::extract_text(&resp),
            Err(ModelError::Blocked(reason)) if reason == "SAFETY"
        ));
    }

    #[test]
    fn test_extract_text_safety_stop() {
        let resp = json!({"candidates": [{"finishReason": "SAFETY"}]});
        assert!(matches!(GeminiBackend::extract_text(&resp), Err(ModelError::Blocked(_))));
    }

    #[test]
    fn test_extract_text_empty() {
        assert!(matches!(
            GeminiBackend::extract_text(&json!({"candidates": []})),
            Err(ModelError::EmptyResponse)
        ));
        let blank = json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]});
        assert!(matches!(GeminiBackend::extract_text(&blank), Err(ModelError::EmptyResponse)));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(GeminiBackend::parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
        assert_eq!(GeminiBackend::parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let backend = GeminiBackend::new("AIzaSy1234567890abcdef");
        let debug_output = format!("{:?}", backend);
        assert!(!debug_output.contains("1234567890abcdef"), "API key must not appear in Debug output");
        assert!(debug_output.contains("AIza***"));
        assert!(format!("{:?}", GeminiBackend::new("short")).contains("\"***\""));
    }
}
