use crate::config::Settings;
use crate::llm::{LlmClient, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build Gemini http client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate_content(
        &self,
        req: GenerateContentRequest,
    ) -> anyhow::Result<(serde_json::Value, GenerateContentResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(GeminiApiError {
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Gemini response JSON: {text}"))?;
        let parsed = serde_json::from_value::<GenerateContentResponse>(raw_json.clone())
            .context("failed to decode Gemini response into GenerateContentResponse")?;
        Ok((raw_json, parsed))
    }

    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let mut out = String::new();
        for candidate in &res.candidates {
            for part in &candidate.content.parts {
                if let Some(text) = &part.text {
                    out.push_str(text);
                }
            }
        }

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let (raw_json, res) = self.generate_content(req).await?;

        match Self::response_text(&res) {
            Some(text) => Ok(text),
            None => Err(GeminiApiError {
                stage: "empty_candidates",
                detail: "response contained no candidate text".to_string(),
                raw_output: None,
                raw_response_json: Some(raw_json),
            }
            .into()),
        }
    }
}

/// Gemini failure with enough raw material attached to debug it offline.
#[derive(Debug, Clone)]
pub struct GeminiApiError {
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<serde_json::Value>,
}

impl fmt::Display for GeminiApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gemini API error (stage={}): {}", self.stage, self.detail)
    }
}

impl std::error::Error for GeminiApiError {}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_candidate_text() {
        let v = json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            {"text": "The portfolio held steady. "},
                            {"text": "- MSFT: flat week."}
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ],
            "modelVersion": "gemini-2.5-flash-preview-09-2025"
        });

        let res: GenerateContentResponse = serde_json::from_value(v).unwrap();
        let text = GeminiClient::response_text(&res).unwrap();
        assert_eq!(text, "The portfolio held steady. - MSFT: flat week.");
    }

    #[test]
    fn empty_candidates_yield_no_text() {
        let res: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(GeminiClient::response_text(&res).is_none());
    }

    #[test]
    fn tolerates_candidates_without_text_parts() {
        let v = json!({
            "candidates": [
                {"content": {"parts": [{"inlineData": {"mimeType": "image/png"}}]}}
            ]
        });

        let res: GenerateContentResponse = serde_json::from_value(v).unwrap();
        assert!(GeminiClient::response_text(&res).is_none());
    }

    #[test]
    fn api_error_display_names_the_stage() {
        let err = GeminiApiError {
            stage: "http",
            detail: "status=503".to_string(),
            raw_output: Some("upstream overloaded".to_string()),
            raw_response_json: None,
        };

        assert_eq!(err.to_string(), "Gemini API error (stage=http): status=503");
    }

    #[test]
    fn request_body_has_expected_shape() {
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "analyze this".to_string(),
                }],
            }],
        };

        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "analyze this");
    }
}
