//! Gemini generateContent 客户端

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::GradingModel;
use crate::config::AiConfig;
use crate::errors::{GraderError, Result};

const PDF_MIME: &str = "application/pdf";

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: &'static str,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| GraderError::configuration(format!("Failed to build AI client: {e}")))?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

fn inline_pdf(data: &[u8]) -> Part<'static> {
    Part::Inline {
        inline_data: InlineData {
            mime_type: PDF_MIME,
            data: STANDARD.encode(data),
        },
    }
}

/// 拼接第一个候选的全部文本片段
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let parts = response.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() { None } else { Some(text) }
}

#[async_trait::async_trait]
impl GradingModel for GeminiClient {
    async fn evaluate(
        &self,
        prompt: &str,
        solution_pdf: &[u8],
        submission_pdf: &[u8],
    ) -> Result<String> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text { text: prompt },
                    inline_pdf(solution_pdf),
                    inline_pdf(submission_pdf),
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GraderError::ai_service(format!("AI request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!("AI service responded {}: {}", status, detail);
            return Err(GraderError::ai_service(format!(
                "AI service responded with status {status}"
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GraderError::ai_response_invalid(format!("Malformed AI response: {e}")))?;

        let text = extract_text(payload)
            .ok_or_else(|| GraderError::ai_response_invalid("AI response contained no text"))?;
        debug!("AI response received ({} bytes)", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::Text { text: "hola" }, inline_pdf(b"%PDF")],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                temperature: 0.2,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "hola");
        assert_eq!(parts[1]["inlineData"]["mimeType"], PDF_MIME);
        assert_eq!(parts[1]["inlineData"]["data"], STANDARD.encode(b"%PDF"));
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let payload: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]
        }))
        .unwrap();
        assert_eq!(extract_text(payload).as_deref(), Some("{\"a\":1}"));

        let empty: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({"candidates": []})).unwrap();
        assert!(extract_text(empty).is_none());
    }

    #[test]
    fn test_url_uses_model() {
        let client = GeminiClient::new(&AiConfig {
            api_key: "k".into(),
            model: "gemini-test".into(),
            endpoint: "https://example.test/v1beta/".into(),
            timeout: 5,
        })
        .unwrap();
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }
}
