use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

use crate::core::config::Config;

/// Header carrying the API key. Request URLs never contain it.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Text-generation capability constrained to a JSON schema.
#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    /// Returns the raw model output, which is expected (but not guaranteed)
    /// to be JSON matching `schema`.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}

pub fn create_llm(config: &Config) -> Box<dyn LlmClient> {
    let cfg = &config.llm.gemini;
    Box::new(GeminiClient::new(&cfg.api_key, &cfg.model, &cfg.base_url))
}

// --- Gemini ---
#[derive(Debug)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiError>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContentResponse>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
struct GeminiError {
    message: String,
}

fn extract_text(response_text: &str) -> Result<String> {
    let result: GeminiResponse = serde_json::from_str(response_text).map_err(|e| {
        anyhow!(
            "Failed to parse Gemini response: {}. Body: {}",
            e,
            response_text
        )
    })?;

    if let Some(err) = result.error {
        return Err(anyhow!("Gemini API returned error: {}", err.message));
    }

    if let Some(first) = result.candidates.as_ref().and_then(|c| c.first()) {
        if let Some(content) = &first.content {
            let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
            if !text.is_empty() {
                return Ok(text);
            }
        }

        let reason = first.finish_reason.as_deref().unwrap_or("UNKNOWN");
        return Err(anyhow!("Gemini response empty. Finish reason: {}", reason));
    }

    Err(anyhow!(
        "Gemini response format unexpected or empty. Body: {}",
        response_text
    ))
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request_body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        log::debug!("Requesting script from {}", self.model);
        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        let response_text = resp.text().await?;
        extract_text(&response_text)
    }
}
