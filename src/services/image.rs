use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

use crate::core::comic::PanelImage;
use crate::core::config::Config;
use crate::services::llm::API_KEY_HEADER;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Image-generation capability. May fail, and may succeed with no images.
#[async_trait]
pub trait ImageClient: Send + Sync + Debug {
    async fn generate(&self, prompt: &str) -> Result<Vec<GeneratedImage>>;
}

pub fn create_image_client(config: &Config) -> Arc<dyn ImageClient> {
    Arc::new(ImagenClient::new(config))
}

pub fn panel_prompt(description: &str, style: &str) -> String {
    format!(
        "A single comic book panel, in a {} style. The panel should be vibrant and dynamic. \
         Scene: {}. Do not include any text, letters, or speech bubbles in the image.",
        style, description
    )
}

/// Illustrates one panel. Every failure is logged and turned into
/// `PanelImage::Failed`, so callers can fan out without guarding each call.
pub async fn generate_panel_image(
    client: &dyn ImageClient,
    description: &str,
    style: &str,
) -> PanelImage {
    let prompt = panel_prompt(description, style);
    match client.generate(&prompt).await {
        Ok(images) => match images.first() {
            Some(image) => PanelImage::Ready(image.to_data_uri()),
            None => {
                warn!("Error generating image: no image was generated by the API");
                PanelImage::Failed
            }
        },
        Err(e) => {
            warn!("Error generating image: {:#}", e);
            PanelImage::Failed
        }
    }
}

// --- Imagen ---
#[derive(Debug)]
pub struct ImagenClient {
    api_key: String,
    base_url: String,
    model: String,
    aspect_ratio: String,
    mime_type: String,
    client: reqwest::Client,
}

impl ImagenClient {
    pub fn new(config: &Config) -> Self {
        let imagen = &config.image.imagen;
        Self {
            api_key: config.api_key().to_string(),
            base_url: config.llm.gemini.base_url.trim_end_matches('/').to_string(),
            model: imagen.model.clone(),
            aspect_ratio: imagen.aspect_ratio.clone(),
            mime_type: imagen.mime_type.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn request_body<'a>(&'a self, prompt: &'a str) -> ImagenRequest<'a> {
        ImagenRequest {
            instances: vec![ImagenInstance { prompt }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: &self.aspect_ratio,
                output_options: ImagenOutputOptions {
                    mime_type: &self.mime_type,
                },
            },
        }
    }
}

#[derive(Serialize)]
struct ImagenRequest<'a> {
    instances: Vec<ImagenInstance<'a>>,
    parameters: ImagenParameters<'a>,
}

#[derive(Serialize)]
struct ImagenInstance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    output_options: ImagenOutputOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenOutputOptions<'a> {
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct ImagenResponse {
    #[serde(default)]
    predictions: Vec<ImagenPrediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
}

fn decode_predictions(response: ImagenResponse, fallback_mime: &str) -> Result<Vec<GeneratedImage>> {
    response
        .predictions
        .into_iter()
        .filter_map(|p| {
            let data = p.bytes_base64_encoded?;
            Some((data, p.mime_type))
        })
        .map(|(data, mime)| -> Result<GeneratedImage> {
            let bytes = STANDARD
                .decode(data.trim())
                .context("Image payload is not valid base64")?;
            Ok(GeneratedImage {
                mime_type: mime.unwrap_or_else(|| fallback_mime.to_string()),
                bytes,
            })
        })
        .collect()
}

#[async_trait]
impl ImageClient for ImagenClient {
    async fn generate(&self, prompt: &str) -> Result<Vec<GeneratedImage>> {
        let url = format!("{}/models/{}:predict", self.base_url, self.model);

        debug!("Requesting image from {}", self.model);
        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("Imagen API error ({}): {}", status, error_text));
        }

        let result: ImagenResponse = resp.json().await?;
        decode_predictions(result, &self.mime_type)
    }
}
