use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::ComicError;

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default)]
    pub unattended: bool,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub image: ImageConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_folder: default_output(),
            unattended: false,
            llm: LlmConfig::default(),
            image: ImageConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LlmConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_text_model")]
    pub model: String,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_text_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ImageConfig {
    #[serde(default)]
    pub imagen: ImagenConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImagenConfig {
    #[serde(default = "default_image_model")]
    pub model: String,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

impl Default for ImagenConfig {
    fn default() -> Self {
        Self {
            model: default_image_model(),
            aspect_ratio: default_aspect_ratio(),
            mime_type: default_mime_type(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FetchConfig {
    /// Prefix prepended to remote README URLs, e.g. `https://api.codetabs.com/v1/proxy?quest=`.
    pub proxy_url: Option<String>,
}

fn default_output() -> String {
    "output".to_string()
}
fn default_text_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_image_model() -> String {
    "imagen-3.0-generate-002".to_string()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_aspect_ratio() -> String {
    "4:3".to_string()
}
fn default_mime_type() -> String {
    "image/jpeg".to_string()
}

impl Config {
    /// Reads `path` if present, falling back to defaults, then applies the
    /// API key from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Self::from_yaml(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            log::info!("{} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_api_key(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    pub fn apply_api_key<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|v| !v.trim().is_empty());

        if let Some(key) = from_env {
            self.llm.gemini.api_key = key.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ComicError> {
        if self.api_key().trim().is_empty() {
            return Err(ComicError::MissingApiKey);
        }
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        &self.llm.gemini.api_key
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.output_folder, "output");
        assert!(!config.unattended);
        assert_eq!(config.llm.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.image.imagen.model, "imagen-3.0-generate-002");
        assert_eq!(config.image.imagen.aspect_ratio, "4:3");
        assert_eq!(config.image.imagen.mime_type, "image/jpeg");
        assert!(config.fetch.proxy_url.is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "
output_folder: comics
unattended: true
llm:
  gemini:
    api_key: from-file
fetch:
  proxy_url: https://proxy.example/?quest=
";
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.output_folder, "comics");
        assert!(config.unattended);
        assert_eq!(config.api_key(), "from-file");
        assert_eq!(config.llm.gemini.model, "gemini-2.5-flash");
        assert_eq!(
            config.fetch.proxy_url.as_deref(),
            Some("https://proxy.example/?quest=")
        );
    }

    #[test]
    fn test_env_key_overrides_file() {
        let mut config = Config::from_yaml("llm: { gemini: { api_key: from-file } }").unwrap();
        config.apply_api_key(|name| match name {
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key(), "from-env");

        config.apply_api_key(|name| match name {
            "API_KEY" => Some("primary".to_string()),
            "GEMINI_API_KEY" => Some("secondary".to_string()),
            _ => None,
        });
        assert_eq!(config.api_key(), "primary");
    }

    #[test]
    fn test_blank_env_key_is_ignored() {
        let mut config = Config::from_yaml("llm: { gemini: { api_key: from-file } }").unwrap();
        config.apply_api_key(|_| Some("   ".to_string()));
        assert_eq!(config.api_key(), "from-file");
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = Config::from_yaml("{}").unwrap();
        assert!(matches!(config.validate(), Err(ComicError::MissingApiKey)));

        let mut config = config;
        config.apply_api_key(|_| Some("key".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load(&dir.path().join("config.yml"))?;
        assert_eq!(config.output_folder, "output");
        Ok(())
    }
}
