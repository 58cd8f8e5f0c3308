//! OCR provider client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::OcrConfig;

/// Text recognition over a single image.
///
/// `image` is either an absolute image URL or a `data:` URL. Calls may
/// fail individually; callers decide whether to skip or degrade.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, image: &str) -> Result<String>;
}

/// Mistral OCR API client.
pub struct MistralOcr {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    #[serde(default)]
    markdown: String,
}

impl MistralOcr {
    /// Build a client reading the API key from the configured environment
    /// variable.
    pub fn from_env(config: &OcrConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            AppError::config(format!(
                "OCR API key not set (expected in ${})",
                config.api_key_env
            ))
        })?;

        Ok(Self {
            http: Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl OcrProvider for MistralOcr {
    async fn recognize(&self, image: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "document": {
                "type": "image_url",
                "image_url": image,
            },
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: OcrResponse = response.json().await?;
        let text = parsed
            .pages
            .iter()
            .map(|p| p.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_pages_joined() {
        let raw = r#"{"pages":[{"markdown":"첫 페이지"},{"markdown":"둘째 페이지"}]}"#;
        let parsed: OcrResponse = serde_json::from_str(raw).unwrap();
        let text = parsed
            .pages
            .iter()
            .map(|p| p.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(text, "첫 페이지\n\n둘째 페이지");
    }

    #[test]
    fn test_response_tolerates_missing_pages() {
        let parsed: OcrResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.pages.is_empty());
    }

    #[test]
    fn test_from_env_requires_key() {
        let mut config = OcrConfig::default();
        config.api_key_env = "SARAMIN_TEST_MISSING_KEY".to_string();
        assert!(MistralOcr::from_env(&config).is_err());
    }
}
