//! Google Gemini generateContent provider

use async_trait::async_trait;
use serde_json::json;

use super::{extract_json_object, ModelProvider, ProviderDiagnosis, ProviderError};
use crate::config::ProviderSettings;

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn diagnose(&self, prompt: &str) -> Result<ProviderDiagnosis, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredentials);
        }

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let response = self
            .client
            .post(url)
            .json(&json!({
                "contents": [{"parts": [{"text": prompt}]}],
                "generationConfig": {"temperature": 0.7, "maxOutputTokens": 500}
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::MalformedPayload("missing candidates[0] text part".to_string())
            })?;

        // Gemini wraps the JSON in prose more often than not.
        let value = extract_json_object(text)?;
        serde_json::from_value(value).map_err(|e| ProviderError::MalformedPayload(e.to_string()))
    }
}
