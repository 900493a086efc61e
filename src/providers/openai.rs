//! OpenAI-compatible chat-completions provider

use async_trait::async_trait;
use serde_json::json;

use super::{ModelProvider, ProviderDiagnosis, ProviderError};
use crate::config::ProviderSettings;

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
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
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn diagnose(&self, prompt: &str) -> Result<ProviderDiagnosis, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredentials);
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": "You are an automotive expert. Return only valid JSON."},
                    {"role": "user", "content": prompt}
                ],
                "temperature": 0.7,
                "max_tokens": 500,
                "response_format": {"type": "json_object"}
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ProviderError::MalformedPayload("missing choices[0].message.content".to_string())
            })?;

        serde_json::from_str(content).map_err(|e| ProviderError::MalformedPayload(e.to_string()))
    }
}
