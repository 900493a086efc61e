//! Local Ollama provider — the last, credential-free fallback

use async_trait::async_trait;
use serde_json::json;

use super::{ModelProvider, ProviderDiagnosis, ProviderError};
use crate::config::ProviderSettings;

pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaProvider {
    pub fn new(settings: &ProviderSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn diagnose(&self, prompt: &str) -> Result<ProviderDiagnosis, ProviderError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&json!({
                "model": self.model,
                "prompt": prompt,
                "format": "json",
                "stream": false,
                "options": {"temperature": 0.7, "num_predict": 500}
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        let text = body["response"].as_str().ok_or_else(|| {
            ProviderError::MalformedPayload("missing response field".to_string())
        })?;

        serde_json::from_str(text).map_err(|e| ProviderError::MalformedPayload(e.to_string()))
    }
}
