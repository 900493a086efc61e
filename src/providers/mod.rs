//! External AI provider integration
//!
//! The pipeline treats "ask an external model" as a replaceable capability:
//! submit a prompt, get back a validated issue-list-with-confidence object
//! or a failure. Providers are tried sequentially in priority order, each
//! bounded by its own timeout; the first validated response wins and a
//! failure anywhere falls through to the next provider. All failures are
//! recovered locally — the caller always gets a best-effort rule-engine
//! result.

mod gemini;
mod ollama;
mod openai;
mod prompt;

pub use gemini::GeminiProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use prompt::build_prompt;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ProvidersConfig;
use crate::types::{Issue, IssueSource, RepairComplexity};

/// Errors a provider attempt can surface. Never reaches the request caller;
/// the chain logs and falls through.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no credentials configured")]
    MissingCredentials,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("response failed validation: {0}")]
    Validation(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Issue candidate as returned by a provider, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderIssue {
    pub component: String,
    pub description: String,
    pub probability: f64,
    #[serde(default)]
    pub repair_complexity: RepairComplexity,
    #[serde(default)]
    pub estimated_labor_hours: f64,
    #[serde(default)]
    pub required_parts: Vec<String>,
}

/// Validated provider verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDiagnosis {
    pub issues: Vec<ProviderIssue>,
    pub confidence: f64,
}

impl ProviderDiagnosis {
    /// Schema validation mirroring what we demand from every provider:
    /// non-empty issue list, probabilities and confidence inside [0, 1].
    pub fn validate(&self) -> Result<(), ProviderError> {
        if self.issues.is_empty() {
            return Err(ProviderError::Validation("empty issue list".to_string()));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ProviderError::Validation(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        for issue in &self.issues {
            if issue.component.trim().is_empty() {
                return Err(ProviderError::Validation("blank component".to_string()));
            }
            if !(0.0..=1.0).contains(&issue.probability) {
                return Err(ProviderError::Validation(format!(
                    "probability {} outside [0, 1]",
                    issue.probability
                )));
            }
        }
        Ok(())
    }

    /// Convert into pipeline issues tagged as externally sourced.
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
            .into_iter()
            .map(|p| {
                Issue {
                    component: p.component,
                    description: p.description,
                    probability: p.probability,
                    repair_complexity: p.repair_complexity,
                    estimated_labor_hours: p.estimated_labor_hours,
                    required_parts: p.required_parts.into_iter().collect(),
                    source: IssueSource::ExternalModel,
                    matches_known_vehicle_issue: false,
                }
                .clamped()
            })
            .collect()
    }
}

/// Capability interface every external provider implements.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name for logging and health reporting
    fn name(&self) -> &'static str;

    /// Submit the prompt and return a parsed (not yet validated) diagnosis
    async fn diagnose(&self, prompt: &str) -> Result<ProviderDiagnosis, ProviderError>;
}

/// Ordered fallback chain over provider implementations.
///
/// One timeout/validate/fallback policy for every provider: each attempt is
/// bounded by its own timeout, so total chain latency is bounded by the sum.
/// No retry of a failed provider within one request.
pub struct ProviderChain {
    providers: Vec<(Box<dyn ModelProvider>, Duration)>,
}

impl ProviderChain {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    pub fn push(mut self, provider: Box<dyn ModelProvider>, timeout: Duration) -> Self {
        self.providers.push((provider, timeout));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Provider names in priority order, for health reporting.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|(p, _)| p.name()).collect()
    }

    /// Build the chain from configuration and ambient credentials.
    ///
    /// Returns `None` when no provider is usable — the pipeline then runs
    /// rule-engine-only.
    pub fn from_env(config: &ProvidersConfig) -> Option<Self> {
        let mut chain = Self::new();

        if config.openai.enabled {
            if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
                chain = chain.push(
                    Box::new(OpenAiProvider::new(&config.openai, api_key)),
                    Duration::from_secs(config.openai.timeout_secs),
                );
            }
        }
        if config.gemini.enabled {
            if let Ok(api_key) = std::env::var("GEMINI_API_KEY") {
                chain = chain.push(
                    Box::new(GeminiProvider::new(&config.gemini, api_key)),
                    Duration::from_secs(config.gemini.timeout_secs),
                );
            }
        }
        if config.ollama.enabled {
            chain = chain.push(
                Box::new(OllamaProvider::new(&config.ollama)),
                Duration::from_secs(config.ollama.timeout_secs),
            );
        }

        if chain.is_empty() {
            None
        } else {
            info!(providers = ?chain.provider_names(), "external provider chain configured");
            Some(chain)
        }
    }

    /// Try each provider in order; return the first validated issue list.
    ///
    /// Every failure mode (timeout, HTTP error, malformed payload, schema
    /// validation) is logged and absorbed here.
    pub async fn run(&self, prompt: &str) -> Option<(String, Vec<Issue>)> {
        for (provider, timeout) in &self.providers {
            let attempt = tokio::time::timeout(*timeout, provider.diagnose(prompt)).await;
            let result = match attempt {
                Ok(inner) => inner,
                Err(_) => Err(ProviderError::Timeout(*timeout)),
            };

            match result {
                Ok(diagnosis) => match diagnosis.validate() {
                    Ok(()) => {
                        info!(provider = provider.name(), issues = diagnosis.issues.len(), "provider responded");
                        return Some((provider.name().to_string(), diagnosis.into_issues()));
                    }
                    Err(e) => {
                        warn!(provider = provider.name(), error = %e, "provider response rejected");
                    }
                },
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider attempt failed");
                }
            }
        }

        warn!("all external providers failed — continuing rule-engine-only");
        None
    }
}

impl Default for ProviderChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the first JSON object embedded in free text. Some providers wrap
/// the JSON in prose or code fences.
pub(crate) fn extract_json_object(text: &str) -> Result<serde_json::Value, ProviderError> {
    let start = text
        .find('{')
        .ok_or_else(|| ProviderError::MalformedPayload("no JSON object in response".to_string()))?;
    let end = text
        .rfind('}')
        .ok_or_else(|| ProviderError::MalformedPayload("unterminated JSON object".to_string()))?;
    serde_json::from_str(&text[start..=end])
        .map_err(|e| ProviderError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingProvider;

    #[async_trait]
    impl ModelProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }
        async fn diagnose(&self, _prompt: &str) -> Result<ProviderDiagnosis, ProviderError> {
            Err(ProviderError::Status(500))
        }
    }

    struct SlowProvider;

    #[async_trait]
    impl ModelProvider for SlowProvider {
        fn name(&self) -> &'static str {
            "slow"
        }
        async fn diagnose(&self, _prompt: &str) -> Result<ProviderDiagnosis, ProviderError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ProviderDiagnosis {
                issues: Vec::new(),
                confidence: 0.5,
            })
        }
    }

    struct GoodProvider;

    #[async_trait]
    impl ModelProvider for GoodProvider {
        fn name(&self) -> &'static str {
            "good"
        }
        async fn diagnose(&self, _prompt: &str) -> Result<ProviderDiagnosis, ProviderError> {
            Ok(ProviderDiagnosis {
                issues: vec![ProviderIssue {
                    component: "fuel system".to_string(),
                    description: "clogged injectors".to_string(),
                    probability: 0.7,
                    repair_complexity: RepairComplexity::Medium,
                    estimated_labor_hours: 2.0,
                    required_parts: vec!["fuel injectors".to_string()],
                }],
                confidence: 0.8,
            })
        }
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_provider() {
        let chain = ProviderChain::new()
            .push(Box::new(FailingProvider), Duration::from_secs(1))
            .push(Box::new(GoodProvider), Duration::from_secs(1));

        let (name, issues) = chain.run("prompt").await.expect("good provider answers");
        assert_eq!(name, "good");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].source, IssueSource::ExternalModel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_times_out_slow_provider() {
        let chain = ProviderChain::new()
            .push(Box::new(SlowProvider), Duration::from_millis(50))
            .push(Box::new(GoodProvider), Duration::from_secs(1));

        let (name, _) = chain.run("prompt").await.expect("fallback answers");
        assert_eq!(name, "good");
    }

    #[tokio::test]
    async fn test_all_failures_yield_none() {
        let chain = ProviderChain::new().push(Box::new(FailingProvider), Duration::from_secs(1));
        assert!(chain.run("prompt").await.is_none());
    }

    #[test]
    fn test_validation_rejects_out_of_range_probability() {
        let diagnosis = ProviderDiagnosis {
            issues: vec![ProviderIssue {
                component: "x".to_string(),
                description: String::new(),
                probability: 1.4,
                repair_complexity: RepairComplexity::Unknown,
                estimated_labor_hours: 0.0,
                required_parts: Vec::new(),
            }],
            confidence: 0.5,
        };
        assert!(diagnosis.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_issue_list() {
        let diagnosis = ProviderDiagnosis {
            issues: Vec::new(),
            confidence: 0.5,
        };
        assert!(diagnosis.validate().is_err());
    }

    #[test]
    fn test_extract_json_from_fenced_text() {
        let text = "Here you go:\n```json\n{\"confidence\": 0.8, \"issues\": []}\n```";
        let value = extract_json_object(text).expect("embedded JSON parses");
        assert!((value["confidence"].as_f64().unwrap() - 0.8).abs() < 1e-9);
    }
}
