//! Application configuration — tunable values as TOML
//!
//! Every table the pipeline consults (telemetry bands, provider chain
//! settings, server binding) is a field here with serde defaults matching
//! the built-in values, so behavior is unchanged when no config file is
//! present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Root configuration for a deployment.
///
/// Load with [`AppConfig::load`], which searches:
/// 1. `$REPARA_CONFIG` env var
/// 2. `./repara.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Comma-separated allowed CORS origins; empty = same-origin only
    #[serde(default)]
    pub cors_origins: String,
}

fn default_addr() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            cors_origins: String::new(),
        }
    }
}

/// Normal/critical band for one live parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterRule {
    pub parameter: String,
    pub normal_min: f64,
    pub normal_max: f64,
    pub critical_min: f64,
    pub critical_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Per-parameter band rules, evaluated in table order
    #[serde(default = "default_parameter_rules")]
    pub rules: Vec<ParameterRule>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            rules: default_parameter_rules(),
        }
    }
}

/// Built-in per-parameter bands.
pub fn default_parameter_rules() -> Vec<ParameterRule> {
    const TABLE: &[(&str, f64, f64, f64, f64)] = &[
        ("rpm", 600.0, 850.0, 300.0, 5000.0),
        ("engine_temp", 85.0, 105.0, 70.0, 120.0),
        ("fuel_trim", -10.0, 10.0, -25.0, 25.0),
        ("battery_voltage", 12.0, 14.8, 11.0, 15.5),
        ("fuel_pressure", 300.0, 500.0, 250.0, 600.0),
        ("o2_voltage", 0.1, 0.9, 0.05, 1.0),
    ];
    TABLE
        .iter()
        .map(
            |(parameter, normal_min, normal_max, critical_min, critical_max)| ParameterRule {
                parameter: (*parameter).to_string(),
                normal_min: *normal_min,
                normal_max: *normal_max,
                critical_min: *critical_min,
                critical_max: *critical_max,
            },
        )
        .collect()
}

/// Settings for one external AI provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub model: String,
    /// Per-attempt timeout; the chain's total latency is bounded by the sum
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
    /// Base URL override (required for the local provider)
    #[serde(default)]
    pub base_url: String,
}

fn default_provider_timeout() -> u64 {
    8
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_openai")]
    pub openai: ProviderSettings,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderSettings,
    #[serde(default = "default_ollama")]
    pub ollama: ProviderSettings,
}

fn default_openai() -> ProviderSettings {
    ProviderSettings {
        enabled: true,
        model: "gpt-4o-mini".to_string(),
        timeout_secs: 8,
        base_url: "https://api.openai.com/v1".to_string(),
    }
}

fn default_gemini() -> ProviderSettings {
    ProviderSettings {
        enabled: true,
        model: "gemini-pro".to_string(),
        timeout_secs: 8,
        base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    }
}

fn default_ollama() -> ProviderSettings {
    ProviderSettings {
        enabled: false,
        model: "mistral".to_string(),
        timeout_secs: 9,
        base_url: "http://localhost:11434".to_string(),
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: default_openai(),
            gemini: default_gemini(),
            ollama: default_ollama(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("REPARA_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from REPARA_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from REPARA_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "REPARA_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("repara.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./repara.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./repara.toml, using defaults");
                }
            }
        }

        info!("No repara.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity checks on band ordering and timeouts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.telemetry.rules {
            if rule.normal_min > rule.normal_max {
                return Err(ConfigError::Invalid(format!(
                    "{}: normal_min {} > normal_max {}",
                    rule.parameter, rule.normal_min, rule.normal_max
                )));
            }
            if rule.critical_min > rule.normal_min || rule.critical_max < rule.normal_max {
                return Err(ConfigError::Invalid(format!(
                    "{}: critical band must contain the normal band",
                    rule.parameter
                )));
            }
        }
        for (name, settings) in [
            ("openai", &self.providers.openai),
            ("gemini", &self.providers.gemini),
            ("ollama", &self.providers.ollama),
        ] {
            if settings.timeout_secs == 0 || settings.timeout_secs > 30 {
                return Err(ConfigError::Invalid(format!(
                    "providers.{name}.timeout_secs must be in 1..=30"
                )));
            }
        }
        Ok(())
    }
}
