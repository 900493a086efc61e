//! Diagnostic request schema with lenient field substitution
//!
//! Partial or malformed input is expected: every field is optional and
//! malformed values are substituted with safe defaults (empty list/string,
//! zero, clamped year) instead of rejecting the request. A degraded request
//! still produces a lower-confidence diagnosis.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::telemetry::TelemetryFrame;

/// DTC code format: one uppercase letter followed by four digits.
pub fn dtc_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]\d{4}").expect("valid literal regex"))
}

/// Free-text symptom report. Audio analysis is an external collaborator;
/// the handle is carried through opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomReport {
    /// Free-text description, may be empty
    #[serde(default, alias = "text")]
    pub free_text: String,
    /// Structured conditions, opaque to the core
    #[serde(default)]
    pub structured_conditions: BTreeMap<String, serde_json::Value>,
    /// Opaque handle to an uploaded audio sample
    #[serde(default)]
    pub audio_reference: Option<String>,
}

/// Static vehicle metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleProfile {
    #[serde(default = "default_make")]
    pub make: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Model year, clamped to a plausible range at deserialization
    #[serde(default = "default_model_year", deserialize_with = "de_model_year")]
    pub model_year: i32,
    #[serde(default)]
    pub engine_description: String,
    /// Odometer reading in km; non-numeric input becomes 0
    #[serde(default, deserialize_with = "de_odometer")]
    pub odometer_km: u64,
    #[serde(default)]
    pub vin: Option<String>,
}

impl Default for VehicleProfile {
    fn default() -> Self {
        Self {
            make: default_make(),
            model: default_model(),
            model_year: default_model_year(),
            engine_description: String::new(),
            odometer_km: 0,
            vin: None,
        }
    }
}

fn default_make() -> String {
    "standard".to_string()
}

fn default_model() -> String {
    "Unknown".to_string()
}

fn default_model_year() -> i32 {
    2023
}

const MODEL_YEAR_MIN: i32 = 1950;
const MODEL_YEAR_MAX: i32 = 2026;

/// The full diagnostic request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticRequest {
    #[serde(default)]
    pub telemetry: Vec<TelemetryFrame>,
    #[serde(default)]
    pub symptoms: SymptomReport,
    #[serde(default)]
    pub vehicle: VehicleProfile,
    /// Stored trouble codes; free-form input is normalized to `[A-Z]\d{4}`
    /// and non-conforming entries are dropped
    #[serde(default, deserialize_with = "de_dtc_codes")]
    pub dtc_codes: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ============================================================================
// Lenient deserializers
// ============================================================================

/// Accepts a number or a free-form string for numeric fields.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Num(f64),
    Str(String),
    Other(serde_json::Value),
}

fn de_model_year<'de, D: Deserializer<'de>>(de: D) -> Result<i32, D::Error> {
    let year = match Option::<Loose>::deserialize(de)? {
        Some(Loose::Num(n)) => n as i32,
        Some(Loose::Str(s)) => {
            static RE: OnceLock<Regex> = OnceLock::new();
            let re = RE.get_or_init(|| Regex::new(r"\d{4}").expect("valid literal regex"));
            re.find(&s)
                .and_then(|m| m.as_str().parse::<i32>().ok())
                .unwrap_or_else(default_model_year)
        }
        _ => default_model_year(),
    };
    if (MODEL_YEAR_MIN..=MODEL_YEAR_MAX).contains(&year) {
        Ok(year)
    } else {
        Ok(default_model_year())
    }
}

fn de_odometer<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    Ok(match Option::<Loose>::deserialize(de)? {
        Some(Loose::Num(n)) if n.is_finite() && n > 0.0 => n as u64,
        Some(Loose::Str(s)) => {
            static RE: OnceLock<Regex> = OnceLock::new();
            let re = RE.get_or_init(|| Regex::new(r"\d+").expect("valid literal regex"));
            re.find(&s)
                .and_then(|m| m.as_str().parse::<u64>().ok())
                .unwrap_or(0)
        }
        _ => 0,
    })
}

fn de_dtc_codes<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Codes {
        List(Vec<serde_json::Value>),
        Text(String),
        Other(serde_json::Value),
    }

    let raw = match Option::<Codes>::deserialize(de)? {
        Some(Codes::List(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Codes::Text(s)) => s,
        _ => String::new(),
    };

    let upper = raw.to_uppercase();
    Ok(dtc_code_regex()
        .find_iter(&upper)
        .map(|m| m.as_str().to_string())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_deserializes_to_defaults() {
        let req: DiagnosticRequest = serde_json::from_str("{}").unwrap();
        assert!(req.telemetry.is_empty());
        assert!(req.symptoms.free_text.is_empty());
        assert_eq!(req.vehicle.make, "standard");
        assert_eq!(req.vehicle.model_year, 2023);
        assert_eq!(req.vehicle.odometer_km, 0);
        assert!(req.dtc_codes.is_empty());
    }

    #[test]
    fn test_odometer_accepts_string_with_units() {
        let req: DiagnosticRequest = serde_json::from_str(
            r#"{"vehicle": {"make": "Dacia", "model": "Logan", "odometer_km": "150000 km"}}"#,
        )
        .unwrap();
        assert_eq!(req.vehicle.odometer_km, 150_000);
    }

    #[test]
    fn test_model_year_out_of_range_substituted() {
        let req: DiagnosticRequest =
            serde_json::from_str(r#"{"vehicle": {"model_year": 1890}}"#).unwrap();
        assert_eq!(req.vehicle.model_year, 2023);
    }

    #[test]
    fn test_dtc_codes_extracted_from_text() {
        let req: DiagnosticRequest =
            serde_json::from_str(r#"{"dtc_codes": "p0300, B0100 and junk"}"#).unwrap();
        assert_eq!(req.dtc_codes, vec!["P0300", "B0100"]);
    }

    #[test]
    fn test_dtc_codes_list_filters_malformed() {
        let req: DiagnosticRequest =
            serde_json::from_str(r#"{"dtc_codes": ["P0171", "bogus", "p0420"]}"#).unwrap();
        assert_eq!(req.dtc_codes, vec!["P0171", "P0420"]);
    }

    #[test]
    fn test_symptom_text_alias() {
        let req: DiagnosticRequest =
            serde_json::from_str(r#"{"symptoms": {"text": "motorul tremura"}}"#).unwrap();
        assert_eq!(req.symptoms.free_text, "motorul tremura");
    }
}
