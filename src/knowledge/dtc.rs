//! DTC knowledge base: code decoding and pattern classification
//!
//! The decode table is a total mapping — unknown codes yield a generic
//! entry, never an error. The table is injectable and versioned so a
//! deployment can ship an updated code list without touching the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{DiagnosticCodeRecord, Severity};

/// Decoded information for one trouble code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtcInfo {
    pub code: String,
    pub description: String,
    pub category: String,
}

/// DTC pattern classification, in fixed priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DtcPattern {
    Misfire,
    FuelSystem,
    O2Sensor,
    Transmission,
    Turbo,
    Other,
    None,
}

impl std::fmt::Display for DtcPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DtcPattern::Misfire => write!(f, "misfire"),
            DtcPattern::FuelSystem => write!(f, "fuel_system"),
            DtcPattern::O2Sensor => write!(f, "o2_sensor"),
            DtcPattern::Transmission => write!(f, "transmission"),
            DtcPattern::Turbo => write!(f, "turbo"),
            DtcPattern::Other => write!(f, "other"),
            DtcPattern::None => write!(f, "none"),
        }
    }
}

impl DtcPattern {
    /// Classify a single code against the fixed pattern sets.
    fn of_code(code: &str) -> DtcPattern {
        if code.starts_with("P030") {
            DtcPattern::Misfire
        } else if matches!(code, "P0171" | "P0172" | "P0174" | "P0175") {
            DtcPattern::FuelSystem
        } else if code.starts_with("P013") || code.starts_with("P015") {
            DtcPattern::O2Sensor
        } else if code.starts_with("P07") {
            DtcPattern::Transmission
        } else if matches!(code, "P0299" | "P0234" | "P0235") {
            DtcPattern::Turbo
        } else {
            DtcPattern::Other
        }
    }
}

/// Result of scanning the active codes for pattern membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DtcAssessment {
    /// First matching pattern in priority order (misfire > fuel_system >
    /// o2_sensor > transmission > turbo > other), NONE when no active codes
    pub primary_pattern: DtcPattern,
    /// All matched patterns, priority order, for rule matching
    pub all_patterns: Vec<DtcPattern>,
    /// min(0.9, 0.3 + 0.15 × active code count); 0.1 with no active codes
    pub confidence: f64,
    /// HIGH if count > 2 or misfire present, MEDIUM otherwise, LOW if none
    pub risk: Severity,
    pub active_count: usize,
    /// Decoded entries for the active codes, request order
    pub decoded: Vec<DtcInfo>,
}

impl DtcAssessment {
    /// Whether a given pattern matched any active code.
    pub fn has_pattern(&self, pattern: DtcPattern) -> bool {
        self.all_patterns.contains(&pattern)
    }
}

/// Versioned decode table plus pattern classification.
#[derive(Debug, Clone)]
pub struct DtcKnowledgeBase {
    version: String,
    entries: HashMap<&'static str, (&'static str, &'static str)>,
}

impl Default for DtcKnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DtcKnowledgeBase {
    /// Built-in decode table covering the codes the rule engine reasons about.
    pub fn builtin() -> Self {
        let mut entries: HashMap<&'static str, (&'static str, &'static str)> = HashMap::new();
        for (code, description, category) in BUILTIN_CODES {
            entries.insert(code, (description, category));
        }
        Self {
            version: "builtin-1".to_string(),
            entries,
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Decode a code into human text. Total: unknown codes return a generic
    /// entry with category "unknown".
    pub fn decode(&self, code: &str) -> DtcInfo {
        match self.entries.get(code) {
            Some((description, category)) => DtcInfo {
                code: code.to_string(),
                description: (*description).to_string(),
                category: (*category).to_string(),
            },
            None => DtcInfo {
                code: code.to_string(),
                description: format!("unknown code: {code}"),
                category: "unknown".to_string(),
            },
        }
    }

    /// Scan the active codes for pattern membership and derive confidence
    /// and risk for the request.
    pub fn assess(&self, records: &[DiagnosticCodeRecord]) -> DtcAssessment {
        let active: Vec<&DiagnosticCodeRecord> =
            records.iter().filter(|r| r.is_active()).collect();

        if active.is_empty() {
            return DtcAssessment {
                primary_pattern: DtcPattern::None,
                all_patterns: Vec::new(),
                confidence: 0.1,
                risk: Severity::Low,
                active_count: 0,
                decoded: Vec::new(),
            };
        }

        // Collect matched patterns in priority order.
        const PRIORITY: [DtcPattern; 6] = [
            DtcPattern::Misfire,
            DtcPattern::FuelSystem,
            DtcPattern::O2Sensor,
            DtcPattern::Transmission,
            DtcPattern::Turbo,
            DtcPattern::Other,
        ];
        let mut all_patterns = Vec::new();
        for pattern in PRIORITY {
            if active.iter().any(|r| DtcPattern::of_code(&r.code) == pattern) {
                all_patterns.push(pattern);
            }
        }

        let primary_pattern = all_patterns.first().copied().unwrap_or(DtcPattern::Other);
        let count = active.len();
        let confidence = (0.3 + 0.15 * count as f64).min(0.9);
        let risk = if count > 2 || primary_pattern == DtcPattern::Misfire {
            Severity::High
        } else {
            Severity::Medium
        };

        DtcAssessment {
            primary_pattern,
            all_patterns,
            confidence,
            risk,
            active_count: count,
            decoded: active.iter().map(|r| self.decode(&r.code)).collect(),
        }
    }
}

/// (code, description, category)
const BUILTIN_CODES: &[(&str, &str, &str)] = &[
    ("P0300", "Random/multiple cylinder misfire detected", "ignition"),
    ("P0301", "Cylinder 1 misfire detected", "ignition"),
    ("P0302", "Cylinder 2 misfire detected", "ignition"),
    ("P0303", "Cylinder 3 misfire detected", "ignition"),
    ("P0304", "Cylinder 4 misfire detected", "ignition"),
    ("P0171", "System too lean (bank 1)", "fuel"),
    ("P0172", "System too rich (bank 1)", "fuel"),
    ("P0174", "System too lean (bank 2)", "fuel"),
    ("P0175", "System too rich (bank 2)", "fuel"),
    ("P0130", "O2 sensor circuit malfunction (bank 1 sensor 1)", "emissions"),
    ("P0131", "O2 sensor circuit low voltage (bank 1 sensor 1)", "emissions"),
    ("P0133", "O2 sensor circuit slow response (bank 1 sensor 1)", "emissions"),
    ("P0150", "O2 sensor circuit malfunction (bank 2 sensor 1)", "emissions"),
    ("P0299", "Turbocharger underboost condition", "forced induction"),
    ("P0234", "Turbocharger overboost condition", "forced induction"),
    ("P0235", "Turbocharger boost sensor circuit malfunction", "forced induction"),
    ("P0700", "Transmission control system malfunction", "transmission"),
    ("P0715", "Input/turbine speed sensor circuit malfunction", "transmission"),
    ("P0730", "Incorrect gear ratio", "transmission"),
    ("P0420", "Catalyst system efficiency below threshold (bank 1)", "emissions"),
    ("P0101", "Mass air flow sensor range/performance problem", "intake"),
    ("P0128", "Coolant thermostat below regulating temperature", "cooling"),
    ("P0401", "Exhaust gas recirculation flow insufficient", "emissions"),
    ("B0100", "Front impact sensor circuit short to ground", "body"),
    ("C0032", "Left front wheel speed sensor circuit", "chassis"),
    ("U0100", "Lost communication with engine control module", "network"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, value: f64) -> DiagnosticCodeRecord {
        DiagnosticCodeRecord {
            code: code.to_string(),
            raw_value: value,
        }
    }

    #[test]
    fn test_unknown_code_decodes_generically() {
        let kb = DtcKnowledgeBase::default();
        let info = kb.decode("Z9999");
        assert_eq!(info.description, "unknown code: Z9999");
        assert_eq!(info.category, "unknown");
    }

    #[test]
    fn test_no_active_codes_is_none_pattern() {
        let kb = DtcKnowledgeBase::default();
        let assessment = kb.assess(&[record("P0300", 0.0)]);
        assert_eq!(assessment.primary_pattern, DtcPattern::None);
        assert!((assessment.confidence - 0.1).abs() < 1e-9);
        assert_eq!(assessment.risk, Severity::Low);
    }

    #[test]
    fn test_misfire_wins_priority() {
        let kb = DtcKnowledgeBase::default();
        let assessment = kb.assess(&[record("P0171", 1.0), record("P0300", 1.0)]);
        assert_eq!(assessment.primary_pattern, DtcPattern::Misfire);
        assert!(assessment.has_pattern(DtcPattern::FuelSystem));
        assert_eq!(assessment.risk, Severity::High, "misfire forces HIGH risk");
    }

    #[test]
    fn test_confidence_scales_with_count_and_caps() {
        let kb = DtcKnowledgeBase::default();
        let one = kb.assess(&[record("P0171", 1.0)]);
        assert!((one.confidence - 0.45).abs() < 1e-9);

        let many: Vec<_> = ["P0300", "P0301", "P0302", "P0303", "P0171", "P0420"]
            .iter()
            .map(|c| record(c, 1.0))
            .collect();
        let assessment = kb.assess(&many);
        assert!((assessment.confidence - 0.9).abs() < 1e-9, "capped at 0.9");
    }

    #[test]
    fn test_unrecognized_code_classifies_as_other() {
        let kb = DtcKnowledgeBase::default();
        let assessment = kb.assess(&[record("Z9999", 1.0)]);
        assert_eq!(assessment.primary_pattern, DtcPattern::Other);
        assert_eq!(assessment.risk, Severity::Medium);
    }

    #[test]
    fn test_transmission_pattern_prefix() {
        let kb = DtcKnowledgeBase::default();
        let assessment = kb.assess(&[record("P0730", 1.0)]);
        assert_eq!(assessment.primary_pattern, DtcPattern::Transmission);
    }
}
