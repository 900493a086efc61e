//! Symptom analyzer: keyword-category matching over free text
//!
//! Keywords are the Romanian driver vocabulary the product was trained on;
//! matching is lower-cased substring containment, so diacritic-free input
//! ("tremura") still hits.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Symptom category extracted from free text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SymptomCategory {
    Vibration,
    FuelConsumption,
    Noise,
    LowPower,
    Starting,
    Smoke,
}

impl std::fmt::Display for SymptomCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SymptomCategory::Vibration => write!(f, "vibration"),
            SymptomCategory::FuelConsumption => write!(f, "fuel_consumption"),
            SymptomCategory::Noise => write!(f, "noise"),
            SymptomCategory::LowPower => write!(f, "low_power"),
            SymptomCategory::Starting => write!(f, "starting"),
            SymptomCategory::Smoke => write!(f, "smoke"),
        }
    }
}

/// Category → keyword list. A category is detected when at least one keyword
/// occurs in the lower-cased text.
const KEYWORD_TABLE: &[(SymptomCategory, &[&str])] = &[
    (SymptomCategory::Vibration, &["tremur", "vibra", "scutur"]),
    (SymptomCategory::FuelConsumption, &["consum", "bea mult"]),
    (SymptomCategory::Noise, &["zgomot", "bubuit"]),
    (SymptomCategory::LowPower, &["slab", "nu trage"]),
    (SymptomCategory::Starting, &["nu porneste", "se stinge"]),
    (SymptomCategory::Smoke, &["fum", "fumeg"]),
];

/// Match intensity: HIGH when more than two keywords of the category hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SymptomIntensity {
    Medium,
    High,
}

/// One detected category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedSymptom {
    pub category: SymptomCategory,
    pub intensity: SymptomIntensity,
    /// Byte offset of the earliest keyword hit, used for ordering
    pub first_position: usize,
    pub matched_keywords: usize,
}

/// Sentinel reported when no category was detected.
pub const NO_PRIMARY_SYMPTOM: &str = "none";

/// Output of the symptom analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymptomScan {
    /// Detected categories ordered by first match position in the text
    pub detected: Vec<DetectedSymptom>,
    /// First detected category, or the "none" sentinel
    pub primary: String,
    /// 0.1 when nothing detected, else min(0.9, 0.3 + 0.2 × category count)
    pub confidence: f64,
}

impl SymptomScan {
    pub fn count(&self) -> usize {
        self.detected.len()
    }

    pub fn has(&self, category: SymptomCategory) -> bool {
        self.detected.iter().any(|d| d.category == category)
    }
}

/// Scan free text for symptom categories. Empty or whitespace text yields an
/// empty scan, not an error.
pub fn scan(free_text: &str) -> SymptomScan {
    let text = free_text.to_lowercase();
    if text.trim().is_empty() {
        return SymptomScan {
            detected: Vec::new(),
            primary: NO_PRIMARY_SYMPTOM.to_string(),
            confidence: 0.1,
        };
    }

    let mut detected = Vec::new();
    for (category, keywords) in KEYWORD_TABLE {
        let mut first_position = usize::MAX;
        let mut matched = 0;
        for keyword in *keywords {
            if let Some(pos) = text.find(keyword) {
                matched += 1;
                first_position = first_position.min(pos);
            }
        }
        if matched > 0 {
            let intensity = if matched > 2 {
                SymptomIntensity::High
            } else {
                SymptomIntensity::Medium
            };
            detected.push(DetectedSymptom {
                category: *category,
                intensity,
                first_position,
                matched_keywords: matched,
            });
        }
    }

    detected.sort_by_key(|d| d.first_position);

    let primary = detected
        .first()
        .map_or_else(|| NO_PRIMARY_SYMPTOM.to_string(), |d| d.category.to_string());
    let confidence = if detected.is_empty() {
        0.1
    } else {
        (0.3 + 0.2 * detected.len() as f64).min(0.9)
    };

    debug!(
        categories = detected.len(),
        primary = %primary,
        "symptom scan complete"
    );

    SymptomScan {
        detected,
        primary,
        confidence,
    }
}
