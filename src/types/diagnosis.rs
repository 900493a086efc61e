//! Diagnosis output types: Issue, RuleMatch, FusedDiagnosis, DiagnosisRecord

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a candidate issue came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueSource {
    /// Produced by the local rule engine (fusion priority 1)
    RuleEngine,
    /// Produced by an external AI provider (fusion priority 2)
    ExternalModel,
}

/// Repair complexity ordinal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepairComplexity {
    Low = 0,
    Medium = 1,
    High = 2,
    #[default]
    Unknown = 3,
}

/// One candidate mechanical issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Affected component category (e.g. "ignition system")
    pub component: String,
    /// Human-readable problem description
    pub description: String,
    /// Probability in [0, 1], clamped at construction
    pub probability: f64,
    pub repair_complexity: RepairComplexity,
    pub estimated_labor_hours: f64,
    pub required_parts: BTreeSet<String>,
    pub source: IssueSource,
    /// Set by the rule engine's post-pass when the description overlaps the
    /// vehicle's known-issue list
    pub matches_known_vehicle_issue: bool,
}

impl Issue {
    /// Clamp probability into [0, 1]; all construction paths go through this.
    pub fn clamped(mut self) -> Self {
        self.probability = self.probability.clamp(0.0, 1.0);
        self
    }
}

/// A triggered diagnostic rule together with what triggered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMatch {
    /// Stable rule identifier (e.g. "misfire-vibration")
    pub pattern_id: String,
    /// Which DTC/telemetry/symptom combination fired the rule
    pub triggered_by: String,
    pub candidate_issues: Vec<Issue>,
}

/// Overall issue severity ordinal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

impl Severity {
    /// Map an issue probability to a severity band.
    pub fn from_probability(p: f64) -> Self {
        if p > 0.8 {
            Severity::High
        } else if p > 0.6 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Repair urgency ordinal. Never below what telemetry criticality implies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
    Critical = 3,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "LOW"),
            Urgency::Medium => write!(f, "MEDIUM"),
            Urgency::High => write!(f, "HIGH"),
            Urgency::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// One matched cost-table entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostItem {
    /// Cost-table category that matched (e.g. "ignition system")
    pub category: String,
    /// Issue component the match was made for
    pub component: String,
    /// Cost in the base currency (RON), after multipliers
    pub amount_ron: f64,
    pub labor_hours: f64,
}

/// Repair-cost estimate: per-currency totals plus itemization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Currency code → total (e.g. {"RON": 1200.0, "EUR": 241.2, "USD": 258.0})
    pub totals: std::collections::BTreeMap<String, f64>,
    pub total_labor_hours: f64,
    pub itemized: Vec<CostItem>,
}

/// The fused diagnostic verdict for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedDiagnosis {
    /// Highest probability first, stable tie-break, at most 5 entries
    pub ranked_issues: Vec<Issue>,
    /// Always in [0.1, 0.95]
    pub overall_confidence: f64,
    pub severity: Severity,
    pub urgency: Urgency,
    pub cost_estimate: CostEstimate,
    pub recommendations: Vec<String>,
}

/// Cap on the number of ranked issues surfaced to the caller.
pub const MAX_RANKED_ISSUES: usize = 5;

/// The cached, retrievable result of one diagnostic request.
///
/// The only entity retained after the response is produced; everything else
/// is request-scoped and discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub diagnosis_id: String,
    pub session_id: Option<String>,
    #[serde(flatten)]
    pub diagnosis: FusedDiagnosis,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_probability_bands() {
        assert_eq!(Severity::from_probability(0.95), Severity::High);
        assert_eq!(Severity::from_probability(0.8), Severity::Medium);
        assert_eq!(Severity::from_probability(0.7), Severity::Medium);
        assert_eq!(Severity::from_probability(0.6), Severity::Low);
        assert_eq!(Severity::from_probability(0.1), Severity::Low);
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Critical > Urgency::High);
        assert!(Urgency::High > Urgency::Medium);
        assert!(Urgency::Medium > Urgency::Low);
    }

    #[test]
    fn test_issue_clamped() {
        let issue = Issue {
            component: "test".to_string(),
            description: String::new(),
            probability: 1.7,
            repair_complexity: RepairComplexity::Unknown,
            estimated_labor_hours: 0.0,
            required_parts: BTreeSet::new(),
            source: IssueSource::RuleEngine,
            matches_known_vehicle_issue: false,
        }
        .clamped();
        assert!((issue.probability - 1.0).abs() < f64::EPSILON);
    }
}
