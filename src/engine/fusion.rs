//! Fusion and confidence scoring
//!
//! Fusion is deliberately simple: concatenate the rule-engine issues (first)
//! and any external-model issues (second), stable-sort by probability, and
//! truncate. The confidence score is a transparent additive formula — every
//! addend is traceable to one evidence source, which is what the test suite
//! pins down.

use tracing::debug;

use crate::analysis::{SymptomScan, VehicleContext};
use crate::knowledge::DtcAssessment;
use crate::types::{Issue, TelemetryReport, MAX_RANKED_ISSUES};

/// Merge candidate issues from both sources into the final ranking.
///
/// The sort is stable, so equal probabilities keep first-seen order and
/// rule-engine issues outrank external ones on ties.
pub fn fuse(rule_issues: Vec<Issue>, external_issues: Vec<Issue>) -> Vec<Issue> {
    let mut merged = rule_issues;
    merged.extend(external_issues);
    merged.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    merged.truncate(MAX_RANKED_ISSUES);
    merged
}

/// Confidence floor and ceiling.
pub const CONFIDENCE_MIN: f64 = 0.1;
pub const CONFIDENCE_MAX: f64 = 0.95;

const BASE: f64 = 0.5;
const DTC_WEIGHT: f64 = 0.3;
const SYMPTOM_WEIGHT: f64 = 0.3;
const KNOWN_ISSUE_BONUS: f64 = 0.15;
const AGREEMENT_BONUS: f64 = 0.10;
const AGREEMENT_THRESHOLD: f64 = 0.5;

/// Overall confidence for the request.
///
/// `0.5 + 0.3 × dtc + 0.3 × symptom`, +0.15 when the vehicle has known
/// issues, +0.10 when both evidence confidences exceed 0.5, clamped to
/// [0.1, 0.95]. A request with no evidence at all (no active codes, no
/// detected symptoms, no anomalies) scores the floor outright — the
/// additive path cannot reach it.
pub fn overall_confidence(
    dtc: &DtcAssessment,
    symptoms: &SymptomScan,
    vehicle: &VehicleContext,
    telemetry: &TelemetryReport,
) -> f64 {
    let no_evidence =
        dtc.active_count == 0 && symptoms.count() == 0 && telemetry.anomalies.is_empty();
    if no_evidence {
        return CONFIDENCE_MIN;
    }

    let mut score = BASE + DTC_WEIGHT * dtc.confidence + SYMPTOM_WEIGHT * symptoms.confidence;
    if vehicle.has_known_issues() {
        score += KNOWN_ISSUE_BONUS;
    }
    if dtc.confidence > AGREEMENT_THRESHOLD && symptoms.confidence > AGREEMENT_THRESHOLD {
        score += AGREEMENT_BONUS;
    }

    let clamped = score.clamp(CONFIDENCE_MIN, CONFIDENCE_MAX);
    debug!(
        dtc_confidence = dtc.confidence,
        symptom_confidence = symptoms.confidence,
        known_issues = vehicle.has_known_issues(),
        score = clamped,
        "confidence computed"
    );
    clamped
}
