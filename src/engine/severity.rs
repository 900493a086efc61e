//! Severity and urgency classification
//!
//! Urgency escalation by telemetry is a safety override, not an average: a
//! critical live reading forces CRITICAL regardless of what the rule engine
//! concluded.

use crate::types::{Issue, Severity, TelemetryReport, Urgency};

/// Overall severity: the maximum probability-mapped severity across the
/// fused issues, or the rule-asserted severity when that is higher.
pub fn classify_severity(issues: &[Issue], asserted: Option<Severity>) -> Severity {
    let from_issues = issues
        .iter()
        .map(|i| Severity::from_probability(i.probability))
        .max()
        .unwrap_or(Severity::Low);
    match asserted {
        Some(s) => from_issues.max(s),
        None => from_issues,
    }
}

/// Urgency from severity plus telemetry criticality.
///
/// - any critical-parameter flag ⇒ CRITICAL, unconditionally
/// - severity HIGH ⇒ HIGH
/// - severity MEDIUM, or any telemetry anomaly at all ⇒ MEDIUM
/// - otherwise LOW
pub fn classify_urgency(severity: Severity, telemetry: &TelemetryReport) -> Urgency {
    if telemetry.has_critical() {
        return Urgency::Critical;
    }
    match severity {
        Severity::High => Urgency::High,
        Severity::Medium => Urgency::Medium,
        Severity::Low => {
            if telemetry.anomalies.is_empty() {
                Urgency::Low
            } else {
                Urgency::Medium
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AnomalySeverity, CriticalFlag, IssueSource, RepairComplexity, TelemetryAnomaly,
    };
    use std::collections::BTreeSet;

    fn issue(probability: f64) -> Issue {
        Issue {
            component: "x".to_string(),
            description: String::new(),
            probability,
            repair_complexity: RepairComplexity::Unknown,
            estimated_labor_hours: 0.0,
            required_parts: BTreeSet::new(),
            source: IssueSource::RuleEngine,
            matches_known_vehicle_issue: false,
        }
    }

    fn report_with_critical() -> TelemetryReport {
        TelemetryReport {
            critical_flags: vec![CriticalFlag {
                parameter: "engine_temp".to_string(),
                value: 125.0,
            }],
            anomalies: vec![TelemetryAnomaly {
                parameter: "engine_temp".to_string(),
                value: 125.0,
                severity: AnomalySeverity::High,
                detail: String::new(),
            }],
            ..TelemetryReport::default()
        }
    }

    fn report_with_medium_anomaly() -> TelemetryReport {
        TelemetryReport {
            anomalies: vec![TelemetryAnomaly {
                parameter: "rpm".to_string(),
                value: 400.0,
                severity: AnomalySeverity::Medium,
                detail: String::new(),
            }],
            ..TelemetryReport::default()
        }
    }

    #[test]
    fn test_severity_is_max_over_issues() {
        let severity = classify_severity(&[issue(0.3), issue(0.85), issue(0.65)], None);
        assert_eq!(severity, Severity::High);
    }

    #[test]
    fn test_asserted_severity_raises_but_never_lowers() {
        assert_eq!(
            classify_severity(&[issue(0.3)], Some(Severity::High)),
            Severity::High
        );
        assert_eq!(
            classify_severity(&[issue(0.9)], Some(Severity::Low)),
            Severity::High
        );
    }

    #[test]
    fn test_no_issues_is_low_severity() {
        assert_eq!(classify_severity(&[], None), Severity::Low);
    }

    #[test]
    fn test_critical_flag_forces_critical_even_at_low_severity() {
        let urgency = classify_urgency(Severity::Low, &report_with_critical());
        assert_eq!(urgency, Urgency::Critical);
    }

    #[test]
    fn test_urgency_follows_severity_without_flags() {
        let clean = TelemetryReport::default();
        assert_eq!(classify_urgency(Severity::High, &clean), Urgency::High);
        assert_eq!(classify_urgency(Severity::Medium, &clean), Urgency::Medium);
        assert_eq!(classify_urgency(Severity::Low, &clean), Urgency::Low);
    }

    #[test]
    fn test_medium_anomaly_raises_low_severity_to_medium_urgency() {
        let urgency = classify_urgency(Severity::Low, &report_with_medium_anomaly());
        assert_eq!(urgency, Urgency::Medium);
    }
}
