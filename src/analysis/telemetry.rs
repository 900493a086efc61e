//! Telemetry analyzer: live-parameter merge, DTC-frame extraction, and
//! per-parameter band checks
//!
//! Analysis is order-independent: duplicate live parameters are resolved by
//! `observed_at` (newest reading wins) and anomalies are reported in rule-
//! table order, so the same set of frames in any order yields the same
//! report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::ParameterRule;
use crate::types::{
    dtc_code_regex, AnomalySeverity, CriticalFlag, DiagnosticCodeRecord, TelemetryAnomaly,
    TelemetryFrame, TelemetryReport, DTC_PARAMETER_PREFIX,
};

/// Analyze a sequence of telemetry frames against the per-parameter rules.
///
/// Missing parameters are never an error — absence simply means no anomaly
/// for that parameter.
pub fn analyze(frames: &[TelemetryFrame], rules: &[ParameterRule]) -> TelemetryReport {
    let mut live: BTreeMap<String, (f64, DateTime<Utc>)> = BTreeMap::new();
    let mut active_codes: Vec<DiagnosticCodeRecord> = Vec::new();

    for frame in frames {
        if let Some(raw_code) = frame.parameter_id.strip_prefix(DTC_PARAMETER_PREFIX) {
            let code = raw_code.to_uppercase();
            // Frames with a non-conforming code are dropped, not rejected.
            if dtc_code_regex().is_match(&code) && code.len() == 5 {
                active_codes.push(DiagnosticCodeRecord {
                    code,
                    raw_value: frame.value,
                });
            } else {
                debug!(parameter = %frame.parameter_id, "dropping malformed DTC frame");
            }
            continue;
        }

        if !frame.value.is_finite() {
            debug!(parameter = %frame.parameter_id, "dropping non-finite reading");
            continue;
        }

        // Newest observation wins, independent of sequence order.
        match live.get(&frame.parameter_id) {
            Some((_, seen_at)) if *seen_at > frame.observed_at => {}
            _ => {
                live.insert(frame.parameter_id.clone(), (frame.value, frame.observed_at));
            }
        }
    }

    let live_parameters: BTreeMap<String, f64> =
        live.into_iter().map(|(k, (v, _))| (k, v)).collect();

    let mut anomalies = Vec::new();
    let mut critical_flags = Vec::new();

    // Rule-table order keeps the anomaly list deterministic.
    for rule in rules {
        let Some(&value) = live_parameters.get(&rule.parameter) else {
            continue;
        };

        if value < rule.critical_min || value > rule.critical_max {
            let bound = if value < rule.critical_min {
                format!("below critical min {}", rule.critical_min)
            } else {
                format!("above critical max {}", rule.critical_max)
            };
            anomalies.push(TelemetryAnomaly {
                parameter: rule.parameter.clone(),
                value,
                severity: AnomalySeverity::High,
                detail: bound,
            });
            critical_flags.push(CriticalFlag {
                parameter: rule.parameter.clone(),
                value,
            });
        } else if value < rule.normal_min || value > rule.normal_max {
            let bound = if value < rule.normal_min {
                format!("below normal min {}", rule.normal_min)
            } else {
                format!("above normal max {}", rule.normal_max)
            };
            anomalies.push(TelemetryAnomaly {
                parameter: rule.parameter.clone(),
                value,
                severity: AnomalySeverity::Medium,
                detail: bound,
            });
        }
    }

    debug!(
        parameters = live_parameters.len(),
        codes = active_codes.len(),
        anomalies = anomalies.len(),
        critical = critical_flags.len(),
        "telemetry analysis complete"
    );

    TelemetryReport {
        live_parameters,
        active_codes,
        anomalies,
        critical_flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_parameter_rules;
    use chrono::TimeZone;

    fn frame(id: &str, value: f64) -> TelemetryFrame {
        TelemetryFrame {
            parameter_id: id.to_string(),
            value,
            unit: String::new(),
            observed_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().unwrap(),
        }
    }

    #[test]
    fn test_normal_readings_produce_no_anomalies() {
        let report = analyze(
            &[frame("rpm", 750.0), frame("engine_temp", 90.0)],
            &default_parameter_rules(),
        );
        assert!(report.anomalies.is_empty());
        assert!(!report.has_critical());
    }

    #[test]
    fn test_medium_anomaly_between_normal_and_critical() {
        // 400 rpm: below normal min 600, above critical min 300
        let report = analyze(&[frame("rpm", 400.0)], &default_parameter_rules());
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].severity, AnomalySeverity::Medium);
        assert!(report.critical_flags.is_empty());
    }

    #[test]
    fn test_critical_breach_raises_flag() {
        let report = analyze(&[frame("engine_temp", 125.0)], &default_parameter_rules());
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].severity, AnomalySeverity::High);
        assert_eq!(report.critical_flags.len(), 1);
        assert_eq!(report.critical_flags[0].parameter, "engine_temp");
        assert!((report.critical_flags[0].value - 125.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_engine_temp_boundary_values() {
        let rules = default_parameter_rules();
        // 105 is the normal max itself — inside the band, no anomaly
        assert!(analyze(&[frame("engine_temp", 105.0)], &rules).anomalies.is_empty());
        // 110 is above normal, inside critical — MEDIUM
        let mid = analyze(&[frame("engine_temp", 110.0)], &rules);
        assert_eq!(mid.anomalies[0].severity, AnomalySeverity::Medium);
        // 120 is the critical max itself — still MEDIUM, no flag
        let edge = analyze(&[frame("engine_temp", 120.0)], &rules);
        assert_eq!(edge.anomalies[0].severity, AnomalySeverity::Medium);
        assert!(edge.critical_flags.is_empty());
    }

    #[test]
    fn test_dtc_frames_extracted_not_merged() {
        let report = analyze(
            &[frame("dtc_p0300", 1.0), frame("dtc_p0171", 0.0)],
            &default_parameter_rules(),
        );
        assert_eq!(report.active_codes.len(), 2);
        assert_eq!(report.active_codes[0].code, "P0300");
        assert!(report.active_codes[0].is_active());
        assert!(!report.active_codes[1].is_active());
        assert!(report.live_parameters.is_empty());
    }

    #[test]
    fn test_malformed_dtc_frame_dropped() {
        let report = analyze(&[frame("dtc_xyz", 1.0)], &default_parameter_rules());
        assert!(report.active_codes.is_empty());
    }

    #[test]
    fn test_frame_order_does_not_change_report() {
        let mut frames = vec![
            frame("rpm", 400.0),
            frame("engine_temp", 90.0),
            frame("fuel_trim", 15.0),
        ];
        let forward = analyze(&frames, &default_parameter_rules());
        frames.reverse();
        let backward = analyze(&frames, &default_parameter_rules());

        let fwd: Vec<_> = forward.anomalies.iter().map(|a| &a.parameter).collect();
        let bwd: Vec<_> = backward.anomalies.iter().map(|a| &a.parameter).collect();
        assert_eq!(fwd, bwd, "anomaly set must be order-independent");
    }

    #[test]
    fn test_duplicate_parameter_newest_observation_wins() {
        let older = TelemetryFrame {
            observed_at: Utc.with_ymd_and_hms(2026, 1, 1, 11, 0, 0).single().unwrap(),
            ..frame("rpm", 700.0)
        };
        let newer = frame("rpm", 400.0);

        let a = analyze(&[older.clone(), newer.clone()], &default_parameter_rules());
        let b = analyze(&[newer, older], &default_parameter_rules());
        assert!((a.live_parameters["rpm"] - 400.0).abs() < f64::EPSILON);
        assert!((b.live_parameters["rpm"] - 400.0).abs() < f64::EPSILON);
    }
}
