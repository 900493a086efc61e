//! Diagnostic rule engine
//!
//! Rules are data, not code paths: an ordered list of rule records, each a
//! predicate descriptor plus issue templates, evaluated by one generic
//! matcher. First match wins; a symptom-only request that matches nothing
//! falls back to a single low-probability "needs professional scan" issue.
//!
//! After the primary pass, a post-pass boosts any issue that textually
//! overlaps the vehicle's known-issue list (+0.15, capped at 0.95) and sets
//! `matches_known_vehicle_issue`.

use std::collections::BTreeSet;

use tracing::debug;

use crate::analysis::{SymptomCategory, SymptomScan, VehicleContext};
use crate::knowledge::{DtcAssessment, DtcPattern};
use crate::types::{
    AnomalySeverity, Issue, IssueSource, RepairComplexity, RuleMatch, Severity, TelemetryReport,
};

/// Everything a rule predicate can see.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub dtc: &'a DtcAssessment,
    pub symptoms: &'a SymptomScan,
    pub telemetry: &'a TelemetryReport,
    pub vehicle: &'a VehicleContext,
}

/// Predicate descriptor. All present conditions must hold.
#[derive(Debug, Clone, Default)]
pub struct RulePredicate {
    /// Required DTC pattern (any retained pattern counts, not just primary)
    pub dtc_pattern: Option<DtcPattern>,
    /// Required detected symptom category
    pub symptom: Option<SymptomCategory>,
    /// Required anomalous live parameter
    pub anomaly_parameter: Option<String>,
    /// Minimum severity for the required anomaly
    pub anomaly_min_severity: Option<AnomalySeverity>,
}

impl RulePredicate {
    /// Evaluate the descriptor against the request context.
    pub fn matches(&self, ctx: &RuleContext<'_>) -> bool {
        if let Some(pattern) = self.dtc_pattern {
            if !ctx.dtc.has_pattern(pattern) {
                return false;
            }
        }
        if let Some(category) = self.symptom {
            if !ctx.symptoms.has(category) {
                return false;
            }
        }
        if let Some(parameter) = &self.anomaly_parameter {
            let floor = self.anomaly_min_severity.unwrap_or(AnomalySeverity::Medium);
            let hit = ctx
                .telemetry
                .anomalies
                .iter()
                .any(|a| a.parameter == *parameter && a.severity >= floor);
            if !hit {
                return false;
            }
        }
        true
    }

    /// Human-readable description of what fired, for `RuleMatch::triggered_by`.
    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(pattern) = self.dtc_pattern {
            parts.push(format!("dtc={pattern}"));
        }
        if let Some(category) = self.symptom {
            parts.push(format!("symptom={category}"));
        }
        if let Some(parameter) = &self.anomaly_parameter {
            parts.push(format!("anomaly={parameter}"));
        }
        if parts.is_empty() {
            parts.push("unconditional".to_string());
        }
        parts.join(" + ")
    }
}

/// Output template for one candidate issue.
#[derive(Debug, Clone)]
pub struct IssueTemplate {
    pub component: &'static str,
    pub description: &'static str,
    pub probability: f64,
    pub repair_complexity: RepairComplexity,
    pub estimated_labor_hours: f64,
    pub required_parts: &'static [&'static str],
}

impl IssueTemplate {
    fn instantiate(&self) -> Issue {
        Issue {
            component: self.component.to_string(),
            description: self.description.to_string(),
            probability: self.probability,
            repair_complexity: self.repair_complexity,
            estimated_labor_hours: self.estimated_labor_hours,
            required_parts: self
                .required_parts
                .iter()
                .map(|p| (*p).to_string())
                .collect::<BTreeSet<_>>(),
            source: IssueSource::RuleEngine,
            matches_known_vehicle_issue: false,
        }
        .clamped()
    }
}

/// One diagnostic rule record.
#[derive(Debug, Clone)]
pub struct DiagnosticRule {
    pub id: &'static str,
    pub when: RulePredicate,
    pub issues: Vec<IssueTemplate>,
    /// Severity asserted directly by the rule, overriding the
    /// probability-derived mapping when higher
    pub asserted_severity: Option<Severity>,
}

/// Result of one rule-engine evaluation.
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    /// The triggered rule, if any (the fallback also produces a match)
    pub matched: Option<RuleMatch>,
    pub issues: Vec<Issue>,
    pub asserted_severity: Option<Severity>,
}

/// Ordered, versioned rule table plus the generic matcher.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    version: String,
    rules: Vec<DiagnosticRule>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self {
            version: "builtin-1".to_string(),
            rules: builtin_rules(),
        }
    }
}

impl RuleEngine {
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Evaluate the ordered rule table; first match wins.
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        for rule in &self.rules {
            if rule.when.matches(ctx) {
                let mut issues: Vec<Issue> =
                    rule.issues.iter().map(IssueTemplate::instantiate).collect();
                boost_known_issues(&mut issues, ctx.vehicle);
                debug!(rule = rule.id, issues = issues.len(), "rule matched");
                return RuleOutcome {
                    matched: Some(RuleMatch {
                        pattern_id: rule.id.to_string(),
                        triggered_by: rule.when.describe(),
                        candidate_issues: issues.clone(),
                    }),
                    issues,
                    asserted_severity: rule.asserted_severity,
                };
            }
        }

        // No rule matched — fall back to a generic scan recommendation when
        // the driver at least reported something.
        if ctx.symptoms.count() > 0 {
            let mut issues = vec![fallback_issue()];
            boost_known_issues(&mut issues, ctx.vehicle);
            debug!("no rule matched, emitting fallback issue");
            return RuleOutcome {
                matched: Some(RuleMatch {
                    pattern_id: "symptom-fallback".to_string(),
                    triggered_by: format!("symptom={}", ctx.symptoms.primary),
                    candidate_issues: issues.clone(),
                }),
                issues,
                asserted_severity: None,
            };
        }

        RuleOutcome::default()
    }
}

fn fallback_issue() -> Issue {
    Issue {
        component: "general diagnostic".to_string(),
        description: "Reported symptoms do not match a known fault pattern; \
                      a professional computerized scan is needed"
            .to_string(),
        probability: 0.4,
        repair_complexity: RepairComplexity::Unknown,
        estimated_labor_hours: 1.0,
        required_parts: BTreeSet::new(),
        source: IssueSource::RuleEngine,
        matches_known_vehicle_issue: false,
    }
}

/// Probability boost applied when an issue overlaps the known-issue list.
const KNOWN_ISSUE_BOOST: f64 = 0.15;
const KNOWN_ISSUE_CAP: f64 = 0.95;

/// Post-pass: mark and boost issues that textually overlap the vehicle's
/// known-issue list. Overlap is case-insensitive word overlap (words longer
/// than 3 chars) against the issue's description, component, and parts.
fn boost_known_issues(issues: &mut [Issue], vehicle: &VehicleContext) {
    if vehicle.known_issues.is_empty() {
        return;
    }

    for issue in issues.iter_mut() {
        let haystack = format!(
            "{} {} {}",
            issue.component,
            issue.description,
            issue
                .required_parts
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        )
        .to_lowercase();

        let overlaps = vehicle.known_issues.iter().any(|known| {
            known
                .to_lowercase()
                .split_whitespace()
                .filter(|w| w.len() > 3)
                .any(|w| haystack.contains(w))
        });

        if overlaps {
            issue.probability = (issue.probability + KNOWN_ISSUE_BOOST).min(KNOWN_ISSUE_CAP);
            issue.matches_known_vehicle_issue = true;
        }
    }
}

/// Built-in rule table. Order is evaluation priority.
fn builtin_rules() -> Vec<DiagnosticRule> {
    vec![
        DiagnosticRule {
            id: "misfire-vibration",
            when: RulePredicate {
                dtc_pattern: Some(DtcPattern::Misfire),
                symptom: Some(SymptomCategory::Vibration),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "ignition system",
                description: "Cylinder misfire with vibration at idle: worn spark plugs, \
                              failing ignition coils, or timing chain stretch",
                probability: 0.85,
                repair_complexity: RepairComplexity::Medium,
                estimated_labor_hours: 2.5,
                required_parts: &["spark plugs", "ignition coils"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "fuel-system-consumption",
            when: RulePredicate {
                dtc_pattern: Some(DtcPattern::FuelSystem),
                symptom: Some(SymptomCategory::FuelConsumption),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "fuel system",
                description: "Mixture trim fault with elevated fuel consumption: injector \
                              fouling, vacuum leak, or MAF sensor drift",
                probability: 0.8,
                repair_complexity: RepairComplexity::Medium,
                estimated_labor_hours: 3.5,
                required_parts: &["fuel injectors", "fuel filter", "maf sensor"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "turbo-low-power",
            when: RulePredicate {
                dtc_pattern: Some(DtcPattern::Turbo),
                symptom: Some(SymptomCategory::LowPower),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "turbocharger",
                description: "Boost pressure deviation with power loss: turbocharger wear, \
                              stuck wastegate actuator, or boost leak",
                probability: 0.8,
                repair_complexity: RepairComplexity::High,
                estimated_labor_hours: 6.0,
                required_parts: &["turbocharger", "boost pressure sensor"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "o2-sensor-consumption",
            when: RulePredicate {
                dtc_pattern: Some(DtcPattern::O2Sensor),
                symptom: Some(SymptomCategory::FuelConsumption),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "oxygen sensor",
                description: "Lambda probe circuit fault with elevated consumption: aged \
                              oxygen sensor skewing the mixture trim",
                probability: 0.7,
                repair_complexity: RepairComplexity::Low,
                estimated_labor_hours: 1.5,
                required_parts: &["oxygen sensor"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "transmission-noise",
            when: RulePredicate {
                dtc_pattern: Some(DtcPattern::Transmission),
                symptom: Some(SymptomCategory::Noise),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "transmission",
                description: "Transmission fault codes with abnormal noise: low fluid, worn \
                              clutch packs, or valve body wear",
                probability: 0.75,
                repair_complexity: RepairComplexity::High,
                estimated_labor_hours: 8.0,
                required_parts: &["transmission fluid", "valve body"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "misfire-any",
            when: RulePredicate {
                dtc_pattern: Some(DtcPattern::Misfire),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "ignition system",
                description: "Cylinder misfire recorded without a matching symptom report; \
                              ignition components are the usual cause",
                probability: 0.65,
                repair_complexity: RepairComplexity::Medium,
                estimated_labor_hours: 2.0,
                required_parts: &["spark plugs"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "overheating",
            when: RulePredicate {
                anomaly_parameter: Some("engine_temp".to_string()),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "cooling system",
                description: "Engine temperature outside the operating band: thermostat, \
                              coolant pump, or radiator airflow",
                probability: 0.8,
                repair_complexity: RepairComplexity::Medium,
                estimated_labor_hours: 3.0,
                required_parts: &["thermostat", "coolant pump"],
            }],
            asserted_severity: Some(Severity::High),
        },
        DiagnosticRule {
            id: "charging-starting",
            when: RulePredicate {
                symptom: Some(SymptomCategory::Starting),
                anomaly_parameter: Some("battery_voltage".to_string()),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "battery and charging system",
                description: "Battery voltage out of band with starting trouble: weak battery \
                              or failing alternator",
                probability: 0.7,
                repair_complexity: RepairComplexity::Low,
                estimated_labor_hours: 1.0,
                required_parts: &["battery", "alternator"],
            }],
            asserted_severity: None,
        },
        DiagnosticRule {
            id: "smoke",
            when: RulePredicate {
                symptom: Some(SymptomCategory::Smoke),
                ..RulePredicate::default()
            },
            issues: vec![IssueTemplate {
                component: "engine internals",
                description: "Visible exhaust smoke: oil entering the combustion chamber \
                              through valve stem seals or piston rings",
                probability: 0.6,
                repair_complexity: RepairComplexity::High,
                estimated_labor_hours: 10.0,
                required_parts: &["valve stem seals", "piston rings"],
            }],
            asserted_severity: None,
        },
    ]
}
