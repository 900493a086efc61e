//! Diagnostic pipeline
//!
//! One request flows through four independent leaves (telemetry, symptoms,
//! vehicle context, DTC assessment) into a strict sequential chain: rule
//! engine → fusion/confidence → severity/urgency → cost estimate. Every
//! lookup table is immutable after startup, so requests need no locking;
//! the only shared mutable state is the insert-only result store.
//!
//! The external provider chain, when configured, is a best-effort
//! enrichment: its failure or timeout never blocks or fails the request.

pub mod cost;
pub mod fusion;
pub mod rules;
pub mod severity;

pub use rules::{DiagnosticRule, IssueTemplate, RuleContext, RuleEngine, RuleOutcome, RulePredicate};

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::info;

use crate::analysis::{self, VehicleContext};
use crate::config;
use crate::knowledge::{DtcKnowledgeBase, VehicleKnowledgeBase};
use crate::providers::{build_prompt, ProviderChain};
use crate::store::DiagnosisStore;
use crate::types::{
    DiagnosisRecord, DiagnosticCodeRecord, DiagnosticRequest, FusedDiagnosis, Issue,
    TelemetryReport, Urgency,
};

/// The assembled diagnostic pipeline. One instance serves all requests.
pub struct DiagnosticEngine {
    dtc_kb: DtcKnowledgeBase,
    vehicle_kb: VehicleKnowledgeBase,
    rules: RuleEngine,
    providers: Option<ProviderChain>,
    store: Arc<dyn DiagnosisStore>,
}

impl DiagnosticEngine {
    pub fn new(store: Arc<dyn DiagnosisStore>) -> Self {
        Self {
            dtc_kb: DtcKnowledgeBase::default(),
            vehicle_kb: VehicleKnowledgeBase,
            rules: RuleEngine::default(),
            providers: None,
            store,
        }
    }

    /// Attach an external provider chain. `None` keeps the pipeline
    /// rule-engine-only.
    pub fn with_providers(mut self, providers: Option<ProviderChain>) -> Self {
        self.providers = providers;
        self
    }

    pub fn store(&self) -> &Arc<dyn DiagnosisStore> {
        &self.store
    }

    pub fn vehicle_kb(&self) -> &VehicleKnowledgeBase {
        &self.vehicle_kb
    }

    /// Configured provider names, for health reporting.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers
            .as_ref()
            .map(ProviderChain::provider_names)
            .unwrap_or_default()
    }

    /// Run the full pipeline for one request.
    ///
    /// Total: malformed or partial input degrades confidence instead of
    /// failing, and provider failures are absorbed, so this never errors.
    pub async fn diagnose(&self, request: &DiagnosticRequest) -> DiagnosisRecord {
        let cfg = config::get();

        // Independent leaves.
        let telemetry = analysis::analyze_telemetry(&request.telemetry, &cfg.telemetry.rules);
        let symptoms = analysis::scan_symptoms(&request.symptoms.free_text);
        let vehicle =
            analysis::resolve_vehicle(&request.vehicle, &self.vehicle_kb, Utc::now().year());

        // Stored codes from the request body join the frame-derived ones.
        let mut code_records = telemetry.active_codes.clone();
        code_records.extend(request.dtc_codes.iter().map(|code| DiagnosticCodeRecord {
            code: code.clone(),
            raw_value: 1.0,
        }));
        let dtc = self.dtc_kb.assess(&code_records);

        // Sequential chain.
        let outcome = self.rules.evaluate(&RuleContext {
            dtc: &dtc,
            symptoms: &symptoms,
            telemetry: &telemetry,
            vehicle: &vehicle,
        });

        let external_issues = match &self.providers {
            Some(chain) => {
                let prompt = build_prompt(
                    &vehicle,
                    &dtc,
                    &symptoms,
                    &telemetry,
                    &request.symptoms.free_text,
                );
                chain
                    .run(&prompt)
                    .await
                    .map(|(_, issues)| issues)
                    .unwrap_or_default()
            }
            None => Vec::new(),
        };

        let fused = fusion::fuse(outcome.issues.clone(), external_issues);
        let overall_confidence = fusion::overall_confidence(&dtc, &symptoms, &vehicle, &telemetry);
        let severity = severity::classify_severity(&fused, outcome.asserted_severity);
        let urgency = severity::classify_urgency(severity, &telemetry);
        let cost_estimate = cost::estimate(&fused, &vehicle);
        let recommendations = compose_recommendations(&fused, urgency, &telemetry, &vehicle);

        let record = DiagnosisRecord {
            diagnosis_id: uuid::Uuid::new_v4().to_string(),
            session_id: request.session_id.clone(),
            diagnosis: FusedDiagnosis {
                ranked_issues: fused,
                overall_confidence,
                severity,
                urgency,
                cost_estimate,
                recommendations,
            },
            timestamp: Utc::now(),
        };

        info!(
            diagnosis_id = %record.diagnosis_id,
            issues = record.diagnosis.ranked_issues.len(),
            confidence = record.diagnosis.overall_confidence,
            severity = %record.diagnosis.severity,
            urgency = %record.diagnosis.urgency,
            "diagnosis complete"
        );

        self.store.put(record.clone());
        record
    }
}

/// Cap on returned recommendations.
const MAX_RECOMMENDATIONS: usize = 5;

/// Compose the ordered recommendation list: safety escalations first, then
/// per-issue inspection advice, then age/mileage maintenance notes.
fn compose_recommendations(
    issues: &[Issue],
    urgency: Urgency,
    telemetry: &TelemetryReport,
    vehicle: &VehicleContext,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if urgency == Urgency::Critical {
        recommendations.push(
            "Stop driving — a live reading is in the critical range; have the vehicle \
             inspected before continuing"
                .to_string(),
        );
    }
    for flag in &telemetry.critical_flags {
        let advice = match flag.parameter.as_str() {
            "engine_temp" => {
                "Switch off the engine and check the coolant level before restarting".to_string()
            }
            other => format!(
                "Critical reading on {} ({}) — inspect before further driving",
                other, flag.value
            ),
        };
        recommendations.push(advice);
    }

    for issue in issues.iter().take(3) {
        if issue.required_parts.is_empty() {
            recommendations.push(format!("Inspect the {}", issue.component));
        } else {
            let parts: Vec<&str> = issue.required_parts.iter().map(String::as_str).collect();
            recommendations.push(format!(
                "Inspect the {} (likely parts: {})",
                issue.component,
                parts.join(", ")
            ));
        }
    }

    if issues.is_empty() {
        recommendations.push(
            "No fault pattern detected; book a computerized diagnostic if symptoms persist"
                .to_string(),
        );
    }

    if vehicle.age_years > 10 {
        recommendations.push(
            "Age-related wear is likely — include suspension and steering checks in the next \
             service"
                .to_string(),
        );
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}
