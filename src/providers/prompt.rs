//! Prompt construction for external providers
//!
//! One prompt for every provider; the required response shape matches
//! [`super::ProviderDiagnosis`] so the chain can validate uniformly.

use crate::analysis::{SymptomScan, VehicleContext};
use crate::knowledge::DtcAssessment;
use crate::types::TelemetryReport;

/// Build the diagnostic prompt from the analyzed request.
pub fn build_prompt(
    vehicle: &VehicleContext,
    dtc: &DtcAssessment,
    symptoms: &SymptomScan,
    telemetry: &TelemetryReport,
    free_text: &str,
) -> String {
    let mut prompt = format!(
        "You are an expert automotive mechanic.\n\n\
         ## VEHICLE\n\
         - make/model: {} {}\n\
         - age: {} years, mileage band: {:?}\n",
        vehicle.make, vehicle.model, vehicle.age_years, vehicle.mileage_band
    );

    if dtc.active_count > 0 {
        let codes: Vec<String> = dtc
            .decoded
            .iter()
            .map(|d| format!("{} ({})", d.code, d.description))
            .collect();
        prompt.push_str(&format!(
            "\n## ACTIVE TROUBLE CODES\n- {}\n- dominant pattern: {}\n",
            codes.join("\n- "),
            dtc.primary_pattern
        ));
    }

    if !telemetry.live_parameters.is_empty() {
        prompt.push_str("\n## LIVE READINGS\n");
        for (parameter, value) in &telemetry.live_parameters {
            prompt.push_str(&format!("- {parameter}: {value}\n"));
        }
    }
    for anomaly in &telemetry.anomalies {
        prompt.push_str(&format!(
            "- OUT OF RANGE: {} = {} ({})\n",
            anomaly.parameter, anomaly.value, anomaly.detail
        ));
    }

    if !free_text.trim().is_empty() {
        prompt.push_str(&format!(
            "\n## REPORTED SYMPTOMS\n{}\n(detected categories: {})\n",
            free_text.trim(),
            symptoms.count()
        ));
    }

    prompt.push_str(
        "\n## TASK\n\
         Identify the most probable mechanical issues. Respond with ONLY a \
         JSON object of this exact shape:\n\
         {\"issues\": [{\"component\": \"...\", \"description\": \"...\", \
         \"probability\": 0.0, \"estimated_labor_hours\": 0.0, \
         \"required_parts\": [\"...\"]}], \"confidence\": 0.0}\n\
         Probabilities and confidence must be between 0 and 1. \
         At most 5 issues.\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scan_symptoms;
    use crate::knowledge::{DtcKnowledgeBase, MarketClass, MileageBand};
    use crate::types::DiagnosticCodeRecord;

    #[test]
    fn test_prompt_includes_codes_and_symptoms() {
        let vehicle = VehicleContext {
            make: "volkswagen".to_string(),
            model: "golf".to_string(),
            engine_description: "1.4 TSI".to_string(),
            age_years: 11,
            mileage_band: MileageBand::Medium,
            market_class: MarketClass::Standard,
            known_issues: Vec::new(),
            reliability_score: 0.6,
        };
        let dtc = DtcKnowledgeBase::default().assess(&[DiagnosticCodeRecord {
            code: "P0300".to_string(),
            raw_value: 1.0,
        }]);
        let symptoms = scan_symptoms("tremura");
        let telemetry = TelemetryReport::default();

        let prompt = build_prompt(&vehicle, &dtc, &symptoms, &telemetry, "tremura");
        assert!(prompt.contains("P0300"));
        assert!(prompt.contains("volkswagen golf"));
        assert!(prompt.contains("tremura"));
        assert!(prompt.contains("\"confidence\""));
    }
}
