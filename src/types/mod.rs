//! Shared data model for the diagnostic pipeline

mod diagnosis;
mod request;
mod telemetry;

pub use diagnosis::{
    CostEstimate, CostItem, DiagnosisRecord, FusedDiagnosis, Issue, IssueSource, RepairComplexity,
    RuleMatch, Severity, Urgency, MAX_RANKED_ISSUES,
};
pub use request::{dtc_code_regex, DiagnosticRequest, SymptomReport, VehicleProfile};
pub use telemetry::{
    AnomalySeverity, CriticalFlag, DiagnosticCodeRecord, TelemetryAnomaly, TelemetryFrame,
    TelemetryReport, DTC_PARAMETER_PREFIX,
};
