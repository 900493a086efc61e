//! REPARA: Vehicle Diagnostic Fusion Engine
//!
//! Fuses heterogeneous vehicle-health signals — live sensor telemetry,
//! stored trouble codes, free-text symptom reports, and vehicle metadata —
//! into a ranked, costed, urgency-classified diagnosis.
//!
//! ## Architecture
//!
//! - **Analysis**: independent leaf analyzers (telemetry bands, symptom
//!   keywords, vehicle context)
//! - **Knowledge**: static DTC / known-issue / cost tables, total lookups
//! - **Engine**: ordered rule table → fusion/confidence → severity/urgency
//!   → cost estimate
//! - **Providers**: optional external AI enrichment behind a fallback chain
//! - **OBD module**: seedable OBD2 Bluetooth simulator
//! - **API**: axum REST + WebSocket surface

pub mod analysis;
pub mod api;
pub mod config;
pub mod engine;
pub mod knowledge;
pub mod obd;
pub mod providers;
pub mod store;
pub mod types;

// Re-export the assembled pipeline
pub use engine::{DiagnosticEngine, RuleEngine};

// Re-export commonly used types
pub use types::{
    DiagnosisRecord, DiagnosticRequest, FusedDiagnosis, Issue, IssueSource, Severity,
    TelemetryFrame, Urgency, VehicleProfile,
};

// Re-export the store interface
pub use store::{DiagnosisStore, InMemoryDiagnosisStore};

// Re-export provider capability surface
pub use providers::{ModelProvider, ProviderChain};
