//! Leaf analyzers for the diagnostic pipeline
//!
//! The three analyzers are independent of one another and side-effect free;
//! each consumes one slice of the request and produces a read-only report
//! for the rule engine:
//!
//! - **telemetry**: band checks against the per-parameter rule table
//! - **symptoms**: keyword-category matching over free text
//! - **vehicle**: derived facts + known-issue lookup

pub mod symptoms;
pub mod telemetry;
pub mod vehicle;

pub use symptoms::{scan as scan_symptoms, SymptomCategory, SymptomIntensity, SymptomScan};
pub use telemetry::analyze as analyze_telemetry;
pub use vehicle::{resolve as resolve_vehicle, VehicleContext};
