//! Telemetry frame and anomaly types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped sensor reading from the vehicle.
///
/// A request carries an ordered sequence of frames; analysis results are
/// independent of arrival order. Frames whose `parameter_id` uses the
/// `dtc_` prefix convention carry diagnostic trouble codes instead of live
/// parameters (see [`DiagnosticCodeRecord`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Parameter identifier (e.g. "rpm", "engine_temp", "dtc_p0300")
    pub parameter_id: String,
    /// Measured value
    pub value: f64,
    /// Unit of measure (e.g. "rpm", "celsius", "percent")
    #[serde(default)]
    pub unit: String,
    /// Time the reading was observed
    #[serde(default = "Utc::now")]
    pub observed_at: DateTime<Utc>,
}

/// Parameter-id prefix that marks a frame as a DTC-style reading.
pub const DTC_PARAMETER_PREFIX: &str = "dtc_";

/// A diagnostic trouble code extracted from the request.
///
/// `raw_value > 0` means the code is currently active. Multiple records may
/// reference the same code; all are retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticCodeRecord {
    /// Normalized code, format `[A-Z]\d{4}` uppercase (e.g. "P0300")
    pub code: String,
    /// Raw sensor value; >0 means active
    pub raw_value: f64,
}

impl DiagnosticCodeRecord {
    /// Whether this code is currently active.
    pub fn is_active(&self) -> bool {
        self.raw_value > 0.0
    }
}

/// Severity of a single out-of-range telemetry reading.
///
/// MEDIUM = outside the normal band but inside the critical band.
/// HIGH = outside the critical band (also raises a [`CriticalFlag`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnomalySeverity {
    Medium = 0,
    High = 1,
}

impl std::fmt::Display for AnomalySeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalySeverity::Medium => write!(f, "MEDIUM"),
            AnomalySeverity::High => write!(f, "HIGH"),
        }
    }
}

/// One out-of-range live parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryAnomaly {
    /// Parameter that breached its band (e.g. "engine_temp")
    pub parameter: String,
    /// Measured value
    pub value: f64,
    /// Band breached: MEDIUM (normal) or HIGH (critical)
    pub severity: AnomalySeverity,
    /// Human-readable bound description (e.g. "above normal max 105")
    pub detail: String,
}

/// A live parameter that breached its critical band.
///
/// Carried verbatim into the urgency classifier: any active flag forces
/// CRITICAL urgency regardless of rule-engine severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticalFlag {
    pub parameter: String,
    pub value: f64,
}

/// Output of the telemetry analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryReport {
    /// Live parameter table, last writer wins on duplicate ids
    pub live_parameters: std::collections::BTreeMap<String, f64>,
    /// Active DTC records extracted from `dtc_`-prefixed frames
    pub active_codes: Vec<DiagnosticCodeRecord>,
    /// Out-of-range readings, in rule-table order
    pub anomalies: Vec<TelemetryAnomaly>,
    /// Critical-band breaches, used verbatim for urgency escalation
    pub critical_flags: Vec<CriticalFlag>,
}

impl TelemetryReport {
    /// Whether any parameter breached its critical band.
    pub fn has_critical(&self) -> bool {
        !self.critical_flags.is_empty()
    }
}
