//! Vehicle knowledge base: make/model known issues, reliability, brand tiers

use serde::{Deserialize, Serialize};

/// Odometer band derived from fixed thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MileageBand {
    Low,
    Medium,
    High,
}

impl MileageBand {
    /// Band thresholds: low < 100,000 km ≤ medium < 200,000 km ≤ high.
    pub fn from_odometer_km(odometer_km: u64) -> Self {
        if odometer_km < 100_000 {
            MileageBand::Low
        } else if odometer_km < 200_000 {
            MileageBand::Medium
        } else {
            MileageBand::High
        }
    }
}

/// Market positioning of the brand, from static tier lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarketClass {
    Premium,
    Standard,
    Economy,
}

const PREMIUM_BRANDS: &[&str] = &["bmw", "mercedes", "audi", "porsche", "tesla", "lexus"];
const ECONOMY_BRANDS: &[&str] = &["dacia", "skoda", "renault", "fiat", "opel"];

impl MarketClass {
    pub fn from_make(make: &str) -> Self {
        let normalized = normalize_make(make);
        if PREMIUM_BRANDS.contains(&normalized.as_str()) {
            MarketClass::Premium
        } else if ECONOMY_BRANDS.contains(&normalized.as_str()) {
            MarketClass::Economy
        } else {
            MarketClass::Standard
        }
    }
}

/// Known recurring issues and a reliability score for one make/model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownIssueRecord {
    pub make: String,
    pub model: String,
    pub known_issues: Vec<String>,
    /// 0.0 (troublesome) to 1.0 (dependable)
    pub reliability_score: f64,
}

/// Reliability assumed for vehicles absent from the table.
pub const DEFAULT_RELIABILITY: f64 = 0.5;

/// Collapse common brand aliases so lookups and tier checks agree
/// ("VW" and "Volkswagen" are the same table row).
pub fn normalize_make(make: &str) -> String {
    let lower = make.trim().to_lowercase();
    match lower.as_str() {
        "vw" => "volkswagen".to_string(),
        "mercedes-benz" => "mercedes".to_string(),
        _ => lower,
    }
}

/// Static make/model → known issues + reliability table.
#[derive(Debug, Clone, Default)]
pub struct VehicleKnowledgeBase;

/// (make, model, known issues, reliability)
const KNOWN_ISSUES: &[(&str, &str, &[&str], f64)] = &[
    (
        "volkswagen",
        "golf",
        &[
            "timing chain tensioner wear",
            "carbon buildup on intake valves",
            "injector fouling",
            "water pump failure",
        ],
        0.62,
    ),
    (
        "volkswagen",
        "passat",
        &["dual mass flywheel wear", "injector fouling", "dsg mechatronic faults"],
        0.60,
    ),
    (
        "skoda",
        "octavia",
        &["timing chain tensioner wear", "dsg mechatronic faults", "injector fouling"],
        0.63,
    ),
    (
        "dacia",
        "logan",
        &["front suspension bushing wear", "ignition coil failure"],
        0.68,
    ),
    (
        "renault",
        "clio",
        &["ignition coil failure", "window regulator failure"],
        0.64,
    ),
    (
        "bmw",
        "320d",
        &["timing chain stretch", "swirl flap failure", "turbo actuator seizure"],
        0.55,
    ),
    (
        "audi",
        "a4",
        &["oil consumption", "timing chain tensioner wear", "water pump failure"],
        0.58,
    ),
    (
        "mercedes",
        "c-class",
        &["balance shaft wear", "injector seal leaks"],
        0.60,
    ),
    (
        "opel",
        "astra",
        &["crankshaft sensor failure", "egr valve clogging"],
        0.61,
    ),
    (
        "ford",
        "focus",
        &["clutch slave cylinder leak", "ignition coil failure"],
        0.65,
    ),
    ("toyota", "corolla", &["water pump whine"], 0.88),
];

impl VehicleKnowledgeBase {
    /// Look up known issues for a make/model. Absent rows yield an empty
    /// record with the default reliability — never an error.
    pub fn lookup(&self, make: &str, model: &str) -> KnownIssueRecord {
        let norm_make = normalize_make(make);
        let norm_model = model.trim().to_lowercase();

        for (m, mo, issues, reliability) in KNOWN_ISSUES {
            if *m == norm_make && *mo == norm_model {
                return KnownIssueRecord {
                    make: norm_make,
                    model: norm_model,
                    known_issues: issues.iter().map(|s| (*s).to_string()).collect(),
                    reliability_score: *reliability,
                };
            }
        }

        KnownIssueRecord {
            make: norm_make,
            model: norm_model,
            known_issues: Vec::new(),
            reliability_score: DEFAULT_RELIABILITY,
        }
    }
}
