//! Repair-cost reference table and currency conversion constants

/// One component-category cost entry. Amounts are parts + shop averages for
/// a standard-tier vehicle, in RON.
#[derive(Debug, Clone, Copy)]
pub struct CostEntry {
    pub category: &'static str,
    pub base_ron: f64,
    pub labor_hours: f64,
}

/// Component-category cost table matched by substring against the issue's
/// component field.
pub const COST_TABLE: &[CostEntry] = &[
    CostEntry { category: "ignition system", base_ron: 1200.0, labor_hours: 2.5 },
    CostEntry { category: "fuel system", base_ron: 1800.0, labor_hours: 3.5 },
    CostEntry { category: "turbocharger", base_ron: 4500.0, labor_hours: 6.0 },
    CostEntry { category: "oxygen sensor", base_ron: 900.0, labor_hours: 1.5 },
    CostEntry { category: "transmission", base_ron: 5200.0, labor_hours: 8.0 },
    CostEntry { category: "cooling system", base_ron: 1500.0, labor_hours: 3.0 },
    CostEntry { category: "battery and charging system", base_ron: 800.0, labor_hours: 1.0 },
    CostEntry { category: "engine internals", base_ron: 6000.0, labor_hours: 10.0 },
    CostEntry { category: "exhaust and emissions", base_ron: 2200.0, labor_hours: 2.0 },
];

/// Flat charge applied when no surfaced issue matches any table entry.
pub const GENERIC_DIAGNOSTIC: CostEntry = CostEntry {
    category: "general diagnostic",
    base_ron: 250.0,
    labor_hours: 1.0,
};

/// Brand cost multipliers by market class.
pub const PREMIUM_MULTIPLIER: f64 = 1.4;
pub const ECONOMY_MULTIPLIER: f64 = 0.85;
pub const STANDARD_MULTIPLIER: f64 = 1.0;

/// Discount applied when the vehicle is older than [`AGE_DISCOUNT_YEARS`]
/// (older vehicles take cheaper aftermarket parts).
pub const AGE_DISCOUNT: f64 = 0.8;
pub const AGE_DISCOUNT_YEARS: i32 = 10;

/// Fixed exchange rates, RON base. Static by design and therefore stale the
/// day they ship; a deployment that needs live rates must inject them at
/// the config layer.
pub const EXCHANGE_RATES: &[(&str, f64)] = &[("RON", 1.0), ("EUR", 0.201), ("USD", 0.215)];
