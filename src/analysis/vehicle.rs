//! Vehicle context resolver: derived facts plus known-issue lookup

use serde::{Deserialize, Serialize};

use crate::knowledge::{MarketClass, MileageBand, VehicleKnowledgeBase};
use crate::types::VehicleProfile;

/// Read-only context record consumed by the rule engine and cost estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleContext {
    pub make: String,
    pub model: String,
    pub engine_description: String,
    pub age_years: i32,
    pub mileage_band: MileageBand,
    pub market_class: MarketClass,
    pub known_issues: Vec<String>,
    pub reliability_score: f64,
}

impl VehicleContext {
    pub fn has_known_issues(&self) -> bool {
        !self.known_issues.is_empty()
    }
}

/// Resolve a vehicle profile into its derived context.
///
/// `current_year` is injected rather than read from the clock so the derived
/// age is reproducible in tests.
pub fn resolve(
    profile: &VehicleProfile,
    kb: &VehicleKnowledgeBase,
    current_year: i32,
) -> VehicleContext {
    let record = kb.lookup(&profile.make, &profile.model);
    VehicleContext {
        make: record.make,
        model: record.model,
        engine_description: profile.engine_description.clone(),
        age_years: (current_year - profile.model_year).max(0),
        mileage_band: MileageBand::from_odometer_km(profile.odometer_km),
        market_class: MarketClass::from_make(&profile.make),
        known_issues: record.known_issues,
        reliability_score: record.reliability_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golf() -> VehicleProfile {
        VehicleProfile {
            make: "VW".to_string(),
            model: "Golf".to_string(),
            model_year: 2015,
            engine_description: "1.4 TSI".to_string(),
            odometer_km: 140_000,
            vin: None,
        }
    }

    #[test]
    fn test_derived_facts() {
        let ctx = resolve(&golf(), &VehicleKnowledgeBase, 2026);
        assert_eq!(ctx.age_years, 11);
        assert_eq!(ctx.mileage_band, MileageBand::Medium);
        assert_eq!(ctx.market_class, MarketClass::Standard);
        assert!(ctx.has_known_issues());
    }

    #[test]
    fn test_future_model_year_clamps_age_to_zero() {
        let mut profile = golf();
        profile.model_year = 2026;
        let ctx = resolve(&profile, &VehicleKnowledgeBase, 2025);
        assert_eq!(ctx.age_years, 0);
    }

    #[test]
    fn test_unknown_vehicle_is_standard_defaults() {
        let profile = VehicleProfile::default();
        let ctx = resolve(&profile, &VehicleKnowledgeBase, 2026);
        assert!(!ctx.has_known_issues());
        assert_eq!(ctx.market_class, MarketClass::Standard);
    }
}
