//! Repair-cost estimation
//!
//! Matches the top fused issues against the static component-category cost
//! table, then applies brand-tier and age adjustments and converts the RON
//! totals into the supported currencies.

use std::collections::BTreeMap;

use tracing::debug;

use crate::analysis::VehicleContext;
use crate::knowledge::costs::{
    CostEntry, AGE_DISCOUNT, AGE_DISCOUNT_YEARS, COST_TABLE, ECONOMY_MULTIPLIER, EXCHANGE_RATES,
    GENERIC_DIAGNOSTIC, PREMIUM_MULTIPLIER, STANDARD_MULTIPLIER,
};
use crate::knowledge::MarketClass;
use crate::types::{CostEstimate, CostItem, Issue};

/// How many of the fused issues contribute to the estimate.
const COSTED_ISSUES: usize = 3;

/// Find the best cost-table match for an issue component: the longest
/// category that substring-matches in either direction.
fn best_match(component: &str) -> Option<&'static CostEntry> {
    let needle = component.to_lowercase();
    COST_TABLE
        .iter()
        .filter(|entry| needle.contains(entry.category) || entry.category.contains(needle.as_str()))
        .max_by_key(|entry| entry.category.len())
}

fn brand_multiplier(class: MarketClass) -> f64 {
    match class {
        MarketClass::Premium => PREMIUM_MULTIPLIER,
        MarketClass::Economy => ECONOMY_MULTIPLIER,
        MarketClass::Standard => STANDARD_MULTIPLIER,
    }
}

/// Estimate repair cost for the top fused issues.
pub fn estimate(issues: &[Issue], vehicle: &VehicleContext) -> CostEstimate {
    let multiplier = {
        let brand = brand_multiplier(vehicle.market_class);
        if vehicle.age_years > AGE_DISCOUNT_YEARS {
            brand * AGE_DISCOUNT
        } else {
            brand
        }
    };

    let mut itemized = Vec::new();
    let mut total_ron = 0.0;
    let mut total_labor_hours = 0.0;

    for issue in issues.iter().take(COSTED_ISSUES) {
        let Some(entry) = best_match(&issue.component) else {
            continue;
        };
        let amount = entry.base_ron * multiplier;
        itemized.push(CostItem {
            category: entry.category.to_string(),
            component: issue.component.clone(),
            amount_ron: amount,
            labor_hours: entry.labor_hours,
        });
        total_ron += amount;
        total_labor_hours += entry.labor_hours;
    }

    // Nothing matched the table: charge the flat diagnostic fee instead of
    // returning an empty estimate.
    if itemized.is_empty() {
        let amount = GENERIC_DIAGNOSTIC.base_ron * multiplier;
        itemized.push(CostItem {
            category: GENERIC_DIAGNOSTIC.category.to_string(),
            component: GENERIC_DIAGNOSTIC.category.to_string(),
            amount_ron: amount,
            labor_hours: GENERIC_DIAGNOSTIC.labor_hours,
        });
        total_ron = amount;
        total_labor_hours = GENERIC_DIAGNOSTIC.labor_hours;
    }

    let totals: BTreeMap<String, f64> = EXCHANGE_RATES
        .iter()
        .map(|(currency, rate)| ((*currency).to_string(), round2(total_ron * rate)))
        .collect();

    debug!(
        items = itemized.len(),
        total_ron = total_ron,
        multiplier = multiplier,
        "cost estimate computed"
    );

    CostEstimate {
        totals,
        total_labor_hours,
        itemized,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
