//! Static knowledge tables: DTC decode, vehicle known issues, repair costs
//!
//! All tables are read-only after process start; lookups are total and fall
//! back to generic/default entries for unknown keys.

pub mod costs;
pub mod dtc;
pub mod vehicles;

pub use dtc::{DtcAssessment, DtcInfo, DtcKnowledgeBase, DtcPattern};
pub use vehicles::{
    normalize_make, KnownIssueRecord, MarketClass, MileageBand, VehicleKnowledgeBase,
    DEFAULT_RELIABILITY,
};
