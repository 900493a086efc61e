//! Diagnosis result store
//!
//! The service owns an injected store rather than a process-global map, so
//! the cache lifecycle is explicit and swappable in tests.

use dashmap::DashMap;

use crate::types::DiagnosisRecord;

/// Store interface for finished diagnoses: insert-only writes plus
/// read-by-id. No update-in-place.
pub trait DiagnosisStore: Send + Sync {
    fn put(&self, record: DiagnosisRecord);
    fn get(&self, diagnosis_id: &str) -> Option<DiagnosisRecord>;
    fn count(&self) -> usize;
}

/// Process-lifetime in-memory store.
///
/// KNOWN DEFECT: there is no eviction policy, so memory grows without bound
/// under sustained load. Deliberate for now — records are small and the
/// process is restarted with each deployment — but a real fix needs an LRU
/// or TTL bound here, not at the call sites.
#[derive(Debug, Default)]
pub struct InMemoryDiagnosisStore {
    records: DashMap<String, DiagnosisRecord>,
}

impl InMemoryDiagnosisStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosisStore for InMemoryDiagnosisStore {
    fn put(&self, record: DiagnosisRecord) {
        self.records.insert(record.diagnosis_id.clone(), record);
    }

    fn get(&self, diagnosis_id: &str) -> Option<DiagnosisRecord> {
        self.records.get(diagnosis_id).map(|r| r.value().clone())
    }

    fn count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CostEstimate, FusedDiagnosis, Severity, Urgency};

    fn record(id: &str) -> DiagnosisRecord {
        DiagnosisRecord {
            diagnosis_id: id.to_string(),
            session_id: None,
            diagnosis: FusedDiagnosis {
                ranked_issues: Vec::new(),
                overall_confidence: 0.1,
                severity: Severity::Low,
                urgency: Urgency::Low,
                cost_estimate: CostEstimate::default(),
                recommendations: Vec::new(),
            },
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_put_then_get_round_trip() {
        let store = InMemoryDiagnosisStore::new();
        store.put(record("abc"));
        assert!(store.get("abc").is_some());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_get_unknown_id_is_none() {
        let store = InMemoryDiagnosisStore::new();
        assert!(store.get("missing").is_none());
    }
}
