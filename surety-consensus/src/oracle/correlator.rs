use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use surety_common::{Address, IndexValue, LogicalTime, SubjectKey};
use tracing::{debug, info};

use super::assigner::IndexSource;

/// One request for oracles to report the status of `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRequest {
    pub key: SubjectKey,
    /// Only oracles holding this index may answer.
    pub index: IndexValue,
    pub requester: Address,
    pub opened_at: LogicalTime,
}

/// Tracks open status requests by `(key, index)`.
///
/// Requests are never closed: once a key is finalized late answers are
/// still matched and recorded by the aggregator.
#[derive(Debug, Default, Clone)]
pub struct RequestCorrelator {
    requests: HashMap<(SubjectKey, IndexValue), StatusRequest>,
    opened: usize,
}

impl RequestCorrelator {
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            opened: 0,
        }
    }

    /// Opens a request for `key` at an index drawn from `source`.
    ///
    /// Opening the same key again draws a new index and is tracked on its
    /// own. If the draw hits an index already open for the key, the earlier
    /// request keeps its slot and the returned request is the one to
    /// broadcast again.
    pub fn open_request(
        &mut self,
        key: SubjectKey,
        requester: Address,
        now: LogicalTime,
        index_range: IndexValue,
        source: &mut dyn IndexSource,
    ) -> StatusRequest {
        let index = source.next_index(index_range, &requester);
        self.opened += 1;

        let slot = (key.clone(), index);
        if let Some(existing) = self.requests.get(&slot) {
            debug!("Request for {} at index {} already open since {}", key, index, existing.opened_at);
            return existing.clone();
        }

        let request = StatusRequest {
            key,
            index,
            requester,
            opened_at: now,
        };
        info!("📡 Status request for {} opened at index {} ({})", request.key, index, now);
        self.requests.insert(slot, request.clone());
        request
    }

    pub fn is_open(&self, key: &SubjectKey, index: IndexValue) -> bool {
        self.requests.contains_key(&(key.clone(), index))
    }

    /// Open requests for `key`, oldest first.
    pub fn requests_for(&self, key: &SubjectKey) -> Vec<&StatusRequest> {
        let mut out: Vec<&StatusRequest> = self.requests.values().filter(|r| &r.key == key).collect();
        out.sort_by_key(|r| (r.opened_at, r.index));
        out
    }

    /// Number of `open_request` calls, including ones that reused a slot.
    pub fn opened(&self) -> usize {
        self.opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::assigner::ScriptedIndexSource;

    fn key() -> SubjectKey {
        SubjectKey::new("airline-1", "XT312", 1_601_737_200_000)
    }

    #[test]
    fn test_open_request_uses_source() {
        let mut correlator = RequestCorrelator::new();
        let mut source = ScriptedIndexSource::new([4]);

        let req = correlator.open_request(key(), Address::from("passenger"), LogicalTime(1), 10, &mut source);

        assert_eq!(req.index, 4);
        assert!(correlator.is_open(&key(), 4));
        assert!(!correlator.is_open(&key(), 5));
    }

    #[test]
    fn test_multiple_opens_tracked_independently() {
        let mut correlator = RequestCorrelator::new();
        let mut source = ScriptedIndexSource::new([4, 7, 4]);
        let requester = Address::from("passenger");

        let first = correlator.open_request(key(), requester.clone(), LogicalTime(1), 10, &mut source);
        correlator.open_request(key(), requester.clone(), LogicalTime(2), 10, &mut source);
        let again = correlator.open_request(key(), requester, LogicalTime(3), 10, &mut source);

        assert!(correlator.is_open(&key(), 4));
        assert!(correlator.is_open(&key(), 7));
        assert_eq!(again, first);
        assert_eq!(correlator.opened(), 3);

        let indices: Vec<IndexValue> = correlator.requests_for(&key()).iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![4, 7]);
    }
}
