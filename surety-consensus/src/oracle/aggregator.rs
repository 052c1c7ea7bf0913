use std::collections::{hash_map::Entry, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use surety_common::{
    error::{Result, SuretyError},
    Address, IndexValue, StatusCode, SubjectKey,
};
use tracing::{debug, info};

use super::{assigner::OracleIndexAssigner, correlator::RequestCorrelator};

/// Write-once resolved status of a subject key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedFact {
    pub key: SubjectKey,
    pub status: StatusCode,
    /// Index of the request whose bucket reached quorum.
    pub index: IndexValue,
    /// Oracles in the bucket at the moment of finalization, sorted.
    pub respondents: Vec<Address>,
}

/// What a recorded response did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Counted; `votes` distinct oracles now back this value.
    Recorded { votes: usize },
    /// This response completed the quorum and finalized the key.
    Finalized(FinalizedFact),
    /// The key was already final. The response was kept for audit only.
    AlreadyFinalized { status: StatusCode },
}

type BucketKey = (SubjectKey, IndexValue, StatusCode);

/// Buckets oracle responses and finalizes the first value to reach quorum.
#[derive(Debug, Clone)]
pub struct ResponseAggregator {
    quorum: usize,
    buckets: HashMap<BucketKey, HashSet<Address>>,
    finalized: HashMap<SubjectKey, FinalizedFact>,
}

impl ResponseAggregator {
    pub fn new(quorum: usize) -> Self {
        Self {
            quorum,
            buckets: HashMap::new(),
            finalized: HashMap::new(),
        }
    }

    /// Validates and records one oracle response.
    ///
    /// Checks, in order: the oracle is registered, it holds `index`, and a
    /// request is open for `(key, index)`. Nothing is written when a check
    /// fails.
    pub fn submit_response(
        &mut self,
        assigner: &OracleIndexAssigner,
        correlator: &RequestCorrelator,
        oracle: &Address,
        key: &SubjectKey,
        index: IndexValue,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        assigner.check_holds(oracle, index)?;

        if !correlator.is_open(key, index) {
            return Err(SuretyError::NoOpenRequest {
                key: key.clone(),
                index,
            });
        }

        let respondents = self.buckets.entry((key.clone(), index, status)).or_default();
        respondents.insert(oracle.clone());
        let votes = respondents.len();

        if let Some(fact) = self.finalized.get(key) {
            debug!("Late response from [{}] for {} ({}), already final as {}", oracle, key, status, fact.status);
            return Ok(ResponseOutcome::AlreadyFinalized { status: fact.status });
        }

        if votes < self.quorum {
            debug!("📥 [{}] reported {} for {} at index {} ({}/{})", oracle, status, key, index, votes, self.quorum);
            return Ok(ResponseOutcome::Recorded { votes });
        }

        let mut backers: Vec<Address> = respondents.iter().cloned().collect();
        backers.sort();

        match self.finalized.entry(key.clone()) {
            Entry::Vacant(slot) => {
                let fact = FinalizedFact {
                    key: key.clone(),
                    status,
                    index,
                    respondents: backers,
                };
                slot.insert(fact.clone());
                info!("🏁 {} finalized as {} by {} oracles", key, status, votes);
                Ok(ResponseOutcome::Finalized(fact))
            }
            Entry::Occupied(existing) => Ok(ResponseOutcome::AlreadyFinalized {
                status: existing.get().status,
            }),
        }
    }

    pub fn finalized(&self, key: &SubjectKey) -> Option<&FinalizedFact> {
        self.finalized.get(key)
    }

    pub fn is_finalized(&self, key: &SubjectKey) -> bool {
        self.finalized.contains_key(key)
    }

    /// Distinct oracles that reported `status` for `(key, index)`.
    pub fn respondents(&self, key: &SubjectKey, index: IndexValue, status: StatusCode) -> usize {
        self.buckets
            .get(&(key.clone(), index, status))
            .map(|s| s.len())
            .unwrap_or(0)
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }
}
