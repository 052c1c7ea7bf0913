use serde::{Deserialize, Serialize};
use surety_common::{error::Result, Address};
use tracing::info;

use super::registry::MembershipRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    /// Below this many registered participants a single funded member admits.
    pub bootstrap_threshold: usize,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self { bootstrap_threshold: 4 }
    }
}

/// Result of one admission call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Admitted by a single funded member while the registry was small.
    Bootstrapped,
    /// Admitted by a strict majority of registered members.
    Elected { votes: usize, required: usize },
    /// Vote recorded, majority not reached yet.
    Pending { votes: usize, required: usize },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Admission::Pending { .. })
    }
}

/// Componente responsável por admitir candidatos com base em votos e maioria.
#[derive(Debug, Clone)]
pub struct ConsensusVoter {
    pub policy: AdmissionPolicy,
}

impl ConsensusVoter {
    pub fn new(policy: AdmissionPolicy) -> Self {
        Self { policy }
    }

    /// Strict majority of `n` registered participants.
    pub fn required_votes(n: usize) -> usize {
        n / 2 + 1
    }

    /// Runs one admission call of `caller` for `candidate`.
    ///
    /// Fails without touching the registry when the caller is not a funded
    /// member or the candidate is already registered.
    pub fn register_candidate(
        &self,
        registry: &mut MembershipRegistry,
        candidate: &Address,
        caller: &Address,
    ) -> Result<Admission> {
        registry.check_candidate(candidate, caller)?;

        let n = registry.count();
        if n < self.policy.bootstrap_threshold {
            registry.promote(candidate);
            info!("✈️ Candidate [{}] admitted by [{}] (bootstrap, {} members)", candidate, caller, n);
            return Ok(Admission::Bootstrapped);
        }

        let required = Self::required_votes(n);
        let votes = registry.record_vote(candidate, caller);

        if votes >= required {
            registry.promote(candidate);
            info!(
                "🗳️ Candidate [{}]: {}/{} votes ✅ ADMITTED",
                candidate, votes, required
            );
            Ok(Admission::Elected { votes, required })
        } else {
            info!(
                "🗳️ Candidate [{}]: {}/{} votes (last from [{}])",
                candidate, votes, required, caller
            );
            Ok(Admission::Pending { votes, required })
        }
    }
}
