use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use surety_common::{
    error::{Result, SuretyError},
    Address, Amount,
};

/// Estado de um participante (companhia aérea) no registro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub address: Address,
    pub is_registered: bool,
    /// Set once by funding, never reset.
    pub is_funded: bool,
}

impl Participant {
    fn pending(address: Address) -> Self {
        Self {
            address,
            is_registered: false,
            is_funded: false,
        }
    }
}

/// Armazena os participantes e os votos de cada candidato.
#[derive(Debug, Default, Clone)]
pub struct MembershipRegistry {
    participants: HashMap<Address, Participant>,

    // Candidate -> distinct voters. Dropped on promotion.
    votes: HashMap<Address, HashSet<Address>>,

    registered: usize,
}

impl MembershipRegistry {
    /// Cria um novo registro vazio.
    pub fn new() -> Self {
        Self {
            participants: HashMap::new(),
            votes: HashMap::new(),
            registered: 0,
        }
    }

    /// Admits the bootstrap participant without a vote. Does nothing if it is
    /// already registered.
    pub fn bootstrap(&mut self, address: Address) {
        if !self.is_registered(&address) {
            self.promote(&address);
        }
    }

    /// Fails unless `caller` may vote for `candidate`.
    ///
    /// The caller must be registered and funded; the candidate must not be
    /// registered yet.
    pub fn check_candidate(&self, candidate: &Address, caller: &Address) -> Result<()> {
        if !self.is_funded_member(caller) {
            return Err(SuretyError::NotFunded(caller.clone()));
        }
        if self.is_registered(candidate) {
            return Err(SuretyError::AlreadyRegistered(candidate.clone()));
        }
        Ok(())
    }

    /// Marks `participant` funded. Funding an address that is not registered
    /// yet creates its pending record.
    ///
    /// Returns `true` if the flag changed.
    pub fn mark_funded(&mut self, participant: &Address, amount: Amount, min_funding: Amount) -> Result<bool> {
        if amount < min_funding {
            return Err(SuretyError::InsufficientFunding {
                required: min_funding,
                provided: amount,
            });
        }

        let record = self
            .participants
            .entry(participant.clone())
            .or_insert_with(|| Participant::pending(participant.clone()));

        let changed = !record.is_funded;
        record.is_funded = true;
        Ok(changed)
    }

    /// Registra o voto de `voter` para `candidate` e retorna o total de votos distintos.
    pub fn record_vote(&mut self, candidate: &Address, voter: &Address) -> usize {
        let voters = self.votes.entry(candidate.clone()).or_default();
        voters.insert(voter.clone());
        voters.len()
    }

    /// Registers `candidate` and discards its vote record.
    ///
    /// An existing funded flag survives promotion: funding is never reset,
    /// so an airline that funded while pending is admitted already funded.
    /// Airlines that never funded are admitted unfunded.
    pub fn promote(&mut self, candidate: &Address) {
        self.votes.remove(candidate);

        let record = self
            .participants
            .entry(candidate.clone())
            .or_insert_with(|| Participant::pending(candidate.clone()));

        if !record.is_registered {
            record.is_registered = true;
            self.registered += 1;
        }
    }

    pub fn is_registered(&self, id: &Address) -> bool {
        self.participants.get(id).map(|p| p.is_registered).unwrap_or(false)
    }

    pub fn is_funded(&self, id: &Address) -> bool {
        self.participants.get(id).map(|p| p.is_funded).unwrap_or(false)
    }

    /// Registered and funded: the only participants allowed to vote.
    pub fn is_funded_member(&self, id: &Address) -> bool {
        self.participants
            .get(id)
            .map(|p| p.is_registered && p.is_funded)
            .unwrap_or(false)
    }

    /// Number of registered participants.
    pub fn count(&self) -> usize {
        self.registered
    }

    pub fn participant(&self, id: &Address) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Retorna a quantidade de votos distintos de um candidato.
    pub fn votes_for(&self, candidate: &Address) -> usize {
        self.votes.get(candidate).map(|v| v.len()).unwrap_or(0)
    }

    pub fn voters(&self, candidate: &Address) -> Option<&HashSet<Address>> {
        self.votes.get(candidate)
    }
}
