use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use surety_common::{
    error::{Result, SuretyError},
    Address, Amount, SubjectKey,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    /// Bought, waiting for the flight status.
    Active,
    /// Paid out.
    Credited,
    /// Flight finalized with a status that does not pay.
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub passenger: Address,
    pub key: SubjectKey,
    pub premium: Amount,
    pub status: PolicyStatus,
}

/// Policies per subject key, one per passenger.
///
/// Passengers are kept in a `BTreeMap` so settlement walks them in a stable
/// order and emitted credit events are reproducible.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PolicyBook {
    policies: HashMap<SubjectKey, BTreeMap<Address, InsurancePolicy>>,
}

impl PolicyBook {
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// Checks a purchase without recording it.
    pub fn check_purchase(&self, passenger: &Address, key: &SubjectKey, premium: Amount, max_premium: Amount) -> Result<()> {
        if premium == 0 || premium > max_premium {
            return Err(SuretyError::InvalidPremium { premium, max: max_premium });
        }
        if self.policy(passenger, key).is_some() {
            return Err(SuretyError::AlreadyInsured {
                passenger: passenger.clone(),
                key: key.clone(),
            });
        }
        Ok(())
    }

    /// Records a new active policy.
    pub fn buy(&mut self, passenger: Address, key: SubjectKey, premium: Amount, max_premium: Amount) -> Result<&InsurancePolicy> {
        self.check_purchase(&passenger, &key, premium, max_premium)?;

        let policy = InsurancePolicy {
            passenger: passenger.clone(),
            key: key.clone(),
            premium,
            status: PolicyStatus::Active,
        };
        Ok(self.policies.entry(key).or_default().entry(passenger).or_insert(policy))
    }

    pub fn policy(&self, passenger: &Address, key: &SubjectKey) -> Option<&InsurancePolicy> {
        self.policies.get(key).and_then(|by_passenger| by_passenger.get(passenger))
    }

    /// Active policies on `key`, ordered by passenger.
    pub fn active_for(&self, key: &SubjectKey) -> Vec<InsurancePolicy> {
        self.policies
            .get(key)
            .map(|by_passenger| {
                by_passenger
                    .values()
                    .filter(|p| p.status == PolicyStatus::Active)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_status(&mut self, passenger: &Address, key: &SubjectKey, status: PolicyStatus) {
        if let Some(policy) = self.policies.get_mut(key).and_then(|m| m.get_mut(passenger)) {
            policy.status = status;
        }
    }

    /// Number of policies ever bought against `key`.
    pub fn count_for(&self, key: &SubjectKey) -> usize {
        self.policies.get(key).map(|m| m.len()).unwrap_or(0)
    }
}
