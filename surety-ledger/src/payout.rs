use std::collections::HashSet;

use surety_common::{PayoutMultiplier, StatusCode, SubjectKey};
use tracing::{debug, info};

use crate::{
    credit::{CreditEntry, CreditLedger},
    policy::{PolicyBook, PolicyStatus},
};

/// Settles the policies of a subject key once its status is final.
///
/// Settlement happens at most once per key. A second call for a settled key
/// returns no credits; the write-once `CreditLedger` backs this up per
/// passenger.
#[derive(Debug, Clone)]
pub struct PayoutTrigger {
    multiplier: PayoutMultiplier,
    payout_status: StatusCode,
    settled: HashSet<SubjectKey>,
}

impl PayoutTrigger {
    pub fn new(multiplier: PayoutMultiplier, payout_status: StatusCode) -> Self {
        Self {
            multiplier,
            payout_status,
            settled: HashSet::new(),
        }
    }

    pub fn is_settled(&self, key: &SubjectKey) -> bool {
        self.settled.contains(key)
    }

    pub fn payout_status(&self) -> StatusCode {
        self.payout_status
    }

    /// Applies the finalized `status` of `key` to the policies on it.
    ///
    /// When `status` is the payout status, every active policy is credited
    /// `premium * multiplier`. Any other status expires the active policies.
    /// Returns the credit entries created by this call.
    pub fn fire(
        &mut self,
        key: &SubjectKey,
        status: StatusCode,
        book: &mut PolicyBook,
        ledger: &mut CreditLedger,
    ) -> Vec<CreditEntry> {
        if !self.settled.insert(key.clone()) {
            debug!("Payout for {} already settled, skipping", key);
            return Vec::new();
        }

        let active = book.active_for(key);

        if status != self.payout_status {
            for policy in &active {
                book.set_status(&policy.passenger, key, PolicyStatus::Expired);
            }
            info!("🛬 {} finalized as {}: {} policies expired without payout", key, status, active.len());
            return Vec::new();
        }

        let mut credited = Vec::with_capacity(active.len());
        for policy in active {
            let amount = self.multiplier.apply(policy.premium);
            if let Some(entry) = ledger.credit(&policy.passenger, key, amount) {
                credited.push(entry);
            }
            book.set_status(&policy.passenger, key, PolicyStatus::Credited);
        }

        info!("💸 Payout for {}: {} passengers credited", key, credited.len());
        credited
    }
}
