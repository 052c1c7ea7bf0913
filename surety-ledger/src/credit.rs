use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use surety_common::{
    error::{Result, SuretyError},
    Address, Amount, SubjectKey,
};
use tracing::info;

/// One payout to one passenger for one subject key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub passenger: Address,
    pub key: SubjectKey,
    pub amount: Amount,
    pub credited: bool,
}

/// Per-passenger withdrawable balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccount {
    pub balance: Amount,
    pub total_credited: Amount,
    pub total_withdrawn: Amount,
}

/// Write-once credit entries plus the balances they accrue to.
#[derive(Debug, Default, Clone)]
pub struct CreditLedger {
    entries: HashMap<(Address, SubjectKey), CreditEntry>,
    accounts: HashMap<Address, CreditAccount>,
}

impl CreditLedger {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            accounts: HashMap::new(),
        }
    }

    /// Credits `amount` to `passenger` for `key`.
    ///
    /// Returns `None` when an entry for the pair already exists; the existing
    /// entry and balance are left untouched.
    pub fn credit(&mut self, passenger: &Address, key: &SubjectKey, amount: Amount) -> Option<CreditEntry> {
        let slot = (passenger.clone(), key.clone());
        if self.entries.contains_key(&slot) {
            return None;
        }

        let entry = CreditEntry {
            passenger: passenger.clone(),
            key: key.clone(),
            amount,
            credited: true,
        };
        self.entries.insert(slot, entry.clone());

        let account = self.accounts.entry(passenger.clone()).or_default();
        account.balance = account.balance.saturating_add(amount);
        account.total_credited = account.total_credited.saturating_add(amount);

        info!("💰 Credited {} to {} for {}", amount, passenger, key);
        Some(entry)
    }

    pub fn entry(&self, passenger: &Address, key: &SubjectKey) -> Option<&CreditEntry> {
        self.entries.get(&(passenger.clone(), key.clone()))
    }

    /// Withdrawable balance of `passenger`.
    pub fn balance_of(&self, passenger: &Address) -> Amount {
        self.accounts.get(passenger).map(|a| a.balance).unwrap_or(0)
    }

    pub fn account(&self, passenger: &Address) -> Option<&CreditAccount> {
        self.accounts.get(passenger)
    }

    /// Checks that `passenger` has something to withdraw, without changing state.
    pub fn check_withdraw(&self, passenger: &Address) -> Result<Amount> {
        match self.balance_of(passenger) {
            0 => Err(SuretyError::NothingToWithdraw(passenger.clone())),
            amount => Ok(amount),
        }
    }

    /// Zeroes the balance and returns the amount the external ledger must pay out.
    pub fn withdraw(&mut self, passenger: &Address) -> Result<Amount> {
        let amount = self.check_withdraw(passenger)?;
        if let Some(account) = self.accounts.get_mut(passenger) {
            account.balance = 0;
            account.total_withdrawn = account.total_withdrawn.saturating_add(amount);
        }
        info!("🏧 Withdrawal of {} released to {}", amount, passenger);
        Ok(amount)
    }

    /// Number of credit entries recorded for `key`.
    pub fn entries_for(&self, key: &SubjectKey) -> usize {
        self.entries.keys().filter(|(_, k)| k == key).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
