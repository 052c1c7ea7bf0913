//! Insurance bookkeeping: policies bought against a flight, the write-once
//! credit ledger, and the trigger that turns a finalized airline-caused delay
//! into passenger credits.
//!
//! Nothing in this crate moves value. Premiums and withdrawals are recorded
//! as numbers; the surrounding ledger performs the transfers.

pub mod credit;
pub mod payout;
pub mod policy;

pub use credit::{CreditEntry, CreditLedger};
pub use payout::PayoutTrigger;
pub use policy::{InsurancePolicy, PolicyBook, PolicyStatus};
