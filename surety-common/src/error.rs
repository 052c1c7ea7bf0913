// src/error.rs
use thiserror::Error;

use crate::{
    env::subject::{IndexValue, SubjectKey},
    utils::{Address, Amount},
};

pub type Result<T> = std::result::Result<T, SuretyError>;

/// Every failure a governance, oracle or insurance call can produce.
///
/// Failures are local to the call that produced them: the engine checks all
/// preconditions before writing, so an `Err` always means "nothing changed".
#[derive(Debug, Error)]
pub enum SuretyError {
    /// Caller is not a registered participant that has provided funding.
    #[error("Participant {0} is not a funded member")]
    NotFunded(Address),

    #[error("Participant {0} is already registered")]
    AlreadyRegistered(Address),

    #[error("Insufficient funding: required {required}, provided {provided}")]
    InsufficientFunding { required: Amount, provided: Amount },

    #[error("Insufficient oracle fee: required {required}, provided {provided}")]
    InsufficientFee { required: Amount, provided: Amount },

    #[error("Oracle {0} has no index assignment")]
    UnknownOracle(Address),

    #[error("Oracle {oracle} was not assigned index {index}")]
    IndexMismatch { oracle: Address, index: IndexValue },

    #[error("No open status request for {key} at index {index}")]
    NoOpenRequest { key: SubjectKey, index: IndexValue },

    #[error("Oracle {0} is already registered")]
    OracleAlreadyRegistered(Address),

    #[error("Contract is currently not operational")]
    NotOperational,

    #[error("Caller {0} is not allowed to perform this operation")]
    Unauthorized(Address),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(Address),

    #[error("Flight already registered: {0}")]
    FlightAlreadyRegistered(SubjectKey),

    #[error("Invalid premium {premium} (must be between 1 and {max})")]
    InvalidPremium { premium: Amount, max: Amount },

    #[error("Passenger {passenger} already insured for {key}")]
    AlreadyInsured { passenger: Address, key: SubjectKey },

    /// Purchases are closed once the subject key has a finalized status.
    #[error("Insurance closed for {0}")]
    PolicyClosed(SubjectKey),

    #[error("Nothing to withdraw for {0}")]
    NothingToWithdraw(Address),

    #[error("Unknown status code {0}")]
    InvalidStatusCode(u8),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
