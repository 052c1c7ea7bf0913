use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::Address;

/// Opaque index used to decorrelate which oracles may answer a request.
pub type IndexValue = u8;

/// Identifies the fact being resolved: one flight of one airline at one
/// scheduled departure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectKey {
    /// The participant the fact is about.
    pub airline: Address,

    /// Fact id, e.g. the flight number "XT312".
    pub flight: String,

    /// Time window of the fact (scheduled departure, unix millis).
    pub timestamp: u64,
}

impl SubjectKey {
    pub fn new(airline: impl Into<Address>, flight: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline: airline.into(),
            flight: flight.into(),
            timestamp,
        }
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.airline, self.flight, self.timestamp)
    }
}
