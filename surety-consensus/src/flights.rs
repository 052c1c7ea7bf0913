use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use surety_common::{
    error::{Result, SuretyError},
    LogicalTime, StatusCode, SubjectKey,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub key: SubjectKey,
    pub status: StatusCode,
    pub registered_at: LogicalTime,
}

/// Flights announced by their airline.
#[derive(Debug, Default, Clone)]
pub struct FlightRegistry {
    flights: HashMap<SubjectKey, Flight>,
}

impl FlightRegistry {
    pub fn new() -> Self {
        Self {
            flights: HashMap::new(),
        }
    }

    pub fn check_register(&self, key: &SubjectKey) -> Result<()> {
        if self.flights.contains_key(key) {
            return Err(SuretyError::FlightAlreadyRegistered(key.clone()));
        }
        Ok(())
    }

    pub fn register(&mut self, key: SubjectKey, now: LogicalTime) -> Result<&Flight> {
        self.check_register(&key)?;
        let flight = Flight {
            key: key.clone(),
            status: StatusCode::Unknown,
            registered_at: now,
        };
        Ok(self.flights.entry(key).or_insert(flight))
    }

    /// Records the finalized status on a registered flight. Unregistered keys
    /// are ignored.
    pub fn set_status(&mut self, key: &SubjectKey, status: StatusCode) {
        if let Some(flight) = self.flights.get_mut(key) {
            flight.status = status;
        }
    }

    pub fn get(&self, key: &SubjectKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
