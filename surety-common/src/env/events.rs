use serde::{Deserialize, Serialize};

use crate::{
    env::{
        status::StatusCode,
        subject::{IndexValue, SubjectKey},
    },
    utils::{Address, Amount},
};

/// Signals the engine leaves in its outbox for the transport to broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A candidate became a registered participant.
    CandidatePromoted { candidate: Address },

    /// A status request was opened; oracles holding `index` should answer.
    StatusRequested { key: SubjectKey, index: IndexValue },

    FlightRegistered { key: SubjectKey },

    /// Quorum agreed on `status` for `key`. Emitted once per key.
    FactFinalized { key: SubjectKey, status: StatusCode },

    /// A passenger received the payout for an insured key. Emitted once per
    /// `(passenger, key)`.
    PassengerCredited {
        passenger: Address,
        key: SubjectKey,
        amount: Amount,
    },
}

impl EngineEvent {
    /// Short name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::CandidatePromoted { .. } => "CandidatePromoted",
            EngineEvent::StatusRequested { .. } => "StatusRequested",
            EngineEvent::FlightRegistered { .. } => "FlightRegistered",
            EngineEvent::FactFinalized { .. } => "FactFinalized",
            EngineEvent::PassengerCredited { .. } => "PassengerCredited",
        }
    }

    /// Compact JSON form written to the audit log.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_carries_wire_status_code() {
        let event = EngineEvent::FactFinalized {
            key: SubjectKey::new("airline-1", "XT312", 1_601_737_200_000),
            status: StatusCode::LateAirline,
        };
        let json = event.to_json().unwrap();
        assert!(json.contains("\"status\":20"), "{}", json);
        assert!(json.starts_with("{\"FactFinalized\""));
    }
}
