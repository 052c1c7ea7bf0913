//! Membership voting, oracle agreement and the engine that ties them to the
//! policy ledger.

pub mod consensus;
pub mod engine;
pub mod flights;
pub mod oracle;

pub use consensus::{Admission, AdmissionPolicy, ConsensusVoter, MembershipRegistry};
pub use engine::SuretyEngine;
pub use flights::{Flight, FlightRegistry};
pub use oracle::{
    FinalizedFact, HashIndexSource, IndexSource, OracleIndexAssigner, ResponseOutcome, ScriptedIndexSource,
    StatusRequest,
};
