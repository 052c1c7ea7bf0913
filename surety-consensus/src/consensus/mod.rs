//! consensus.rs
//!
//! Membership governance: who is in the registry and how new airlines get in.
//!
//! While the registry is small any funded member admits a candidate on its
//! own. Past the bootstrap size a candidate needs votes from a strict
//! majority of the registered members, counted per candidate and per
//! distinct voter.

pub mod evaluator;
pub mod registry;

pub use evaluator::{Admission, AdmissionPolicy, ConsensusVoter};
pub use registry::{MembershipRegistry, Participant};
