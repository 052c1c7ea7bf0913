//! Oracle consensus.
//!
//! Oracles pay a fee and receive a small fixed set of opaque indices. A
//! status request carries one index drawn from the same range, and only
//! oracles holding that index may answer it. Answers are bucketed by
//! `(key, index, status)`; the first bucket to gather `quorum` distinct
//! oracles finalizes the key.

pub mod aggregator;
pub mod assigner;
pub mod correlator;

pub use aggregator::{FinalizedFact, ResponseAggregator, ResponseOutcome};
pub use assigner::{HashIndexSource, IndexSource, OracleIndexAssigner, OracleRegistration, ScriptedIndexSource};
pub use correlator::{RequestCorrelator, StatusRequest};
