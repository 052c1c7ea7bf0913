//! utils.rs
//!
//! Common types shared across the surety crates.
//!
//! This module provides the identity newtype used for airlines, oracles and
//! passengers, the amount alias, and the logical clock used to stamp requests.

pub mod address;
pub use address::Address;

pub mod time;
pub use time::LogicalTime;

/// Smallest indivisible value unit. Conversion to display units is left to
/// the wallet layer.
pub type Amount = u128;
