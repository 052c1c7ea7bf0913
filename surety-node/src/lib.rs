pub mod cli;
pub mod config;
pub mod runtime;
pub mod setup;

pub use config::{FleetConfig, NodeConfig};
pub use runtime::builder::build_runtime;
