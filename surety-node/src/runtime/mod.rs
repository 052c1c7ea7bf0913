pub mod builder;
pub mod driver;
pub mod oracle_sim;
pub mod scenario;

pub use builder::{build_runtime, build_runtime_with_source, SuretyRuntime};
pub use driver::{EngineCommand, EngineDriver, EngineHandle};
pub use oracle_sim::{OracleFleet, SimOracle};
