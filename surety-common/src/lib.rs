pub mod config;
pub mod crypto;
pub mod env;
pub mod error;
pub mod utils;

pub use config::{EconomicParams, PayoutMultiplier, ProtocolParams, SuretyConfig};
pub use env::{
    events::EngineEvent,
    status::StatusCode,
    subject::{IndexValue, SubjectKey},
};
pub use error::{Result, SuretyError};
pub use utils::{Address, Amount, LogicalTime};
