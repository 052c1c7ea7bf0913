use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use surety_common::{error::Result, Address, Amount, SuretyConfig, SuretyError};

/// Oracle processes simulated by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default = "default_oracle_count")]
    pub oracle_count: usize,
    /// Share of the fleet that always reports `LateAirline`. The rest answer
    /// with a random status code.
    #[serde(default = "default_airline_status_probability")]
    pub airline_status_probability: f64,
    /// Fee each simulated oracle pays on registration.
    pub registration_fee: Amount,
}

fn default_oracle_count() -> usize {
    20
}

fn default_airline_status_probability() -> f64 {
    0.8
}

impl FleetConfig {
    pub fn new(registration_fee: Amount) -> Self {
        Self {
            oracle_count: default_oracle_count(),
            airline_status_probability: default_airline_status_probability(),
            registration_fee,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: String,
    pub owner: Address,
    pub first_airline: Address,
    /// Seed of the hash-based index source.
    pub seed: String,
    #[serde(default = "default_queue_cap")]
    pub queue_cap: usize,
    pub engine: SuretyConfig,
    pub fleet: FleetConfig,
}

/// Upper bound on `queue_cap`; the event channel holds four times this.
pub const MAX_QUEUE_CAP: usize = 10_000;

fn default_queue_cap() -> usize {
    100
}

impl NodeConfig {
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;

        if self.queue_cap == 0 {
            return Err(SuretyError::Config("queue_cap must be at least 1".into()));
        }
        if self.queue_cap > MAX_QUEUE_CAP {
            return Err(SuretyError::Config(format!("queue_cap must be at most {}", MAX_QUEUE_CAP)));
        }
        if !(0.0..=1.0).contains(&self.fleet.airline_status_probability) {
            return Err(SuretyError::Config(format!(
                "airline_status_probability must be within [0, 1], got {}",
                self.fleet.airline_status_probability
            )));
        }
        if self.fleet.registration_fee < self.engine.economics.oracle_fee {
            return Err(SuretyError::Config(format!(
                "fleet registration_fee {} is below the oracle fee {}",
                self.fleet.registration_fee, self.engine.economics.oracle_fee
            )));
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let parsed = serde_json::from_str::<NodeConfig>(&data)?;
        parsed.validate()?;
        Ok(parsed)
    }
}
