use rand::{rngs::StdRng, Rng, SeedableRng};
use surety_common::{
    error::Result, Address, EngineEvent, IndexValue, StatusCode, SubjectKey,
};
use surety_consensus::ResponseOutcome;
use tokio::{
    sync::{broadcast, oneshot},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use super::driver::EngineHandle;
use crate::config::FleetConfig;

/// A simulated oracle process.
#[derive(Debug, Clone)]
pub struct SimOracle {
    pub address: Address,
    pub indices: Vec<IndexValue>,
    /// Always answers `LateAirline` instead of a random code.
    pub always_late_airline: bool,
}

impl SimOracle {
    fn answer(&self, index: IndexValue, rng: &mut StdRng) -> Option<StatusCode> {
        if !self.indices.contains(&index) {
            return None;
        }
        if self.always_late_airline {
            return Some(StatusCode::LateAirline);
        }
        Some(StatusCode::ALL[rng.gen_range(0..StatusCode::ALL.len())])
    }
}

/// Fleet of oracles that answers every `StatusRequested` event.
pub struct OracleFleet {
    oracles: Vec<SimOracle>,
    rng: StdRng,
}

impl OracleFleet {
    /// Registers `config.oracle_count` oracles through `handle`.
    ///
    /// The first `oracle_count * airline_status_probability` oracles (rounded
    /// down, plus one) are the ones that always report `LateAirline`.
    pub async fn register(handle: &EngineHandle, config: &FleetConfig, rng_seed: u64) -> Result<Self> {
        let biased = config.oracle_count as f64 * config.airline_status_probability;
        let mut oracles = Vec::with_capacity(config.oracle_count);

        for i in 0..config.oracle_count {
            let address = Address(format!("oracle-{:02}", i));
            let indices = handle.register_oracle(address.clone(), config.registration_fee).await?;
            oracles.push(SimOracle {
                address,
                indices,
                always_late_airline: config.airline_status_probability > 0.0 && (i as f64) <= biased,
            });
        }

        let late = oracles.iter().filter(|o| o.always_late_airline).count();
        info!("🔮 Oracle fleet ready: {} oracles ({} always report LateAirline)", oracles.len(), late);

        Ok(Self {
            oracles,
            rng: StdRng::seed_from_u64(rng_seed),
        })
    }

    pub fn oracles(&self) -> &[SimOracle] {
        &self.oracles
    }

    /// Answers of every oracle holding `index`.
    pub fn answers(&mut self, index: IndexValue) -> Vec<(Address, StatusCode)> {
        let rng = &mut self.rng;
        self.oracles
            .iter()
            .filter_map(|o| o.answer(index, rng).map(|status| (o.address.clone(), status)))
            .collect()
    }

    async fn respond(&mut self, handle: &EngineHandle, key: SubjectKey, index: IndexValue) {
        let answers = self.answers(index);
        debug!("{} oracles answering {} at index {}", answers.len(), key, index);

        for (oracle, status) in answers {
            match handle.submit_response(oracle.clone(), key.clone(), index, status).await {
                Ok(ResponseOutcome::Finalized(fact)) => {
                    info!("🏁 Oracle [{}] closed {} as {}", oracle, key, fact.status);
                }
                Ok(_) => {}
                Err(e) => warn!("Oracle [{}] response rejected: {}", oracle, e),
            }
        }
    }

    /// Runs the fleet until `shutdown` fires or the event stream closes.
    pub fn run(
        mut self,
        handle: EngineHandle,
        mut events: broadcast::Receiver<EngineEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("🔴 Oracle fleet shutting down");
                        break;
                    }
                    received = events.recv() => match received {
                        Ok(EngineEvent::StatusRequested { key, index }) => {
                            self.respond(&handle, key, index).await;
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            error!("Oracle fleet lagged, {} events skipped", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        })
    }
}
