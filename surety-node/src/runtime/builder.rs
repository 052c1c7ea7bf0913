use surety_common::{crypto::hash, error::Result, SuretyError};
use surety_consensus::{HashIndexSource, IndexSource, SuretyEngine};
use tokio::{sync::oneshot, task::JoinHandle};
use tracing::info;

use super::{
    driver::{EngineDriver, EngineHandle},
    oracle_sim::OracleFleet,
};
use crate::config::NodeConfig;

/// A running engine driver plus its oracle fleet.
pub struct SuretyRuntime {
    pub handle: EngineHandle,
    driver: JoinHandle<SuretyEngine>,
    fleet: JoinHandle<()>,
    fleet_shutdown: oneshot::Sender<()>,
}

impl SuretyRuntime {
    /// Stops the fleet, waits for queued commands to drain and hands the
    /// engine back.
    pub async fn shutdown(self) -> Result<SuretyEngine> {
        let _ = self.fleet_shutdown.send(());
        self.fleet
            .await
            .map_err(|e| SuretyError::Runtime(format!("oracle fleet: {e}")))?;

        drop(self.handle);
        self.driver
            .await
            .map_err(|e| SuretyError::Runtime(format!("engine driver: {e}")))
    }
}

/// Seed of the fleet's answer generator, derived from the node seed.
fn fleet_seed(seed: &str) -> u64 {
    let digest = hash::digest_bytes(format!("{seed}/fleet").as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

pub async fn build_runtime(config: &NodeConfig) -> Result<SuretyRuntime> {
    let source = HashIndexSource::new(config.seed.as_bytes().to_vec());
    build_runtime_with_source(config, Box::new(source)).await
}

/// Same as [`build_runtime`] with an explicit index source.
pub async fn build_runtime_with_source(config: &NodeConfig, source: Box<dyn IndexSource>) -> Result<SuretyRuntime> {
    config.validate()?;

    let engine = SuretyEngine::new(
        config.engine.clone(),
        config.owner.clone(),
        config.first_airline.clone(),
        source,
    )?;
    let (handle, driver) = EngineDriver::spawn(engine, config.queue_cap);

    let fleet = OracleFleet::register(&handle, &config.fleet, fleet_seed(&config.seed)).await?;
    let (fleet_shutdown, shutdown_rx) = oneshot::channel();
    let fleet = fleet.run(handle.clone(), handle.subscribe(), shutdown_rx);

    info!("✅ Runtime ready for node {}", config.node_id);

    Ok(SuretyRuntime {
        handle,
        driver,
        fleet,
        fleet_shutdown,
    })
}
