use std::path::Path;

use surety_common::{error::Result, Address, EconomicParams, PayoutMultiplier, SuretyConfig};
use tracing::info;

use crate::config::{FleetConfig, NodeConfig};

/// Amounts are in milli-units: funding 10, oracle fee 1, premium cap 1.
pub fn default_config() -> NodeConfig {
    let node_id = format!("node-{}", uuid::Uuid::new_v4().simple());
    let short: String = node_id.chars().take(13).collect();

    let economics = EconomicParams::new(10_000, 1_000, 1_000, PayoutMultiplier::new(3, 2));

    NodeConfig {
        seed: format!("{}-seed", short),
        node_id: short,
        owner: Address::from("owner"),
        first_airline: Address::from("airline-0"),
        queue_cap: 100,
        engine: SuretyConfig::new(economics),
        fleet: FleetConfig::new(1_000),
    }
}

/// Writes a default config at `path` unless one is already there.
pub fn ensure_config(path: &str) -> Result<()> {
    if !Path::new(path).exists() {
        info!("⚠️ Config não encontrada. Gerando padrão em {}...", path);

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let config = default_config();
        config.save_to_file(path)?;
        info!("✅ Config gerada com sucesso! (node: {})", config.node_id);
    }
    Ok(())
}
