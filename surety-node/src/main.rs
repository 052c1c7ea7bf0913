use std::time::Duration;

use clap::Parser;
use surety_node::{
    cli::Args,
    config::NodeConfig,
    runtime::{build_runtime, scenario::run_cycle},
    setup::ensure_config,
};
use tracing::{error, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Parse Arguments
    let args = Args::parse();
    let node_name = std::path::Path::new(&args.config)
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("local")
        .to_string();

    // 2. Logging: stdout plus an audit file with engine decisions only
    std::fs::create_dir_all(&args.log_dir)?;
    let file_appender = tracing_appender::rolling::never(&args.log_dir, format!("audit-{}.log", node_name));
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let audit_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target().starts_with("surety_consensus")
                || metadata.target().starts_with("surety_ledger")
                || metadata.target() == "surety_node::audit"
        }));

    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,surety_node=debug".into()),
    );

    tracing_subscriber::registry()
        .with(audit_layer)
        .with(stdout_layer)
        .init();

    info!("--- INICIANDO NÓ SURETY ---");
    info!("Config: {}", args.config);

    // 3. Setup Config
    if let Err(e) = ensure_config(&args.config) {
        error!("Falha na auto-configuração: {}", e);
        return Err(e.into());
    }
    let config = NodeConfig::load_from_file(&args.config)?;

    // 4. Start Runtime
    let runtime = match build_runtime(&config).await {
        Ok(rt) => {
            info!("Nó iniciado com sucesso.");
            rt
        }
        Err(e) => {
            error!("Falha ao iniciar o nó: {}.", e);
            return Err(e.into());
        }
    };

    // 5. Demo cycle
    let reports = run_cycle(&runtime.handle, &config, args.flights, Duration::from_secs(args.timeout_s)).await;

    let engine = runtime.shutdown().await?;
    let reports = reports?;

    let resolved = reports.iter().filter(|r| r.status.is_some()).count();
    let paid: u128 = reports.iter().map(|r| r.withdrawn).sum();
    info!(
        "🏁 Cycle done: {}/{} flights resolved, {} paid out, clock at {}",
        resolved,
        reports.len(),
        paid,
        engine.now()
    );

    Ok(())
}
