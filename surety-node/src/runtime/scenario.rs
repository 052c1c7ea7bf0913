use std::time::Duration;

use surety_common::{error::Result, Address, Amount, EngineEvent, StatusCode, SubjectKey};
use tokio::{sync::broadcast, time::Instant};
use tracing::{info, warn};

use super::driver::EngineHandle;
use crate::config::NodeConfig;

/// Status requests sent per flight before giving up.
const MAX_ATTEMPTS: usize = 3;

/// Base departure time of the demo flights, in seconds.
const FIRST_DEPARTURE: u64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightReport {
    pub key: SubjectKey,
    pub passenger: Address,
    /// `None` when no quorum was reached in time.
    pub status: Option<StatusCode>,
    pub withdrawn: Amount,
}

/// Runs `flights` flights end to end: the first airline funds itself and
/// announces each flight, one passenger buys the maximum premium, a status
/// request goes out and the passenger withdraws whatever was credited.
pub async fn run_cycle(handle: &EngineHandle, config: &NodeConfig, flights: usize, wait: Duration) -> Result<Vec<FlightReport>> {
    let airline = config.first_airline.clone();
    let premium = config.engine.economics.max_premium;

    handle.fund(airline.clone(), config.engine.economics.min_funding).await?;

    let mut reports = Vec::with_capacity(flights);
    for i in 0..flights {
        let flight = format!("SY{:03}", 100 + i);
        let key = handle
            .register_flight(airline.clone(), flight, FIRST_DEPARTURE + i as u64 * 3_600)
            .await?;

        let passenger = Address(format!("passenger-{}", i));
        handle.buy(passenger.clone(), key.clone(), premium).await?;

        let mut events = handle.subscribe();
        let mut status = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let request = handle.fetch_flight_status(passenger.clone(), key.clone()).await?;
            info!("✈️ {} status requested at index {} (attempt {})", key, request.index, attempt);

            status = await_finalized(&mut events, &key, wait).await;
            if status.is_some() {
                break;
            }
            warn!("⏳ No quorum for {} after {:?}", key, wait);
        }

        let credited = handle.credits_of(passenger.clone()).await?;
        let withdrawn = if credited > 0 { handle.withdraw(passenger.clone()).await? } else { 0 };

        match status {
            Some(s) => info!("📋 {} -> {} | passenger {} withdrew {}", key, s, passenger, withdrawn),
            None => warn!("📋 {} left unresolved", key),
        }

        reports.push(FlightReport {
            key,
            passenger,
            status,
            withdrawn,
        });
    }

    Ok(reports)
}

/// Waits for the `FactFinalized` event of `key`.
pub async fn await_finalized(
    events: &mut broadcast::Receiver<EngineEvent>,
    key: &SubjectKey,
    wait: Duration,
) -> Option<StatusCode> {
    let deadline = Instant::now() + wait;
    loop {
        match tokio::time::timeout_at(deadline, events.recv()).await {
            Err(_) => return None,
            Ok(Ok(EngineEvent::FactFinalized { key: finalized, status })) if &finalized == key => {
                return Some(status)
            }
            Ok(Ok(_)) | Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
            Ok(Err(broadcast::error::RecvError::Closed)) => return None,
        }
    }
}
