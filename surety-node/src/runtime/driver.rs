use std::fmt;

use surety_common::{
    error::{Result, SuretyError},
    Address, Amount, EngineEvent, IndexValue, StatusCode, SubjectKey,
};
use surety_consensus::{Admission, ResponseOutcome, StatusRequest, SuretyEngine};
use surety_ledger::CreditEntry;

use crate::config::MAX_QUEUE_CAP;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

type Reply<T> = oneshot::Sender<Result<T>>;

/// One call into the engine, carrying the channel its result goes back on.
pub enum EngineCommand {
    SetOperational { caller: Address, operational: bool, reply: Reply<()> },
    RegisterAirline { caller: Address, candidate: Address, reply: Reply<Admission> },
    Fund { participant: Address, amount: Amount, reply: Reply<()> },
    RegisterFlight { caller: Address, flight: String, timestamp: u64, reply: Reply<SubjectKey> },
    RegisterOracle { oracle: Address, fee: Amount, reply: Reply<Vec<IndexValue>> },
    FetchFlightStatus { requester: Address, key: SubjectKey, reply: Reply<StatusRequest> },
    SubmitResponse { oracle: Address, key: SubjectKey, index: IndexValue, status: StatusCode, reply: Reply<ResponseOutcome> },
    Buy { passenger: Address, key: SubjectKey, premium: Amount, reply: Reply<()> },
    CreditInsurees { caller: Address, key: SubjectKey, reply: Reply<Vec<CreditEntry>> },
    Withdraw { passenger: Address, reply: Reply<Amount> },
    FlightStatus { key: SubjectKey, reply: Reply<StatusCode> },
    CreditsOf { passenger: Address, reply: Reply<Amount> },
    IsRegistered { id: Address, reply: Reply<bool> },
}

impl fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineCommand::SetOperational { .. } => "SetOperational",
            EngineCommand::RegisterAirline { .. } => "RegisterAirline",
            EngineCommand::Fund { .. } => "Fund",
            EngineCommand::RegisterFlight { .. } => "RegisterFlight",
            EngineCommand::RegisterOracle { .. } => "RegisterOracle",
            EngineCommand::FetchFlightStatus { .. } => "FetchFlightStatus",
            EngineCommand::SubmitResponse { .. } => "SubmitResponse",
            EngineCommand::Buy { .. } => "Buy",
            EngineCommand::CreditInsurees { .. } => "CreditInsurees",
            EngineCommand::Withdraw { .. } => "Withdraw",
            EngineCommand::FlightStatus { .. } => "FlightStatus",
            EngineCommand::CreditsOf { .. } => "CreditsOf",
            EngineCommand::IsRegistered { .. } => "IsRegistered",
        };
        f.write_str(name)
    }
}

impl EngineCommand {
    fn execute(self, engine: &mut SuretyEngine) {
        // A dropped receiver means the caller gave up; the result is discarded.
        match self {
            EngineCommand::SetOperational { caller, operational, reply } => {
                let _ = reply.send(engine.set_operational(&caller, operational));
            }
            EngineCommand::RegisterAirline { caller, candidate, reply } => {
                let _ = reply.send(engine.register_airline(&caller, &candidate));
            }
            EngineCommand::Fund { participant, amount, reply } => {
                let _ = reply.send(engine.fund(&participant, amount));
            }
            EngineCommand::RegisterFlight { caller, flight, timestamp, reply } => {
                let _ = reply.send(engine.register_flight(&caller, &flight, timestamp));
            }
            EngineCommand::RegisterOracle { oracle, fee, reply } => {
                let _ = reply.send(engine.register_oracle(&oracle, fee));
            }
            EngineCommand::FetchFlightStatus { requester, key, reply } => {
                let _ = reply.send(engine.fetch_flight_status(&requester, key));
            }
            EngineCommand::SubmitResponse { oracle, key, index, status, reply } => {
                let _ = reply.send(engine.submit_response(&oracle, &key, index, status));
            }
            EngineCommand::Buy { passenger, key, premium, reply } => {
                let _ = reply.send(engine.buy(&passenger, &key, premium));
            }
            EngineCommand::CreditInsurees { caller, key, reply } => {
                let _ = reply.send(engine.credit_insurees(&caller, &key));
            }
            EngineCommand::Withdraw { passenger, reply } => {
                let _ = reply.send(engine.withdraw(&passenger));
            }
            EngineCommand::FlightStatus { key, reply } => {
                let _ = reply.send(Ok(engine.flight_status(&key)));
            }
            EngineCommand::CreditsOf { passenger, reply } => {
                let _ = reply.send(Ok(engine.credits_of(&passenger)));
            }
            EngineCommand::IsRegistered { id, reply } => {
                let _ = reply.send(Ok(engine.is_registered(&id)));
            }
        }
    }
}

#[derive(Debug)]
struct JobEnvelope {
    id: Uuid,
    cmd: EngineCommand,
}

/// Owns the engine on a single task and applies queued commands in order.
///
/// After each command the engine outbox is drained onto a broadcast channel,
/// so subscribers see events in the order the engine produced them.
pub struct EngineDriver;

impl EngineDriver {
    /// `queue_cap` is clamped to `1..=MAX_QUEUE_CAP`.
    pub fn spawn(mut engine: SuretyEngine, queue_cap: usize) -> (EngineHandle, JoinHandle<SuretyEngine>) {
        let queue_cap = queue_cap.clamp(1, MAX_QUEUE_CAP);
        let (tx, mut rx) = mpsc::channel::<JobEnvelope>(queue_cap);
        let (events, _) = broadcast::channel::<EngineEvent>(queue_cap * 4);

        let handle = EngineHandle {
            tx,
            events: events.clone(),
        };

        let task = tokio::spawn(async move {
            info!("🧭 Engine driver started");
            while let Some(JobEnvelope { id, cmd }) = rx.recv().await {
                debug!("⚙️ Job {} running: {:?}", id, cmd);
                cmd.execute(&mut engine);

                for event in engine.drain_events() {
                    debug!("📣 Job {} emitted {}", id, event.kind());
                    match event.to_json() {
                        Ok(json) => info!(target: "surety_node::audit", "{}", json),
                        Err(e) => warn!("Job {} event {} not serializable: {}", id, event.kind(), e),
                    }
                    // No subscribers is not an error.
                    let _ = events.send(event);
                }
            }
            info!("🛑 Engine driver stopped");
            engine
        });

        (handle, task)
    }
}

/// Cloneable front door to a running [`EngineDriver`].
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<JobEnvelope>,
    events: broadcast::Sender<EngineEvent>,
}

impl EngineHandle {
    /// Receives every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    async fn call<T>(&self, build: impl FnOnce(Reply<T>) -> EngineCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        let id = Uuid::new_v4();
        let cmd = build(reply);

        self.tx
            .send(JobEnvelope { id, cmd })
            .await
            .map_err(|_| SuretyError::Runtime("engine driver is not running".into()))?;

        rx.await.map_err(|_| {
            warn!("Job {} dropped without a reply", id);
            SuretyError::Runtime(format!("job {} dropped without a reply", id))
        })?
    }

    pub async fn set_operational(&self, caller: Address, operational: bool) -> Result<()> {
        self.call(|reply| EngineCommand::SetOperational { caller, operational, reply }).await
    }

    pub async fn register_airline(&self, caller: Address, candidate: Address) -> Result<Admission> {
        self.call(|reply| EngineCommand::RegisterAirline { caller, candidate, reply }).await
    }

    pub async fn fund(&self, participant: Address, amount: Amount) -> Result<()> {
        self.call(|reply| EngineCommand::Fund { participant, amount, reply }).await
    }

    pub async fn register_flight(&self, caller: Address, flight: impl Into<String>, timestamp: u64) -> Result<SubjectKey> {
        let flight = flight.into();
        self.call(|reply| EngineCommand::RegisterFlight { caller, flight, timestamp, reply }).await
    }

    pub async fn register_oracle(&self, oracle: Address, fee: Amount) -> Result<Vec<IndexValue>> {
        self.call(|reply| EngineCommand::RegisterOracle { oracle, fee, reply }).await
    }

    pub async fn fetch_flight_status(&self, requester: Address, key: SubjectKey) -> Result<StatusRequest> {
        self.call(|reply| EngineCommand::FetchFlightStatus { requester, key, reply }).await
    }

    pub async fn submit_response(
        &self,
        oracle: Address,
        key: SubjectKey,
        index: IndexValue,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        self.call(|reply| EngineCommand::SubmitResponse { oracle, key, index, status, reply }).await
    }

    pub async fn buy(&self, passenger: Address, key: SubjectKey, premium: Amount) -> Result<()> {
        self.call(|reply| EngineCommand::Buy { passenger, key, premium, reply }).await
    }

    pub async fn credit_insurees(&self, caller: Address, key: SubjectKey) -> Result<Vec<CreditEntry>> {
        self.call(|reply| EngineCommand::CreditInsurees { caller, key, reply }).await
    }

    pub async fn withdraw(&self, passenger: Address) -> Result<Amount> {
        self.call(|reply| EngineCommand::Withdraw { passenger, reply }).await
    }

    pub async fn flight_status(&self, key: SubjectKey) -> Result<StatusCode> {
        self.call(|reply| EngineCommand::FlightStatus { key, reply }).await
    }

    pub async fn credits_of(&self, passenger: Address) -> Result<Amount> {
        self.call(|reply| EngineCommand::CreditsOf { passenger, reply }).await
    }

    pub async fn is_registered(&self, id: Address) -> Result<bool> {
        self.call(|reply| EngineCommand::IsRegistered { id, reply }).await
    }
}
