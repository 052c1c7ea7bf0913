use std::{collections::VecDeque, fmt};

use surety_common::{
    error::{Result, SuretyError},
    Address, Amount, EngineEvent, IndexValue, LogicalTime, StatusCode, SubjectKey, SuretyConfig,
};
use surety_ledger::{CreditEntry, CreditLedger, InsurancePolicy, PayoutTrigger, PolicyBook};
use tracing::{debug, info, warn};

use crate::{
    consensus::{Admission, AdmissionPolicy, ConsensusVoter, MembershipRegistry, Participant},
    flights::{Flight, FlightRegistry},
    oracle::{
        FinalizedFact, IndexSource, OracleIndexAssigner, RequestCorrelator, ResponseAggregator, ResponseOutcome,
        StatusRequest,
    },
};

/// Motor de consenso: owns every table and applies one call at a time.
///
/// Every mutating method takes `&mut self`, so calls are totally ordered by
/// whoever holds the engine. Each method runs all of its checks before the
/// first write; an `Err` leaves the engine exactly as it was.
///
/// Notifications are not delivered inline. They accumulate in the outbox and
/// the caller collects them with [`SuretyEngine::drain_events`].
pub struct SuretyEngine {
    config: SuretyConfig,
    owner: Address,
    operational: bool,
    clock: LogicalTime,

    registry: MembershipRegistry,
    voter: ConsensusVoter,

    oracles: OracleIndexAssigner,
    requests: RequestCorrelator,
    aggregator: ResponseAggregator,
    flights: FlightRegistry,

    policies: PolicyBook,
    credits: CreditLedger,
    payout: PayoutTrigger,

    source: Box<dyn IndexSource>,
    outbox: VecDeque<EngineEvent>,
}

impl SuretyEngine {
    /// Builds an engine with `first_airline` already registered (unfunded).
    pub fn new(
        config: SuretyConfig,
        owner: Address,
        first_airline: Address,
        source: Box<dyn IndexSource>,
    ) -> Result<Self> {
        config.validate()?;

        let protocol = config.protocol.clone();
        let economics = config.economics.clone();

        let mut registry = MembershipRegistry::new();
        registry.bootstrap(first_airline.clone());

        info!(
            "🚀 Surety engine started (owner: {}, first airline: {}, bootstrap: {}, quorum: {})",
            owner, first_airline, protocol.bootstrap_threshold, protocol.quorum
        );

        Ok(Self {
            owner,
            operational: true,
            clock: LogicalTime::default(),
            registry,
            voter: ConsensusVoter::new(AdmissionPolicy {
                bootstrap_threshold: protocol.bootstrap_threshold,
            }),
            oracles: OracleIndexAssigner::new(protocol.indices_per_oracle, protocol.index_range, economics.oracle_fee),
            requests: RequestCorrelator::new(),
            aggregator: ResponseAggregator::new(protocol.quorum),
            flights: FlightRegistry::new(),
            policies: PolicyBook::new(),
            credits: CreditLedger::new(),
            payout: PayoutTrigger::new(economics.payout, economics.payout_status),
            source,
            outbox: VecDeque::new(),
            config,
        })
    }

    // ---------------------------------------------------------------------
    // Operations
    // ---------------------------------------------------------------------

    /// Pauses or resumes every mutating call. Owner only; works while paused.
    pub fn set_operational(&mut self, caller: &Address, operational: bool) -> Result<()> {
        self.ensure_owner(caller)?;
        if self.operational != operational {
            self.operational = operational;
            if operational {
                info!("▶️ Engine resumed by {}", caller);
            } else {
                warn!("⏸️ Engine paused by {}", caller);
            }
        }
        Ok(())
    }

    /// `caller` nominates or votes for `candidate`.
    pub fn register_airline(&mut self, caller: &Address, candidate: &Address) -> Result<Admission> {
        self.ensure_operational()?;

        let admission = self.voter.register_candidate(&mut self.registry, candidate, caller)?;
        self.clock.tick();

        if admission.is_admitted() {
            self.emit(EngineEvent::CandidatePromoted {
                candidate: candidate.clone(),
            });
        }
        Ok(admission)
    }

    /// Records that `participant` has put in `amount`.
    pub fn fund(&mut self, participant: &Address, amount: Amount) -> Result<()> {
        self.ensure_operational()?;

        let changed = self
            .registry
            .mark_funded(participant, amount, self.config.economics.min_funding)?;
        self.clock.tick();

        if changed {
            info!("🏦 Participant [{}] funded with {}", participant, amount);
        }
        Ok(())
    }

    /// Announces a flight of `caller`, who must be a funded member.
    pub fn register_flight(&mut self, caller: &Address, flight: &str, timestamp: u64) -> Result<SubjectKey> {
        self.ensure_operational()?;
        if !self.registry.is_funded_member(caller) {
            return Err(SuretyError::NotFunded(caller.clone()));
        }

        let key = SubjectKey::new(caller.clone(), flight, timestamp);
        self.flights.check_register(&key)?;

        let now = self.clock.tick();
        self.flights.register(key.clone(), now)?;
        info!("🛫 Flight {} registered", key);

        self.emit(EngineEvent::FlightRegistered { key: key.clone() });
        Ok(key)
    }

    /// Pays the fee and receives the oracle's indices.
    pub fn register_oracle(&mut self, oracle: &Address, fee: Amount) -> Result<Vec<IndexValue>> {
        self.ensure_operational()?;

        let indices = self.oracles.assign(oracle, fee, self.source.as_mut())?;
        self.clock.tick();
        Ok(indices)
    }

    /// Opens a status request for `key` and queues its broadcast.
    pub fn fetch_flight_status(&mut self, requester: &Address, key: SubjectKey) -> Result<StatusRequest> {
        self.ensure_operational()?;

        let now = self.clock.tick();
        let range = self.config.protocol.index_range;
        let request = self
            .requests
            .open_request(key, requester.clone(), now, range, self.source.as_mut());

        self.emit(EngineEvent::StatusRequested {
            key: request.key.clone(),
            index: request.index,
        });
        Ok(request)
    }

    /// Records an oracle answer. The answer that completes the quorum
    /// finalizes the key and settles its policies in the same call.
    pub fn submit_response(
        &mut self,
        oracle: &Address,
        key: &SubjectKey,
        index: IndexValue,
        status: StatusCode,
    ) -> Result<ResponseOutcome> {
        self.ensure_operational()?;

        let outcome = self
            .aggregator
            .submit_response(&self.oracles, &self.requests, oracle, key, index, status)?;
        self.clock.tick();

        if let ResponseOutcome::Finalized(fact) = &outcome {
            self.flights.set_status(key, fact.status);
            self.emit(EngineEvent::FactFinalized {
                key: key.clone(),
                status: fact.status,
            });
            self.settle(key, fact.status);
        }
        Ok(outcome)
    }

    /// Insures `passenger` on `key` for `premium`.
    pub fn buy(&mut self, passenger: &Address, key: &SubjectKey, premium: Amount) -> Result<()> {
        self.ensure_operational()?;
        if !self.registry.is_registered(&key.airline) {
            return Err(SuretyError::UnknownParticipant(key.airline.clone()));
        }
        if self.aggregator.is_finalized(key) {
            return Err(SuretyError::PolicyClosed(key.clone()));
        }

        self.policies
            .buy(passenger.clone(), key.clone(), premium, self.config.economics.max_premium)?;
        self.clock.tick();

        info!("🎫 Passenger [{}] insured {} for {}", passenger, key, premium);
        Ok(())
    }

    /// Owner-triggered settlement of a finalized key.
    ///
    /// Settlement already runs on finalization, so this normally returns an
    /// empty list. Keys that are not final yet have nothing to settle.
    pub fn credit_insurees(&mut self, caller: &Address, key: &SubjectKey) -> Result<Vec<CreditEntry>> {
        self.ensure_operational()?;
        self.ensure_owner(caller)?;

        let Some(status) = self.aggregator.finalized(key).map(|f| f.status) else {
            debug!("Nothing to settle for {}: status not final", key);
            return Ok(Vec::new());
        };

        self.clock.tick();
        Ok(self.settle(key, status))
    }

    /// Releases the passenger's credited balance. The returned amount is
    /// what the external ledger must transfer.
    pub fn withdraw(&mut self, passenger: &Address) -> Result<Amount> {
        self.ensure_operational()?;

        let amount = self.credits.withdraw(passenger)?;
        self.clock.tick();
        Ok(amount)
    }

    /// Takes every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.outbox.drain(..).collect()
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn config(&self) -> &SuretyConfig {
        &self.config
    }

    pub fn now(&self) -> LogicalTime {
        self.clock
    }

    pub fn is_registered(&self, id: &Address) -> bool {
        self.registry.is_registered(id)
    }

    pub fn is_funded(&self, id: &Address) -> bool {
        self.registry.is_funded(id)
    }

    pub fn airline_count(&self) -> usize {
        self.registry.count()
    }

    pub fn participant(&self, id: &Address) -> Option<&Participant> {
        self.registry.participant(id)
    }

    /// Distinct votes currently recorded for a pending candidate.
    pub fn votes_for(&self, candidate: &Address) -> usize {
        self.registry.votes_for(candidate)
    }

    pub fn oracle_indices(&self, oracle: &Address) -> Result<Vec<IndexValue>> {
        self.oracles.indices_of(oracle).map(|indices| indices.to_vec())
    }

    pub fn oracles(&self) -> &OracleIndexAssigner {
        &self.oracles
    }

    pub fn requests_for(&self, key: &SubjectKey) -> Vec<&StatusRequest> {
        self.requests.requests_for(key)
    }

    pub fn flight(&self, key: &SubjectKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    /// Finalized status if any, else the registered flight status, else `Unknown`.
    pub fn flight_status(&self, key: &SubjectKey) -> StatusCode {
        self.aggregator
            .finalized(key)
            .map(|f| f.status)
            .or_else(|| self.flights.get(key).map(|f| f.status))
            .unwrap_or_default()
    }

    pub fn finalized(&self, key: &SubjectKey) -> Option<&FinalizedFact> {
        self.aggregator.finalized(key)
    }

    pub fn respondents(&self, key: &SubjectKey, index: IndexValue, status: StatusCode) -> usize {
        self.aggregator.respondents(key, index, status)
    }

    pub fn policy(&self, passenger: &Address, key: &SubjectKey) -> Option<&InsurancePolicy> {
        self.policies.policy(passenger, key)
    }

    pub fn credit_entry(&self, passenger: &Address, key: &SubjectKey) -> Option<&CreditEntry> {
        self.credits.entry(passenger, key)
    }

    pub fn credit_entries_for(&self, key: &SubjectKey) -> usize {
        self.credits.entries_for(key)
    }

    /// Withdrawable balance of `passenger`.
    pub fn credits_of(&self, passenger: &Address) -> Amount {
        self.credits.balance_of(passenger)
    }

    pub fn pending_events(&self) -> usize {
        self.outbox.len()
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn settle(&mut self, key: &SubjectKey, status: StatusCode) -> Vec<CreditEntry> {
        let credits = self.payout.fire(key, status, &mut self.policies, &mut self.credits);
        for entry in &credits {
            self.emit(EngineEvent::PassengerCredited {
                passenger: entry.passenger.clone(),
                key: entry.key.clone(),
                amount: entry.amount,
            });
        }
        credits
    }

    fn emit(&mut self, event: EngineEvent) {
        debug!("📤 Event queued: {}", event.kind());
        self.outbox.push_back(event);
    }

    fn ensure_operational(&self) -> Result<()> {
        if !self.operational {
            return Err(SuretyError::NotOperational);
        }
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if caller != &self.owner {
            return Err(SuretyError::Unauthorized(caller.clone()));
        }
        Ok(())
    }
}

impl fmt::Debug for SuretyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuretyEngine")
            .field("owner", &self.owner)
            .field("operational", &self.operational)
            .field("clock", &self.clock)
            .field("airlines", &self.registry.count())
            .field("oracles", &self.oracles.len())
            .field("flights", &self.flights.len())
            .field("pending_events", &self.outbox.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ScriptedIndexSource;
    use surety_common::{EconomicParams, PayoutMultiplier};

    fn engine() -> SuretyEngine {
        let config = SuretyConfig::new(EconomicParams::new(10, 1, 100, PayoutMultiplier::new(3, 2)));
        SuretyEngine::new(
            config,
            Address::from("owner"),
            Address::from("airline-0"),
            Box::new(ScriptedIndexSource::new([4])),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = SuretyConfig::new(EconomicParams::new(10, 1, 100, PayoutMultiplier::new(3, 2)));
        config.protocol.quorum = 0;
        let res = SuretyEngine::new(
            config,
            Address::from("owner"),
            Address::from("airline-0"),
            Box::new(ScriptedIndexSource::new([4])),
        );
        assert!(matches!(res, Err(SuretyError::Config(_))));
    }

    #[test]
    fn test_operational_switch() {
        let mut engine = engine();
        let owner = Address::from("owner");
        let first = Address::from("airline-0");

        assert!(matches!(
            engine.set_operational(&first, false),
            Err(SuretyError::Unauthorized(_))
        ));

        engine.set_operational(&owner, false).unwrap();
        assert!(matches!(engine.fund(&first, 10), Err(SuretyError::NotOperational)));
        assert!(!engine.is_funded(&first));

        engine.set_operational(&owner, true).unwrap();
        engine.fund(&first, 10).unwrap();
        assert!(engine.is_funded(&first));
    }

    #[test]
    fn test_failed_calls_do_not_advance_clock() {
        let mut engine = engine();
        let first = Address::from("airline-0");

        let _ = engine.register_airline(&first, &Address::from("airline-1"));
        let _ = engine.fund(&first, 1);
        assert_eq!(engine.now(), LogicalTime(0));
        assert_eq!(engine.pending_events(), 0);

        engine.fund(&first, 10).unwrap();
        assert_eq!(engine.now(), LogicalTime(1));
    }

    #[test]
    fn test_register_flight_requires_funded_airline() {
        let mut engine = engine();
        let first = Address::from("airline-0");

        assert!(matches!(
            engine.register_flight(&first, "XT312", 1_601_737_200_000),
            Err(SuretyError::NotFunded(_))
        ));

        engine.fund(&first, 10).unwrap();
        let key = engine.register_flight(&first, "XT312", 1_601_737_200_000).unwrap();
        assert_eq!(engine.flight_status(&key), StatusCode::Unknown);
        assert!(matches!(
            engine.register_flight(&first, "XT312", 1_601_737_200_000),
            Err(SuretyError::FlightAlreadyRegistered(_))
        ));
        assert_eq!(engine.drain_events(), vec![EngineEvent::FlightRegistered { key }]);
    }

    #[test]
    fn test_buy_checks() {
        let mut engine = engine();
        let passenger = Address::from("passenger");
        let unknown = SubjectKey::new("ghost-airline", "XT312", 1);
        let key = SubjectKey::new("airline-0", "XT312", 1);

        assert!(matches!(
            engine.buy(&passenger, &unknown, 10),
            Err(SuretyError::UnknownParticipant(_))
        ));
        assert!(matches!(
            engine.buy(&passenger, &key, 101),
            Err(SuretyError::InvalidPremium { .. })
        ));
        engine.buy(&passenger, &key, 100).unwrap();
        assert!(matches!(
            engine.buy(&passenger, &key, 100),
            Err(SuretyError::AlreadyInsured { .. })
        ));
    }

    #[test]
    fn test_credit_insurees_is_owner_only() {
        let mut engine = engine();
        let key = SubjectKey::new("airline-0", "XT312", 1);

        assert!(matches!(
            engine.credit_insurees(&Address::from("airline-0"), &key),
            Err(SuretyError::Unauthorized(_))
        ));
        assert!(engine.credit_insurees(&Address::from("owner"), &key).unwrap().is_empty());
    }
}
