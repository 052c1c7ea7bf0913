use surety_common::{
    Address, EconomicParams, EngineEvent, IndexValue, PayoutMultiplier, StatusCode, SubjectKey, SuretyConfig,
    SuretyError,
};
use surety_consensus::{ResponseOutcome, ScriptedIndexSource, SuretyEngine};
use surety_ledger::PolicyStatus;

fn addr(name: &str) -> Address {
    Address::from(name)
}

struct Fixture {
    engine: SuretyEngine,
    key: SubjectKey,
    oracles: Vec<Address>,
}

/// One funded airline with one flight and the named oracles, which draw
/// their indices from `script` in registration order.
fn fixture_with(script: &[IndexValue], names: &[&str]) -> Fixture {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = SuretyConfig::new(EconomicParams::new(10, 1, 100, PayoutMultiplier::new(3, 2)));
    let source = ScriptedIndexSource::new(script.iter().copied());
    let mut engine = SuretyEngine::new(config, addr("owner"), addr("airline-0"), Box::new(source)).unwrap();

    engine.fund(&addr("airline-0"), 10).unwrap();
    let key = engine.register_flight(&addr("airline-0"), "XT312", 1_601_737_200_000).unwrap();

    let oracles: Vec<Address> = names.iter().map(|o| addr(o)).collect();
    for oracle in &oracles {
        engine.register_oracle(oracle, 1).unwrap();
    }

    engine.drain_events();
    Fixture { engine, key, oracles }
}

/// oracle-a holds {1,4,7}, oracle-b {4,2,3}, oracle-c {4,5,6}, oracle-d {8,9,0}.
/// Requests then draw 4, 4 and 1.
fn fixture() -> Fixture {
    let fx = fixture_with(
        &[1, 4, 7, 4, 2, 3, 4, 5, 6, 8, 9, 0, 4, 4, 1],
        &["oracle-a", "oracle-b", "oracle-c", "oracle-d"],
    );
    assert_eq!(fx.engine.oracle_indices(&fx.oracles[0]).unwrap(), vec![1, 4, 7]);
    fx
}

fn open_request(fx: &mut Fixture) {
    let request = fx.engine.fetch_flight_status(&addr("passenger-1"), fx.key.clone()).unwrap();
    assert_eq!(request.index, 4);
}

#[test]
fn test_third_matching_answer_finalizes() {
    let mut fx = fixture();
    open_request(&mut fx);
    assert_eq!(
        fx.engine.drain_events(),
        vec![EngineEvent::StatusRequested { key: fx.key.clone(), index: 4 }]
    );

    for (i, oracle) in fx.oracles.iter().take(2).enumerate() {
        let out = fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::LateAirline).unwrap();
        assert_eq!(out, ResponseOutcome::Recorded { votes: i + 1 });
        assert!(fx.engine.finalized(&fx.key).is_none());
        assert_eq!(fx.engine.flight_status(&fx.key), StatusCode::Unknown);
    }

    let out = fx.engine.submit_response(&fx.oracles[2], &fx.key, 4, StatusCode::LateAirline).unwrap();
    let ResponseOutcome::Finalized(fact) = out else {
        panic!("expected finalization, got {:?}", out);
    };
    assert_eq!(fact.status, StatusCode::LateAirline);
    assert_eq!(fact.index, 4);
    assert_eq!(fact.respondents, fx.oracles[..3].to_vec());
    assert_eq!(fx.engine.flight_status(&fx.key), StatusCode::LateAirline);
    assert_eq!(
        fx.engine.flight(&fx.key).map(|f| f.status),
        Some(StatusCode::LateAirline)
    );

    let events = fx.engine.drain_events();
    assert_eq!(
        events,
        vec![EngineEvent::FactFinalized { key: fx.key.clone(), status: StatusCode::LateAirline }]
    );
}

#[test]
fn test_finalized_fact_is_immutable() {
    let mut fx = fixture();
    open_request(&mut fx);

    for oracle in fx.oracles.iter().take(3) {
        fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::OnTime).unwrap();
    }
    assert_eq!(fx.engine.flight_status(&fx.key), StatusCode::OnTime);

    // The same oracles change their minds; nothing moves
    for oracle in fx.oracles.iter().take(3) {
        let out = fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::LateAirline).unwrap();
        assert_eq!(out, ResponseOutcome::AlreadyFinalized { status: StatusCode::OnTime });
    }
    assert_eq!(fx.engine.flight_status(&fx.key), StatusCode::OnTime);
    assert_eq!(fx.engine.respondents(&fx.key, 4, StatusCode::LateAirline), 3);
}

#[test]
fn test_rejected_answers_change_nothing() {
    let mut fx = fixture();
    open_request(&mut fx);
    fx.engine.drain_events();
    let before = fx.engine.now();

    // oracle-d does not hold index 4
    let res = fx.engine.submit_response(&fx.oracles[3], &fx.key, 4, StatusCode::OnTime);
    assert!(matches!(res, Err(SuretyError::IndexMismatch { index: 4, .. })));

    let res = fx.engine.submit_response(&addr("stranger"), &fx.key, 4, StatusCode::OnTime);
    assert!(matches!(res, Err(SuretyError::UnknownOracle(_))));

    // oracle-a holds 7 but no request is open there
    let res = fx.engine.submit_response(&fx.oracles[0], &fx.key, 7, StatusCode::OnTime);
    assert!(matches!(res, Err(SuretyError::NoOpenRequest { index: 7, .. })));

    // no request at all for another flight
    let other = SubjectKey::new("airline-0", "XT999", 1);
    let res = fx.engine.submit_response(&fx.oracles[0], &other, 4, StatusCode::OnTime);
    assert!(matches!(res, Err(SuretyError::NoOpenRequest { .. })));

    assert_eq!(fx.engine.respondents(&fx.key, 4, StatusCode::OnTime), 0);
    assert_eq!(fx.engine.respondents(&fx.key, 7, StatusCode::OnTime), 0);
    assert_eq!(fx.engine.now(), before);
    assert!(fx.engine.drain_events().is_empty());
}

#[test]
fn test_oracle_registration_rules() {
    let mut fx = fixture();

    let res = fx.engine.register_oracle(&fx.oracles[0], 1);
    assert!(matches!(res, Err(SuretyError::OracleAlreadyRegistered(_))));
    assert_eq!(fx.engine.oracle_indices(&fx.oracles[0]).unwrap(), vec![1, 4, 7]);

    let res = fx.engine.register_oracle(&addr("oracle-e"), 0);
    assert!(matches!(res, Err(SuretyError::InsufficientFee { required: 1, provided: 0 })));
    assert!(matches!(
        fx.engine.oracle_indices(&addr("oracle-e")),
        Err(SuretyError::UnknownOracle(_))
    ));
}

#[test]
fn test_passengers_are_credited_once() {
    let mut fx = fixture();
    let (p1, p2) = (addr("passenger-1"), addr("passenger-2"));
    fx.engine.buy(&p1, &fx.key, 100).unwrap();
    fx.engine.buy(&p2, &fx.key, 40).unwrap();

    open_request(&mut fx);
    for oracle in fx.oracles.iter().take(3) {
        fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::LateAirline).unwrap();
    }

    assert_eq!(fx.engine.credit_entries_for(&fx.key), 2);
    assert_eq!(fx.engine.credits_of(&p1), 150);
    assert_eq!(fx.engine.credits_of(&p2), 60);
    assert_eq!(fx.engine.policy(&p1, &fx.key).map(|p| p.status), Some(PolicyStatus::Credited));

    let credited: Vec<Address> = fx
        .engine
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            EngineEvent::PassengerCredited { passenger, .. } => Some(passenger),
            _ => None,
        })
        .collect();
    assert_eq!(credited.len(), 2);

    // A second trigger is a no-op
    let again = fx.engine.credit_insurees(&addr("owner"), &fx.key).unwrap();
    assert!(again.is_empty());
    assert_eq!(fx.engine.credit_entries_for(&fx.key), 2);
    assert_eq!(fx.engine.credits_of(&p1), 150);
    assert!(fx.engine.drain_events().is_empty());

    // Late answers after settlement do not pay again
    fx.engine.submit_response(&fx.oracles[1], &fx.key, 4, StatusCode::LateAirline).unwrap();
    assert_eq!(fx.engine.credits_of(&p2), 60);
}

#[test]
fn test_non_payout_status_expires_policies() {
    let mut fx = fixture();
    let p1 = addr("passenger-1");
    fx.engine.buy(&p1, &fx.key, 100).unwrap();

    open_request(&mut fx);
    for oracle in fx.oracles.iter().take(3) {
        fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::LateWeather).unwrap();
    }

    assert_eq!(fx.engine.credits_of(&p1), 0);
    assert!(fx.engine.credit_entry(&p1, &fx.key).is_none());
    assert_eq!(fx.engine.policy(&p1, &fx.key).map(|p| p.status), Some(PolicyStatus::Expired));

    let res = fx.engine.buy(&addr("passenger-2"), &fx.key, 10);
    assert!(matches!(res, Err(SuretyError::PolicyClosed(_))));
}

#[test]
fn test_withdraw_releases_balance_once() {
    let mut fx = fixture();
    let p1 = addr("passenger-1");
    fx.engine.buy(&p1, &fx.key, 20).unwrap();

    open_request(&mut fx);
    for oracle in fx.oracles.iter().take(3) {
        fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::LateAirline).unwrap();
    }

    assert_eq!(fx.engine.withdraw(&p1).unwrap(), 30);
    assert_eq!(fx.engine.credits_of(&p1), 0);
    assert!(matches!(fx.engine.withdraw(&p1), Err(SuretyError::NothingToWithdraw(_))));
}

#[test]
fn test_paused_engine_rejects_answers() {
    let mut fx = fixture();
    open_request(&mut fx);

    fx.engine.set_operational(&addr("owner"), false).unwrap();
    let res = fx.engine.submit_response(&fx.oracles[0], &fx.key, 4, StatusCode::OnTime);
    assert!(matches!(res, Err(SuretyError::NotOperational)));
    assert_eq!(fx.engine.respondents(&fx.key, 4, StatusCode::OnTime), 0);

    fx.engine.set_operational(&addr("owner"), true).unwrap();
    assert!(fx.engine.submit_response(&fx.oracles[0], &fx.key, 4, StatusCode::OnTime).is_ok());
}

#[test]
fn test_repeated_fetch_keeps_first_request() {
    let mut fx = fixture();
    open_request(&mut fx);
    let first = fx.engine.requests_for(&fx.key)[0].clone();
    fx.engine.drain_events();

    // the second draw lands on 4 again and reuses the open slot
    let second = fx.engine.fetch_flight_status(&addr("passenger-2"), fx.key.clone()).unwrap();
    assert_eq!(second, first);
    assert_eq!(second.requester, addr("passenger-1"));

    let requests = fx.engine.requests_for(&fx.key);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].opened_at, first.opened_at);
    assert!(fx.engine.now() > first.opened_at);
}

#[test]
fn test_repeated_fetch_opens_new_index() {
    let mut fx = fixture();
    open_request(&mut fx);
    fx.engine.fetch_flight_status(&addr("passenger-2"), fx.key.clone()).unwrap();
    let first_opened = fx.engine.requests_for(&fx.key)[0].opened_at;

    let third = fx.engine.fetch_flight_status(&addr("passenger-3"), fx.key.clone()).unwrap();
    assert_eq!(third.index, 1);
    assert_eq!(third.requester, addr("passenger-3"));

    let requests = fx.engine.requests_for(&fx.key);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].opened_at, first_opened);
    assert_eq!(requests[1].index, 1);
    assert!(requests[1].opened_at > first_opened);
}

#[test]
fn test_other_index_cannot_overturn_finalized_fact() {
    // three oracles that all hold {4,1,9}; requests open at 4 then 1
    let mut fx = fixture_with(&[4, 1, 9, 4, 1, 9, 4, 1, 9, 4, 1], &["oracle-a", "oracle-b", "oracle-c"]);
    let passenger = addr("passenger-1");
    fx.engine.buy(&passenger, &fx.key, 100).unwrap();

    let at_4 = fx.engine.fetch_flight_status(&passenger, fx.key.clone()).unwrap();
    let at_1 = fx.engine.fetch_flight_status(&addr("passenger-2"), fx.key.clone()).unwrap();
    assert_eq!((at_4.index, at_1.index), (4, 1));
    assert_eq!(fx.engine.requests_for(&fx.key).len(), 2);

    for oracle in &fx.oracles {
        fx.engine.submit_response(oracle, &fx.key, 4, StatusCode::OnTime).unwrap();
    }
    assert_eq!(fx.engine.flight_status(&fx.key), StatusCode::OnTime);
    fx.engine.drain_events();

    // a full quorum for a payout status at the other index
    for oracle in &fx.oracles {
        let out = fx.engine.submit_response(oracle, &fx.key, 1, StatusCode::LateAirline).unwrap();
        assert_eq!(out, ResponseOutcome::AlreadyFinalized { status: StatusCode::OnTime });
    }

    assert_eq!(fx.engine.respondents(&fx.key, 1, StatusCode::LateAirline), 3);
    assert_eq!(fx.engine.flight_status(&fx.key), StatusCode::OnTime);
    assert_eq!(fx.engine.finalized(&fx.key).map(|f| (f.status, f.index)), Some((StatusCode::OnTime, 4)));
    assert_eq!(fx.engine.credits_of(&passenger), 0);
    assert!(fx.engine.credit_entry(&passenger, &fx.key).is_none());
    assert_eq!(fx.engine.credit_entries_for(&fx.key), 0);
    assert_eq!(fx.engine.policy(&passenger, &fx.key).map(|p| p.status), Some(PolicyStatus::Expired));
    assert!(fx.engine.drain_events().is_empty());
}
