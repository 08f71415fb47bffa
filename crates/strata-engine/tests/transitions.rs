// crates/strata-engine/tests/transitions.rs
//
// Transition points fired through the block pipeline, governance scheduling
// rules, and routing handover.

mod common;

use std::sync::Arc;

use common::*;
use serde_json::json;

use strata_core::error::StrataError;
use strata_core::traits::{KvStore, KvWrite};
use strata_economics::pool::{load_pool, EmissionRule};
use strata_engine::{BlockProcessor, OpStatus};
use strata_store::{keys, MemoryStore};

#[test]
fn test_capped_emission_fires_once_at_its_height() {
    let mut chain = new_chain();
    assert!(run(&mut chain, 199, vec![]).transitions.is_empty());

    let outcome = run(&mut chain, 200, vec![]);
    assert_eq!(outcome.transitions, vec!["capped_emission".to_string()]);
    assert_eq!(outcome.outcomes.len(), 1);
    assert!(outcome.outcomes[0].system);
    assert!(outcome.outcomes[0].is_applied());

    let pool = load_pool(&chain.config(), "sps").unwrap().unwrap();
    assert_eq!(
        pool.emission,
        EmissionRule::CappedDynamic {
            tokens_per_block: amt("10")
        }
    );

    assert!(run(&mut chain, 200, vec![]).skipped);
    assert!(run(&mut chain, 201, vec![]).transitions.is_empty());
}

#[test]
fn test_applied_marker_prevents_refire_after_restart() {
    let store = Arc::new(MemoryStore::new());
    let genesis = standard_genesis();
    {
        let mut chain = processor_on(store.clone(), &genesis);
        run(&mut chain, 200, vec![]);
    }
    // Simulate a crash that lost the last-block record but kept the marker.
    store.write_batch(&[KvWrite::Delete(keys::LAST_BLOCK.to_vec())]).unwrap();

    let mut chain = processor_on(store.clone(), &genesis);
    assert_eq!(chain.last_block(), None);
    let outcome = run(&mut chain, 200, vec![]);
    assert!(outcome.transitions.is_empty());
    assert!(outcome.outcomes.is_empty());
}

#[test]
fn test_users_cannot_invoke_transition_operations() {
    let mut chain = new_chain();
    let outcome = run(
        &mut chain,
        5,
        vec![
            ("alice", "transition_capped_emission", json!({})),
            (
                "gov",
                "transition_config",
                json!({"writes": [{"group": "governance", "key": "admins", "value": ["alice"]}]}),
            ),
        ],
    );
    assert_eq!(outcome.rejected(), 2);
    let pool = load_pool(&chain.config(), "sps").unwrap().unwrap();
    assert!(pool.emission.is_fixed());
}

#[test]
fn test_bookkeeping_update_enables_burn() {
    let mut chain = new_chain();
    let early = run(&mut chain, 140, vec![("alice", "token_transfer", transfer("$BURN", "10"))]);
    assert!(rejection(&early, 0).contains("reserved"));

    let outcome = run(&mut chain, 150, vec![]);
    assert_eq!(outcome.transitions, vec!["bookkeeping_update".to_string()]);
    let bookkeeping = chain
        .config()
        .string_list("ledger", "bookkeeping_accounts")
        .unwrap();
    assert!(bookkeeping.contains(&"$BURN".to_string()));
    assert!(bookkeeping.contains(&REWARDS.to_string()));
    assert_eq!(bookkeeping.iter().filter(|a| *a == "$MINTING").count(), 1);

    let burn = run(&mut chain, 151, vec![("alice", "token_transfer", transfer("$BURN", "10"))]);
    assert_eq!(burn.applied(), 1);
    assert_eq!(balance(&mut chain, "$BURN", "SPS"), amt("10"));
    assert_eq!(supply(&mut chain, "SPS"), amt("0"));
}

#[test]
fn test_governance_moves_only_unreached_points() {
    let mut chain = new_chain();
    let schedule = |key: &str, height: u64| {
        json!({"group": "transitions", "key": key, "value": height})
    };

    let moved = run(
        &mut chain,
        120,
        vec![("gov", "update_config", schedule("capped_emission", 300))],
    );
    assert_eq!(moved.applied(), 1);
    assert_eq!(chain.config().transition_height("capped_emission").unwrap(), Some(300));

    let outcome = run(
        &mut chain,
        130,
        vec![
            ("gov", "update_config", schedule("replay_keys", 500)),
            ("gov", "update_config", schedule("capped_emission", 130)),
            ("alice", "update_config", schedule("capped_emission", 400)),
        ],
    );
    assert!(rejection(&outcome, 0).contains("cannot change"));
    assert!(rejection(&outcome, 1).contains("scheduled after"));
    assert!(is_rejected(&outcome, 2));
    assert_eq!(chain.config().transition_height("replay_keys").unwrap(), Some(100));

    // The old height no longer fires; the new one does.
    assert!(run(&mut chain, 200, vec![]).transitions.is_empty());
    assert_eq!(run(&mut chain, 300, vec![]).transitions, vec!["capped_emission".to_string()]);
}

#[test]
fn test_startup_requires_scheduled_route_transitions() {
    let mut genesis = standard_genesis();
    genesis.config.remove("transitions");
    let mut processor = BlockProcessor::open(Arc::new(MemoryStore::new())).unwrap();
    assert!(processor.apply_genesis(&genesis).unwrap());
    assert!(matches!(
        processor.validate_startup(),
        Err(StrataError::Configuration(_))
    ));
}

#[test]
fn test_genesis_applied_once() {
    let store = Arc::new(MemoryStore::new());
    let genesis = standard_genesis();
    let mut first = BlockProcessor::open(store.clone()).unwrap();
    assert!(first.apply_genesis(&genesis).unwrap());
    assert!(!first.apply_genesis(&genesis).unwrap());

    let mut reopened = BlockProcessor::open(store).unwrap();
    assert!(!reopened.apply_genesis(&genesis).unwrap());
    assert_eq!(balance(&mut reopened, "alice", "SPS"), amt("1000"));
    assert_eq!(balance(&mut reopened, "$MINTING", "SPS"), amt("-3000"));
}

#[test]
fn test_invalid_genesis_pool_is_configuration_error() {
    let mut genesis = standard_genesis();
    let mut pool = sps_pool();
    pool.unstaking_periods = 0;
    genesis
        .config
        .get_mut("staking_pools")
        .unwrap()
        .insert("sps".to_string(), serde_json::to_value(pool).unwrap());

    let store = Arc::new(MemoryStore::new());
    let mut processor = BlockProcessor::open(store.clone()).unwrap();
    assert!(matches!(
        processor.apply_genesis(&genesis),
        Err(StrataError::Configuration(_))
    ));
    assert!(store.is_empty());
}

#[test]
fn test_oracle_price_visible_to_later_operations_only_after_commit() {
    let mut chain = new_chain();
    let outcome = run(
        &mut chain,
        3,
        vec![
            ("alice", "price_feed", json!({"token": "SPS", "price": "0.5"})),
            ("oracle", "price_feed", json!({"token": "SPS", "price": "0.25"})),
        ],
    );
    assert!(is_rejected(&outcome, 0));
    match &outcome.outcomes[1].status {
        OpStatus::Applied { events } => assert_eq!(events[0].table, "price_history"),
        other => panic!("unexpected {:?}", other),
    }
    let price = chain.config().price("SPS").cloned().unwrap();
    assert_eq!(price.usd, amt("0.25"));
    assert_eq!(price.block_num, 3);
}
