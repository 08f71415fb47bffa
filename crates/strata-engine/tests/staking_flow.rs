// crates/strata-engine/tests/staking_flow.rs
//
// Staking through blocks: gating, reward sharing, installment unstaking and
// governance changes to a live pool.

mod common;

use common::*;
use serde_json::json;

use strata_economics::pool::EmissionRule;
use strata_economics::staking;

fn stake(qty: &str) -> serde_json::Value {
    json!({"token": "SPS", "qty": qty})
}

fn token_only() -> serde_json::Value {
    json!({"token": "SPS"})
}

#[test]
fn test_staking_gated_until_reward_start() {
    let mut chain = new_chain();
    let early = run(&mut chain, 19, vec![("alice", "stake_tokens", stake("100"))]);
    assert!(rejection(&early, 0).contains("no handler"));

    let open = run(&mut chain, 20, vec![("alice", "stake_tokens", stake("100"))]);
    assert_eq!(open.applied(), 1);
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("900"));
    assert_eq!(balance(&mut chain, "alice", "SPSP"), amt("100"));
}

#[test]
fn test_equal_stakes_earn_equal_rewards() {
    let mut chain = new_chain();
    run(
        &mut chain,
        20,
        vec![
            ("alice", "stake_tokens", stake("100")),
            ("bob", "stake_tokens", stake("100")),
        ],
    );
    // carol joins mid-period with twice the stake.
    run(&mut chain, 25, vec![("carol", "stake_tokens", stake("200"))]);
    let outcome = run(
        &mut chain,
        30,
        vec![
            ("alice", "claim_staking_rewards", token_only()),
            ("bob", "claim_staking_rewards", token_only()),
            ("carol", "claim_staking_rewards", token_only()),
        ],
    );
    assert_eq!(outcome.applied(), 3);

    // 5 blocks at 10/block over 200 staked, then 5 blocks over 400.
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("937.5"));
    assert_eq!(balance(&mut chain, "bob", "SPS"), amt("937.5"));
    assert_eq!(balance(&mut chain, "carol", "SPS"), amt("825"));
    assert_eq!(balance(&mut chain, "$STAKING_REWARDS_POOL", "SPS"), amt("0"));
    assert_eq!(supply(&mut chain, "SPS"), amt("0"));
}

#[test]
fn test_claim_allowed_with_posting_authority() {
    let mut chain = new_chain();
    run(&mut chain, 20, vec![("alice", "stake_tokens", stake("100"))]);

    let mut claim = block(30, vec![("alice", "claim_staking_rewards", token_only())]);
    claim.operations[0].auth = strata_core::operation::AuthLevel::Posting;
    let outcome = chain.process_block(&claim).unwrap();
    assert_eq!(outcome.applied(), 1);
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("1000"));

    let mut unstake = block(31, vec![("alice", "unstake_tokens", stake("10"))]);
    unstake.operations[0].auth = strata_core::operation::AuthLevel::Posting;
    let outcome = chain.process_block(&unstake).unwrap();
    assert!(rejection(&outcome, 0).contains("not supported"));
}

#[test]
fn test_unstake_released_in_installments() {
    let mut chain = new_chain();
    run(&mut chain, 20, vec![("alice", "stake_tokens", stake("100"))]);
    run(&mut chain, 21, vec![("alice", "unstake_tokens", stake("100"))]);

    let double = run(&mut chain, 22, vec![("alice", "unstake_tokens", stake("10"))]);
    assert!(rejection(&double, 0).contains("pending unstake"));

    let before = run(&mut chain, 30, vec![]);
    assert_eq!(before.unstakes_released, 0);
    assert_eq!(balance(&mut chain, "alice", "SPSP"), amt("100"));

    let mut released = Vec::new();
    for num in [31u64, 41, 51, 61] {
        let outcome = run(&mut chain, num, vec![]);
        assert_eq!(outcome.unstakes_released, 1, "block {}", num);
        released.push(balance(&mut chain, "alice", "SPSP"));
    }
    assert_eq!(released, vec![amt("75"), amt("50"), amt("25"), amt("0")]);

    let pending = chain
        .view(|tx| staking::pending_unstake(tx, "alice", "SPS"))
        .unwrap();
    assert!(pending.is_none());
    assert_eq!(run(&mut chain, 71, vec![]).unstakes_released, 0);

    // Principal is back and every emitted reward landed with the sole staker,
    // less rounding dust.
    let liquid = balance(&mut chain, "alice", "SPS");
    assert!(liquid > amt("1409.99"), "alice holds {}", liquid);
    assert!(liquid <= amt("1410"), "alice holds {}", liquid);
    assert_eq!(supply(&mut chain, "SPS"), amt("0"));
    assert_eq!(supply(&mut chain, "SPSP"), amt("0"));
}

#[test]
fn test_cancel_unstake_stops_releases() {
    let mut chain = new_chain();
    run(&mut chain, 20, vec![("alice", "stake_tokens", stake("100"))]);
    run(&mut chain, 21, vec![("alice", "unstake_tokens", stake("100"))]);
    run(&mut chain, 31, vec![]);
    let cancel = run(&mut chain, 32, vec![("alice", "cancel_unstake_tokens", token_only())]);
    assert_eq!(cancel.applied(), 1);

    assert_eq!(run(&mut chain, 41, vec![]).unstakes_released, 0);
    assert_eq!(balance(&mut chain, "alice", "SPSP"), amt("75"));

    let again = run(&mut chain, 42, vec![("alice", "cancel_unstake_tokens", token_only())]);
    assert!(is_rejected(&again, 0));
}

#[test]
fn test_governance_pool_change_settles_old_rule() {
    let mut chain = new_chain();
    run(&mut chain, 20, vec![("alice", "stake_tokens", stake("100"))]);

    let mut faster = sps_pool();
    faster.emission = EmissionRule::Fixed {
        tokens_per_block: amt("20"),
    };
    let update = json!({"group": "staking_pools", "key": "sps", "value": faster});

    let outcome = run(
        &mut chain,
        30,
        vec![
            ("alice", "update_config", update.clone()),
            ("gov", "update_config", update),
        ],
    );
    assert!(rejection(&outcome, 0).contains("admins"));
    assert!(!is_rejected(&outcome, 1));

    run(&mut chain, 40, vec![("alice", "claim_staking_rewards", token_only())]);
    // 10 blocks at 10 under the old rule, 10 blocks at 20 under the new one.
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("1200"));
}

#[test]
fn test_governance_cannot_swap_pool_tokens() {
    let mut chain = new_chain();
    let mut swapped = sps_pool();
    swapped.stake_token = "SPSX".to_string();
    let outcome = run(
        &mut chain,
        5,
        vec![(
            "gov",
            "update_config",
            json!({"group": "staking_pools", "key": "sps", "value": swapped}),
        )],
    );
    assert!(rejection(&outcome, 0).contains("cannot change"));
}

#[test]
fn test_governance_cannot_switch_reward_token() {
    let mut chain = new_chain();
    run(&mut chain, 20, vec![("alice", "stake_tokens", stake("100"))]);

    let mut voucher = sps_pool();
    voucher.reward_token = "VOUCHER".to_string();
    let outcome = run(
        &mut chain,
        30,
        vec![(
            "gov",
            "update_config",
            json!({"group": "staking_pools", "key": "sps", "value": voucher}),
        )],
    );
    assert!(rejection(&outcome, 0).contains("reward token"));

    // The pool keeps paying in SPS.
    let claim = run(&mut chain, 31, vec![("alice", "claim_staking_rewards", token_only())]);
    assert_eq!(claim.applied(), 1);
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("1010"));
    assert_eq!(balance(&mut chain, "alice", "VOUCHER"), amt("0"));
}

#[test]
fn test_reward_start_must_stay_a_block_number() {
    let mut chain = new_chain();
    let outcome = run(
        &mut chain,
        21,
        vec![(
            "gov",
            "update_config",
            json!({"group": "staking", "key": "reward_start_block", "value": "soon"}),
        )],
    );
    assert!(rejection(&outcome, 0).contains("block number"));

    let next = run(&mut chain, 22, vec![("alice", "stake_tokens", stake("100"))]);
    assert_eq!(next.applied(), 1);
    assert_eq!(balance(&mut chain, "alice", "SPSP"), amt("100"));
}
