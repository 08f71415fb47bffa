// crates/strata-engine/tests/ledger_properties.rs
//
// Ledger invariants observed through the block pipeline: conservation,
// non-negativity of ordinary accounts, and replay-key idempotency.

mod common;

use common::*;
use serde_json::json;

use strata_economics::ledger;

fn check_books(processor: &mut strata_engine::BlockProcessor) {
    assert_eq!(supply(processor, "SPS"), amt("0"));
    let negative = processor
        .view(|tx| {
            let mut negative = Vec::new();
            for record in ledger::holders(tx, "SPS")? {
                if record.balance.is_negative() && !ledger::is_bookkeeping(tx, &record.account)? {
                    negative.push(record.account);
                }
            }
            Ok(negative)
        })
        .unwrap();
    assert!(negative.is_empty(), "negative ordinary balances: {:?}", negative);
}

#[test]
fn test_conservation_across_mixed_blocks() {
    let mut chain = new_chain();
    let accounts = ["alice", "bob", "carol"];

    for num in 1..=60u64 {
        let from = accounts[(num % 3) as usize];
        let to = accounts[((num + 1) % 3) as usize];
        // Every seventh block tries to overdraw.
        let qty = if num % 7 == 0 { "5000" } else { "12.5" };
        let outcome = run(&mut chain, num, vec![(from, "token_transfer", transfer(to, qty))]);
        assert_eq!(outcome.outcomes.len(), 1);
        assert_eq!(is_rejected(&outcome, 0), num % 7 == 0, "block {}", num);
        check_books(&mut chain);
    }

    let total: strata_core::amount::Amount = accounts
        .iter()
        .map(|a| balance(&mut chain, a, "SPS"))
        .fold(amt("0"), |acc, b| acc.checked_add(b).unwrap());
    assert_eq!(total, amt("3000"));
}

#[test]
fn test_overdraft_rejected_and_state_unchanged() {
    let mut chain = new_chain();
    run(&mut chain, 1, vec![("alice", "token_transfer", transfer("dave", "999"))]);
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("1"));

    let outcome = run(&mut chain, 2, vec![("alice", "token_transfer", transfer("bob", "100"))]);
    assert!(rejection(&outcome, 0).contains("insufficient"));
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("1"));
    assert_eq!(balance(&mut chain, "bob", "SPS"), amt("1000"));
    check_books(&mut chain);
}

#[test]
fn test_rejection_does_not_abort_block() {
    let mut chain = new_chain();
    let outcome = run(
        &mut chain,
        1,
        vec![
            ("alice", "token_transfer", transfer("bob", "10")),
            ("alice", "token_transfer", transfer("bob", "0")),
            ("alice", "no_such_operation", json!({})),
            ("alice", "token_transfer", transfer("carol", "5")),
        ],
    );
    assert_eq!(outcome.applied(), 2);
    assert_eq!(outcome.rejected(), 2);
    assert!(rejection(&outcome, 2).contains("no handler"));
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("985"));
    assert_eq!(balance(&mut chain, "carol", "SPS"), amt("1005"));
}

#[test]
fn test_reserved_sender_and_recipient_rejected() {
    let mut chain = new_chain();
    let outcome = run(
        &mut chain,
        1,
        vec![
            ("$MINTING", "token_transfer", transfer("alice", "10")),
            ("alice", "token_transfer", transfer("$STAKING_REWARDS_POOL", "10")),
            ("alice", "token_transfer", json!({"to": "bob", "qty": "10", "token": "SPSP"})),
        ],
    );
    assert!(rejection(&outcome, 0).contains("reserved"));
    assert!(is_rejected(&outcome, 1));
    assert!(is_rejected(&outcome, 2));
    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("1000"));
}

#[test]
fn test_account_names_with_separators_rejected() {
    let mut chain = new_chain();
    let keyed = |key: &str| json!({"to": "bob", "qty": "1", "token": "SPS", "key": key});
    let outcome = run(
        &mut chain,
        100,
        vec![
            ("bob", "token_transfer", transfer("alice:SPS", "7")),
            ("alice:b", "token_transfer", keyed("c")),
            ("alice", "token_transfer", keyed("b:c")),
        ],
    );
    assert!(rejection(&outcome, 0).contains("recipient"));
    assert!(rejection(&outcome, 1).contains("invalid account"));
    assert!(!is_rejected(&outcome, 2));

    let rows = chain.view(|tx| ledger::history(tx, "alice", "SPS")).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.account == "alice"));
    assert_eq!(balance(&mut chain, "bob", "SPS"), amt("1001"));
}

#[test]
fn test_replay_keys_ignored_before_transition() {
    let mut chain = new_chain();
    let keyed = json!({"to": "bob", "qty": "10", "token": "SPS", "key": "k1"});
    let outcome = run(
        &mut chain,
        50,
        vec![
            ("alice", "token_transfer", keyed.clone()),
            ("alice", "token_transfer", keyed),
        ],
    );
    assert_eq!(outcome.applied(), 2);
    assert_eq!(balance(&mut chain, "bob", "SPS"), amt("1020"));
}

#[test]
fn test_replay_key_idempotent_after_transition() {
    let mut chain = new_chain();
    let keyed = json!({"to": "bob", "qty": "10", "token": "SPS", "key": "k1"});

    let first = run(&mut chain, 100, vec![("alice", "token_transfer", keyed.clone())]);
    assert_eq!(first.applied(), 1);

    let second = run(
        &mut chain,
        101,
        vec![
            ("alice", "token_transfer", keyed.clone()),
            // Keys are scoped per sender.
            ("carol", "token_transfer", keyed),
        ],
    );
    assert!(rejection(&second, 0).contains("k1"));
    assert!(!is_rejected(&second, 1));

    assert_eq!(balance(&mut chain, "alice", "SPS"), amt("990"));
    assert_eq!(balance(&mut chain, "carol", "SPS"), amt("990"));
    assert_eq!(balance(&mut chain, "bob", "SPS"), amt("1020"));
}
