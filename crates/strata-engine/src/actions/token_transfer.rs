// crates/strata-engine/src/actions/token_transfer.rs
//
// `token_transfer {to, qty, token, memo?, key?}`
//
// V1 ignores any replay key. V2 takes over at the `replay_keys` transition
// point and records the key before moving value, so a duplicate from the same
// sender is rejected with no ledger effect.

use serde::Deserialize;

use strata_core::account::{is_reserved, is_valid_account};
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::{AuthLevel, Operation};
use strata_economics::ledger::{self, is_bookkeeping};
use strata_economics::pool::is_stake_token;
use strata_economics::replay;
use strata_store::Transaction;

use crate::action::{parse_payload, Action};

pub const OP_NAME: &str = "token_transfer";

#[derive(Debug, Clone, Deserialize)]
pub struct TransferPayload {
    pub to: String,
    pub qty: Amount,
    pub token: String,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

pub struct TokenTransfer {
    account: String,
    auth: AuthLevel,
    payload: TransferPayload,
    replay_keys: bool,
}

impl TokenTransfer {
    pub fn v1(op: &Operation) -> Result<Self, StrataError> {
        Self::build(op, false)
    }

    pub fn v2(op: &Operation) -> Result<Self, StrataError> {
        Self::build(op, true)
    }

    fn build(op: &Operation, replay_keys: bool) -> Result<Self, StrataError> {
        Ok(Self {
            account: op.account.clone(),
            auth: op.auth,
            payload: parse_payload(op)?,
            replay_keys,
        })
    }
}

impl Action for TokenTransfer {
    fn name(&self) -> &'static str {
        OP_NAME
    }

    fn is_supported(&self) -> bool {
        self.auth == AuthLevel::Active
    }

    fn validate(&self, tx: &Transaction<'_>) -> Result<(), StrataError> {
        let p = &self.payload;
        if !is_valid_account(&p.to) || p.to == self.account {
            return Err(StrataError::rejected("invalid recipient"));
        }
        // Reserved accounts only receive user funds when they burn them.
        if is_reserved(&p.to) && !is_bookkeeping(tx, &p.to)? {
            return Err(StrataError::rejected(format!(
                "cannot transfer to reserved account {}",
                p.to
            )));
        }
        if !p.qty.is_positive() {
            return Err(StrataError::rejected("qty must be positive"));
        }
        if is_stake_token(tx.config(), &p.token)? {
            return Err(StrataError::rejected(format!(
                "{} is a stake token and cannot be transferred",
                p.token
            )));
        }
        Ok(())
    }

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError> {
        let p = &self.payload;
        let mut events = Vec::new();
        if self.replay_keys {
            if let Some(key) = &p.key {
                events.extend(replay::check_and_record(tx, &self.account, key)?);
            }
        }
        events.extend(ledger::transfer(
            tx,
            &self.account,
            &self.account,
            &p.to,
            &p.token,
            p.qty,
            p.memo.as_deref().unwrap_or(OP_NAME),
        )?);
        Ok(events)
    }
}
