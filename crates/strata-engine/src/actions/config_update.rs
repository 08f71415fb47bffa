// crates/strata-engine/src/actions/config_update.rs
//
// `update_config {group, key, value}` - the governed write path for every
// config group. Only `governance.admins` may submit it.
//
// Writes go through `Transaction::set_config`, which persists the value and
// stages it in the snapshot shadow, so the change is visible to later reads in
// this operation and to later operations only once committed.

use serde::Deserialize;
use serde_json::{json, Value};

use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::{AuthLevel, Operation};
use strata_economics::accumulator::{load_or_init, load_state, save_state, settle_pool};
use strata_economics::ledger::BOOKKEEPING_KEY;
use strata_economics::pool::{load_pool, load_pools, StakingPoolConfig};
use strata_store::snapshot::groups;
use strata_store::Transaction;

use crate::action::{parse_payload, require_listed, Action};
use crate::route::is_height_key;
use crate::transition::validate_transition_write;

pub const OP_NAME: &str = "update_config";
pub const CONFIG_TABLE: &str = "config";

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigUpdatePayload {
    pub group: String,
    pub key: String,
    pub value: Value,
}

pub struct UpdateConfig {
    account: String,
    auth: AuthLevel,
    payload: ConfigUpdatePayload,
}

impl UpdateConfig {
    pub fn new(op: &Operation) -> Result<Self, StrataError> {
        Ok(Self {
            account: op.account.clone(),
            auth: op.auth,
            payload: parse_payload(op)?,
        })
    }

    fn pool(&self) -> Result<StakingPoolConfig, StrataError> {
        let mut pool: StakingPoolConfig = serde_json::from_value(self.payload.value.clone())
            .map_err(|e| StrataError::rejected(format!("invalid pool config: {}", e)))?;
        pool.id = self.payload.key.clone();
        Ok(pool)
    }
}

/// Group-specific rules shared by governance writes and transition writes.
pub fn validate_write(
    tx: &Transaction<'_>,
    group: &str,
    key: &str,
    value: &Value,
) -> Result<(), StrataError> {
    if group.is_empty() || key.is_empty() || group.contains(':') || key.contains(':') {
        return Err(StrataError::rejected(
            "config group and key must be non-empty and contain no ':'",
        ));
    }
    match group {
        groups::TRANSITIONS => {
            let height = value
                .as_u64()
                .ok_or_else(|| StrataError::rejected("transition height must be a block number"))?;
            validate_transition_write(tx.config(), key, height, tx.block_num())
        }
        groups::LEDGER if key == BOOKKEEPING_KEY => string_list(value).map(|_| ()),
        groups::GOVERNANCE | groups::PRICES => string_list(value).map(|_| ()),
        _ if is_height_key(group, key) => value.as_u64().map(|_| ()).ok_or_else(|| {
            StrataError::rejected(format!("{}.{} must be a block number", group, key))
        }),
        _ => Ok(()),
    }
}

pub fn string_list(value: &Value) -> Result<Vec<String>, StrataError> {
    serde_json::from_value(value.clone())
        .map_err(|_| StrataError::rejected("expected a list of account names"))
}

impl Action for UpdateConfig {
    fn name(&self) -> &'static str {
        OP_NAME
    }

    fn is_supported(&self) -> bool {
        self.auth == AuthLevel::Active
    }

    fn validate(&self, tx: &Transaction<'_>) -> Result<(), StrataError> {
        require_listed(tx, groups::GOVERNANCE, "admins", &self.account)?;
        let p = &self.payload;
        validate_write(tx, &p.group, &p.key, &p.value)?;

        if p.group == groups::STAKING_POOLS {
            let pool = self.pool()?;
            pool.validate()?;
            pool.check_siblings(&load_pools(tx.config())?)?;
            if let Some(old) = load_pool(tx.config(), &pool.id)? {
                if old.stake_token != pool.stake_token || old.staked_token != pool.staked_token {
                    return Err(StrataError::rejected(format!(
                        "pool {} cannot change its staked or stake token",
                        pool.id
                    )));
                }
                // Accrued shares were funded in the old reward token.
                if old.reward_token != pool.reward_token {
                    return Err(StrataError::rejected(format!(
                        "pool {} cannot change its reward token",
                        pool.id
                    )));
                }
            }
        }
        Ok(())
    }

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError> {
        let p = &self.payload;
        let mut events = Vec::new();

        if p.group == groups::STAKING_POOLS {
            let pool = self.pool()?;
            // Rewards accrued so far follow the old rule.
            if let Some(old) = load_pool(tx.config(), &pool.id)? {
                events.extend(settle_pool(tx, &self.account, &old)?);
            }
            tx.set_config(&p.group, &p.key, &p.value)?;
            if load_state(tx, &pool.id)?.is_none() {
                let state = load_or_init(tx, &pool)?;
                events.push(save_state(tx, &state)?);
            }
        } else {
            tx.set_config(&p.group, &p.key, &p.value)?;
        }

        events.push(EventRecord::update(
            CONFIG_TABLE,
            json!({"group": p.group, "key": p.key, "value": p.value}),
        ));
        Ok(events)
    }
}
