// crates/strata-engine/src/actions/transitions.rs
//
// Virtual operations issued by the Transition Manager. Both refuse any sender
// other than `$TRANSITIONS`, so users cannot trigger a migration by name.

use serde::Deserialize;
use serde_json::{json, Value};

use strata_core::account::TRANSITIONS_ACCOUNT;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::Operation;
use strata_economics::accumulator::settle_pool;
use strata_economics::pool::{load_pools, EmissionRule};
use strata_store::snapshot::groups;
use strata_store::Transaction;

use crate::action::{parse_payload, Action};
use crate::actions::config_update::{string_list, validate_write, CONFIG_TABLE};

/// One config write performed by `transition_config`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigWrite {
    pub group: String,
    pub key: String,
    pub value: Value,
    /// Add the listed names to an existing string list instead of replacing it.
    #[serde(default)]
    pub append: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionConfigPayload {
    pub writes: Vec<ConfigWrite>,
}

/// `transition_config {writes: [...]}`
pub struct TransitionConfig {
    account: String,
    payload: TransitionConfigPayload,
}

impl TransitionConfig {
    pub fn new(op: &Operation) -> Result<Self, StrataError> {
        Ok(Self {
            account: op.account.clone(),
            payload: parse_payload(op)?,
        })
    }
}

impl Action for TransitionConfig {
    fn name(&self) -> &'static str {
        "transition_config"
    }

    fn is_supported(&self) -> bool {
        self.account == TRANSITIONS_ACCOUNT
    }

    fn validate(&self, tx: &Transaction<'_>) -> Result<(), StrataError> {
        for write in &self.payload.writes {
            if write.group == groups::STAKING_POOLS {
                return Err(StrataError::rejected("pools change only through update_config"));
            }
            if write.append {
                string_list(&write.value)?;
            }
            validate_write(tx, &write.group, &write.key, &write.value)?;
        }
        Ok(())
    }

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError> {
        let mut events = Vec::new();
        for write in &self.payload.writes {
            let value = if write.append {
                let mut list = tx.config().string_list(&write.group, &write.key)?;
                for name in string_list(&write.value)? {
                    if !list.contains(&name) {
                        list.push(name);
                    }
                }
                json!(list)
            } else {
                write.value.clone()
            };
            tx.set_config(&write.group, &write.key, &value)?;
            events.push(EventRecord::update(
                CONFIG_TABLE,
                json!({"group": write.group, "key": write.key, "value": value}),
            ));
        }
        Ok(events)
    }
}

/// `transition_capped_emission {}` - settle every fixed-rate pool under its
/// old rule, then switch it to the capped dynamic formula at the same nominal
/// rate.
pub struct TransitionCappedEmission {
    account: String,
}

impl TransitionCappedEmission {
    pub fn new(op: &Operation) -> Result<Self, StrataError> {
        Ok(Self {
            account: op.account.clone(),
        })
    }
}

impl Action for TransitionCappedEmission {
    fn name(&self) -> &'static str {
        "transition_capped_emission"
    }

    fn is_supported(&self) -> bool {
        self.account == TRANSITIONS_ACCOUNT
    }

    fn validate(&self, _tx: &Transaction<'_>) -> Result<(), StrataError> {
        Ok(())
    }

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError> {
        let mut events = Vec::new();
        for mut pool in load_pools(tx.config())? {
            let EmissionRule::Fixed { tokens_per_block } = pool.emission else {
                continue;
            };
            events.extend(settle_pool(tx, &self.account, &pool)?);
            pool.emission = EmissionRule::CappedDynamic { tokens_per_block };
            tx.set_config(groups::STAKING_POOLS, &pool.id, &pool)?;
            events.push(EventRecord::update(
                CONFIG_TABLE,
                json!({"group": groups::STAKING_POOLS, "key": pool.id, "value": pool}),
            ));
        }
        Ok(events)
    }
}
