// crates/strata-engine/src/route.rs
//
// Height-windowed routing of operation names to handler versions.
//
// A route is active on the half-open window [from, to). Each bound is a fixed
// height, a config value (so governance can move a gate before it is reached)
// or a transition point. Bounds are resolved against the current snapshot on
// every lookup:
//
//   - no `from` bound: active from genesis; `from` unresolved: not active yet
//   - no `to` bound, or `to` unresolved: open-ended
//
// Routes for one operation name form a chain. Adjacent routes must hand over
// on the identical bound (`prev.to == next.from`), which makes exactly one of
// them active at every height whatever that bound resolves to. Chains that do
// not hand over are rejected when the table is built.

use std::collections::BTreeMap;
use std::fmt;

use strata_core::error::StrataError;
use strata_store::snapshot::groups;
use strata_store::SnapshotState;

use crate::handler::HandlerVersion;
use crate::transition::REPLAY_KEYS_TRANSITION;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBound {
    Fixed(u64),
    Config {
        group: &'static str,
        key: &'static str,
    },
    Transition(&'static str),
}

impl BlockBound {
    /// The height this bound currently resolves to, if set.
    pub fn resolve(&self, config: &SnapshotState) -> Result<Option<u64>, StrataError> {
        match self {
            BlockBound::Fixed(height) => Ok(Some(*height)),
            BlockBound::Config { group, key } => config.get(group, key),
            BlockBound::Transition(name) => config.transition_height(name),
        }
    }
}

impl fmt::Display for BlockBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockBound::Fixed(height) => write!(f, "{}", height),
            BlockBound::Config { group, key } => write!(f, "config {}.{}", group, key),
            BlockBound::Transition(name) => write!(f, "transition {}", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub op: &'static str,
    pub handler: HandlerVersion,
    pub from: Option<BlockBound>,
    pub to: Option<BlockBound>,
}

impl Route {
    pub fn always(op: &'static str, handler: HandlerVersion) -> Self {
        Self {
            op,
            handler,
            from: None,
            to: None,
        }
    }

    pub fn window(
        op: &'static str,
        handler: HandlerVersion,
        from: Option<BlockBound>,
        to: Option<BlockBound>,
    ) -> Self {
        Self { op, handler, from, to }
    }

    pub fn is_active(&self, height: u64, config: &SnapshotState) -> Result<bool, StrataError> {
        let from = match &self.from {
            None => 0,
            Some(bound) => match bound.resolve(config)? {
                Some(h) => h,
                None => return Ok(false),
            },
        };
        let to = match &self.to {
            None => None,
            Some(bound) => bound.resolve(config)?,
        };
        Ok(height >= from && to.map_or(true, |to| height < to))
    }

    fn bounds(&self) -> impl Iterator<Item = &BlockBound> {
        self.from.iter().chain(self.to.iter())
    }
}

/// Validated route chains keyed by operation name.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    chains: BTreeMap<&'static str, Vec<Route>>,
}

impl RouteTable {
    /// Build a table, checking every chain for handover.
    ///
    /// Routes of one operation must be listed in height order.
    pub fn build(routes: Vec<Route>) -> Result<Self, StrataError> {
        let mut chains: BTreeMap<&'static str, Vec<Route>> = BTreeMap::new();
        for route in routes {
            if let (Some(BlockBound::Fixed(from)), Some(BlockBound::Fixed(to))) =
                (&route.from, &route.to)
            {
                if from >= to {
                    return Err(StrataError::Configuration(format!(
                        "route {} -> {:?} has empty window [{}, {})",
                        route.op, route.handler, from, to
                    )));
                }
            }
            chains.entry(route.op).or_default().push(route);
        }

        for (op, chain) in &chains {
            for pair in chain.windows(2) {
                let (prev, next) = (&pair[0], &pair[1]);
                match (&prev.to, &next.from) {
                    (Some(to), Some(from)) if to == from => {}
                    (to, from) => {
                        return Err(StrataError::Configuration(format!(
                            "routes for {} do not hand over: {:?} ends at {} but {:?} starts at {}",
                            op,
                            prev.handler,
                            to.as_ref().map_or("never".to_string(), |b| b.to_string()),
                            next.handler,
                            from.as_ref().map_or("genesis".to_string(), |b| b.to_string()),
                        )));
                    }
                }
            }
        }
        Ok(Self { chains })
    }

    /// The handler for `op` at `height`, or `None` if no route is active.
    pub fn route(
        &self,
        height: u64,
        op: &str,
        config: &SnapshotState,
    ) -> Result<Option<HandlerVersion>, StrataError> {
        let Some(chain) = self.chains.get(op) else {
            return Ok(None);
        };
        let mut active = None;
        for route in chain {
            if route.is_active(height, config)? {
                if let Some(first) = active {
                    return Err(StrataError::Configuration(format!(
                        "{} routes to both {:?} and {:?} at block {}",
                        op, first, route.handler, height
                    )));
                }
                active = Some(route.handler);
            }
        }
        tracing::trace!("Routed {} at block {} to {:?}", op, height, active);
        Ok(active)
    }

    /// Transition points referenced by any route.
    pub fn referenced_transitions(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .chains
            .values()
            .flatten()
            .flat_map(|r| r.bounds())
            .filter_map(|b| match b {
                BlockBound::Transition(name) => Some(*name),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Config keys read as block heights by any route.
    pub fn referenced_config(&self) -> Vec<(&'static str, &'static str)> {
        let mut keys = config_bounds(self.chains.values().flatten());
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    /// Startup check: every transition a route depends on must be scheduled,
    /// and every config bound must hold a block number when set.
    pub fn validate_config(&self, config: &SnapshotState) -> Result<(), StrataError> {
        for name in self.referenced_transitions() {
            if config.transition_height(name)?.is_none() {
                return Err(StrataError::Configuration(format!(
                    "transition point {} is referenced by a route but has no height",
                    name
                )));
            }
        }
        for (group, key) in self.referenced_config() {
            if let Some(value) = config.config_value(group, key) {
                if !value.is_u64() {
                    return Err(StrataError::Configuration(format!(
                        "config {}.{} gates a route but holds {}, not a block number",
                        group, key, value
                    )));
                }
            }
        }
        Ok(())
    }
}

fn config_bounds<'r>(routes: impl Iterator<Item = &'r Route>) -> Vec<(&'static str, &'static str)> {
    routes
        .flat_map(|r| r.bounds())
        .filter_map(|b| match b {
            BlockBound::Config { group, key } => Some((*group, *key)),
            _ => None,
        })
        .collect()
}

/// True when a route of the live chain reads `group.key` as a block height.
/// Governance writes to such keys must be block numbers.
pub fn is_height_key(group: &str, key: &str) -> bool {
    config_bounds(standard_routes().iter())
        .into_iter()
        .any(|(g, k)| g == group && k == key)
}

/// Config bound gating every staking operation.
pub const REWARD_START: BlockBound = BlockBound::Config {
    group: groups::STAKING,
    key: "reward_start_block",
};

/// The routes of the live chain.
pub fn standard_routes() -> Vec<Route> {
    let replay_keys = BlockBound::Transition(REPLAY_KEYS_TRANSITION);
    let staking = |op, handler| Route::window(op, handler, Some(REWARD_START), None);
    vec![
        Route::window(
            "token_transfer",
            HandlerVersion::TokenTransferV1,
            None,
            Some(replay_keys.clone()),
        ),
        Route::window(
            "token_transfer",
            HandlerVersion::TokenTransferV2,
            Some(replay_keys),
            None,
        ),
        staking("stake_tokens", HandlerVersion::StakeTokens),
        staking("unstake_tokens", HandlerVersion::UnstakeTokens),
        staking("cancel_unstake_tokens", HandlerVersion::CancelUnstakeTokens),
        staking("claim_staking_rewards", HandlerVersion::ClaimStakingRewards),
        Route::always("update_config", HandlerVersion::UpdateConfig),
        Route::always("price_feed", HandlerVersion::PriceFeed),
        Route::always("transition_config", HandlerVersion::TransitionConfig),
        Route::always("transition_capped_emission", HandlerVersion::TransitionCappedEmission),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use strata_core::operation::BlockContext;
    use strata_store::{ConfigSnapshot, MemoryStore, Transaction};

    fn config_with(entries: &[(&str, &str, u64)]) -> std::sync::Arc<SnapshotState> {
        let store = MemoryStore::new();
        let mut snapshot = ConfigSnapshot::new();
        let ctx = BlockContext::new(0, Utc.timestamp_opt(0, 0).unwrap(), "cfg");
        let mut tx = Transaction::begin(&store, &mut snapshot, ctx);
        for (group, key, value) in entries {
            tx.set_config(group, key, value).unwrap();
        }
        tx.commit().unwrap();
        snapshot.baseline()
    }

    fn v1_until(height: u64) -> Route {
        let to = Some(BlockBound::Fixed(height));
        Route::window("transfer", HandlerVersion::TokenTransferV1, None, to)
    }

    fn v2_from(height: u64) -> Route {
        let from = Some(BlockBound::Fixed(height));
        Route::window("transfer", HandlerVersion::TokenTransferV2, from, None)
    }

    #[test]
    fn test_fixed_handover_routes_each_height_once() {
        let table = RouteTable::build(vec![v1_until(100), v2_from(100)]).unwrap();
        let config = SnapshotState::default();
        assert_eq!(
            table.route(99, "transfer", &config).unwrap(),
            Some(HandlerVersion::TokenTransferV1)
        );
        assert_eq!(
            table.route(100, "transfer", &config).unwrap(),
            Some(HandlerVersion::TokenTransferV2)
        );
        assert_eq!(table.route(0, "unknown", &config).unwrap(), None);
    }

    #[test]
    fn test_gap_and_overlap_rejected_at_build() {
        let gap = RouteTable::build(vec![v1_until(100), v2_from(101)]);
        assert!(matches!(gap, Err(StrataError::Configuration(_))));

        let overlap = RouteTable::build(vec![
            Route::always("transfer", HandlerVersion::TokenTransferV1),
            v2_from(100),
        ]);
        assert!(matches!(overlap, Err(StrataError::Configuration(_))));

        let empty = RouteTable::build(vec![Route::window(
            "transfer",
            HandlerVersion::TokenTransferV1,
            Some(BlockBound::Fixed(5)),
            Some(BlockBound::Fixed(5)),
        )]);
        assert!(empty.is_err());
    }

    #[test]
    fn test_transition_handover_follows_config() {
        let table = RouteTable::build(standard_routes()).unwrap();

        // Unscheduled: the old version stays active everywhere.
        let unset = SnapshotState::default();
        assert_eq!(
            table.route(1_000_000, "token_transfer", &unset).unwrap(),
            Some(HandlerVersion::TokenTransferV1)
        );
        assert!(table.validate_config(&unset).is_err());

        let config = config_with(&[(groups::TRANSITIONS, REPLAY_KEYS_TRANSITION, 500)]);
        assert!(table.validate_config(&config).is_ok());
        assert_eq!(
            table.route(499, "token_transfer", &config).unwrap(),
            Some(HandlerVersion::TokenTransferV1)
        );
        assert_eq!(
            table.route(500, "token_transfer", &config).unwrap(),
            Some(HandlerVersion::TokenTransferV2)
        );
    }

    #[test]
    fn test_config_gate_follows_governance() {
        let table = RouteTable::build(standard_routes()).unwrap();
        let unset = SnapshotState::default();
        assert_eq!(table.route(10, "stake_tokens", &unset).unwrap(), None);

        let config = config_with(&[(groups::STAKING, "reward_start_block", 20)]);
        assert_eq!(table.route(19, "stake_tokens", &config).unwrap(), None);
        assert_eq!(
            table.route(20, "stake_tokens", &config).unwrap(),
            Some(HandlerVersion::StakeTokens)
        );
    }

    #[test]
    fn test_referenced_transitions() {
        let table = RouteTable::build(standard_routes()).unwrap();
        assert_eq!(table.referenced_transitions(), vec![REPLAY_KEYS_TRANSITION]);
    }

    #[test]
    fn test_config_bounds_must_be_block_numbers() {
        let table = RouteTable::build(standard_routes()).unwrap();
        assert_eq!(
            table.referenced_config(),
            vec![(groups::STAKING, "reward_start_block")]
        );
        assert!(is_height_key(groups::STAKING, "reward_start_block"));
        assert!(!is_height_key(groups::STAKING, "other"));

        let store = MemoryStore::new();
        let mut snapshot = ConfigSnapshot::new();
        let ctx = BlockContext::new(0, Utc.timestamp_opt(0, 0).unwrap(), "cfg");
        let mut tx = Transaction::begin(&store, &mut snapshot, ctx);
        tx.set_config(groups::TRANSITIONS, REPLAY_KEYS_TRANSITION, &10u64)
            .unwrap();
        tx.set_config(groups::STAKING, "reward_start_block", &"soon")
            .unwrap();
        tx.commit().unwrap();
        assert!(matches!(
            table.validate_config(&snapshot.baseline()),
            Err(StrataError::Configuration(_))
        ));
    }
}
