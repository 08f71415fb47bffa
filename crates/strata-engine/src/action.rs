// crates/strata-engine/src/action.rs
//
// The contract every operation handler implements.
//
// A handler is instantiated per operation from its `HandlerVersion`, with the
// payload already parsed. The processor then asks, in order:
//   1. `is_supported` - does this handler apply at all (auth level, sender)?
//   2. `validate`     - read-only checks against the open transaction.
//   3. `process`      - apply the effects and return the event records.
// Any `Rejected` error from 2 or 3 rolls the operation back and the block
// continues.

use serde::de::DeserializeOwned;

use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::Operation;
use strata_store::Transaction;

pub trait Action {
    /// Operation name this handler serves.
    fn name(&self) -> &'static str;

    /// False when the operation is outside this handler's reach (for example
    /// posting authority where active is required).
    fn is_supported(&self) -> bool {
        true
    }

    fn validate(&self, tx: &Transaction<'_>) -> Result<(), StrataError>;

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError>;
}

/// Parse an operation payload, rejecting malformed input.
pub fn parse_payload<T: DeserializeOwned>(op: &Operation) -> Result<T, StrataError> {
    serde_json::from_value(op.payload.clone())
        .map_err(|e| StrataError::rejected(format!("malformed {} payload: {}", op.name, e)))
}

/// Reject unless `account` appears in the string list `group.key`.
pub fn require_listed(
    tx: &Transaction<'_>,
    group: &str,
    key: &str,
    account: &str,
) -> Result<(), StrataError> {
    if tx.config().string_list(group, key)?.iter().any(|a| a == account) {
        Ok(())
    } else {
        Err(StrataError::rejected(format!(
            "{} is not in {}.{}",
            account, group, key
        )))
    }
}
