// crates/strata-engine/src/actions/price_feed.rs
//
// `price_feed {token, price}` - an oracle reports the USD price of a token.
// Only `prices.oracles` may submit it. The last price per token is cached in
// the snapshot so later validation reads it without touching the store.

use serde::Deserialize;

use strata_core::account::is_valid_token;
use strata_core::amount::Amount;
use strata_core::error::StrataError;
use strata_core::event::EventRecord;
use strata_core::operation::Operation;
use strata_store::snapshot::groups;
use strata_store::{PriceEntry, Transaction};

use crate::action::{parse_payload, require_listed, Action};

pub const OP_NAME: &str = "price_feed";
pub const PRICE_HISTORY_TABLE: &str = "price_history";

#[derive(Debug, Clone, Deserialize)]
pub struct PricePayload {
    pub token: String,
    pub price: Amount,
}

pub struct PriceFeed {
    account: String,
    payload: PricePayload,
}

impl PriceFeed {
    pub fn new(op: &Operation) -> Result<Self, StrataError> {
        Ok(Self {
            account: op.account.clone(),
            payload: parse_payload(op)?,
        })
    }
}

impl Action for PriceFeed {
    fn name(&self) -> &'static str {
        OP_NAME
    }

    fn validate(&self, tx: &Transaction<'_>) -> Result<(), StrataError> {
        require_listed(tx, groups::PRICES, "oracles", &self.account)?;
        if !is_valid_token(&self.payload.token) {
            return Err(StrataError::rejected(format!(
                "invalid token symbol {:?}",
                self.payload.token
            )));
        }
        if !self.payload.price.is_positive() {
            return Err(StrataError::rejected("price must be positive"));
        }
        Ok(())
    }

    fn process(&self, tx: &mut Transaction<'_>) -> Result<Vec<EventRecord>, StrataError> {
        let entry = PriceEntry {
            token: self.payload.token.clone(),
            usd: self.payload.price,
            block_num: tx.block_num(),
            updated: tx.ctx().block_time,
        };
        let mut data = serde_json::to_value(&entry)?;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("oracle".to_string(), self.account.clone().into());
        }
        tx.set_price(entry)?;
        Ok(vec![EventRecord::insert(PRICE_HISTORY_TABLE, data)])
    }
}
