// crates/strata-store/src/keys.rs
//
// Key layout of the state store.
//
// Keys are UTF-8 strings with `:` separators. Numbers are zero-padded so that
// lexical order equals numeric order, which lets prefix scans return rows in
// a deterministic, meaningful order:
//
//   - `balance:{token}:{account}`                 -> BalanceRecord
//   - `history:{account}:{token}:{seq:016}`       -> BalanceHistory
//   - `replay:{account}:{key}`                    -> ReplayRecord
//   - `config:{group}:{key}`                      -> JSON value
//   - `price:{token}`                             -> PriceEntry
//   - `acc:{pool}`                                -> AccumulatorState
//   - `stakepos:{pool}:{account}`                 -> StakerPosition
//   - `unstake:{account}:{token}`                 -> UnstakeRecord
//   - `unstake_due:{block:012}:{account}:{token}` -> empty (index)
//   - `transition_applied:{name}`                 -> block number
//   - `meta:*`                                    -> counters and markers

pub const CONFIG_PREFIX: &str = "config:";
pub const PRICE_PREFIX: &str = "price:";
pub const UNSTAKE_DUE_PREFIX: &str = "unstake_due:";

pub const HISTORY_SEQ: &[u8] = b"meta:history_seq";
pub const LAST_BLOCK: &[u8] = b"meta:last_block";
pub const GENESIS: &[u8] = b"meta:genesis";

pub fn balance(token: &str, account: &str) -> Vec<u8> {
    format!("balance:{}:{}", token, account).into_bytes()
}

pub fn balance_prefix(token: &str) -> Vec<u8> {
    format!("balance:{}:", token).into_bytes()
}

pub fn all_balances_prefix() -> Vec<u8> {
    b"balance:".to_vec()
}

pub fn history(account: &str, token: &str, seq: u64) -> Vec<u8> {
    format!("history:{}:{}:{:016}", account, token, seq).into_bytes()
}

pub fn history_prefix(account: &str, token: &str) -> Vec<u8> {
    format!("history:{}:{}:", account, token).into_bytes()
}

pub fn replay(account: &str, key: &str) -> Vec<u8> {
    format!("replay:{}:{}", account, key).into_bytes()
}

pub fn config(group: &str, key: &str) -> Vec<u8> {
    format!("{}{}:{}", CONFIG_PREFIX, group, key).into_bytes()
}

pub fn price(token: &str) -> Vec<u8> {
    format!("{}{}", PRICE_PREFIX, token).into_bytes()
}

pub fn accumulator(pool: &str) -> Vec<u8> {
    format!("acc:{}", pool).into_bytes()
}

pub fn stake_position(pool: &str, account: &str) -> Vec<u8> {
    format!("stakepos:{}:{}", pool, account).into_bytes()
}

pub fn unstake(account: &str, token: &str) -> Vec<u8> {
    format!("unstake:{}:{}", account, token).into_bytes()
}

pub fn unstake_due(block: u64, account: &str, token: &str) -> Vec<u8> {
    format!("{}{:012}:{}:{}", UNSTAKE_DUE_PREFIX, block, account, token).into_bytes()
}

/// Parse an `unstake_due` index key back into `(block, account, token)`.
pub fn parse_unstake_due(key: &[u8]) -> Option<(u64, String, String)> {
    let s = std::str::from_utf8(key).ok()?;
    let rest = s.strip_prefix(UNSTAKE_DUE_PREFIX)?;
    let mut parts = rest.splitn(3, ':');
    let block = parts.next()?.parse().ok()?;
    let account = parts.next()?.to_string();
    let token = parts.next()?.to_string();
    Some((block, account, token))
}

pub fn transition_applied(name: &str) -> Vec<u8> {
    format!("transition_applied:{}", name).into_bytes()
}

/// Split a `config:{group}:{key}` key into `(group, key)`.
pub fn parse_config(key: &[u8]) -> Option<(String, String)> {
    let s = std::str::from_utf8(key).ok()?;
    let rest = s.strip_prefix(CONFIG_PREFIX)?;
    let (group, key) = rest.split_once(':')?;
    Some((group.to_string(), key.to_string()))
}
