// crates/strata-core/src/account.rs
//
// Reserved system accounts.
//
// Chain account names never start with `$`, so the engine uses that prefix
// for accounts it owns. User operations signed by a `$` account are rejected
// before routing.

/// Prefix reserved for engine-owned accounts.
pub const RESERVED_PREFIX: char = '$';

/// Source account of every virtual operation issued by the Transition Manager.
pub const TRANSITIONS_ACCOUNT: &str = "$TRANSITIONS";

/// Bookkeeping account that mints genesis balances.
pub const MINTING_ACCOUNT: &str = "$MINTING";

/// Custodian of liquid tokens locked by staking.
pub const STAKING_ACCOUNT: &str = "$TOKEN_STAKING";

/// Bookkeeping account that issues stake tokens; its negated balance is the
/// total staked amount for a stake token.
pub const STAKE_ISSUER_ACCOUNT: &str = "$STAKE_ISSUER";

/// Holding account for emitted-but-unclaimed staking rewards.
pub const REWARD_HOLDING_ACCOUNT: &str = "$STAKING_REWARDS_POOL";

/// True when the account name is reserved for the engine.
pub fn is_reserved(account: &str) -> bool {
    account.starts_with(RESERVED_PREFIX)
}

/// Longest account name accepted, reserved prefix included.
pub const MAX_ACCOUNT_LEN: usize = 64;

/// Account names are ASCII letters, digits, `.`, `-` and `_`, optionally
/// behind the reserved prefix. Store keys join names with `:`, so it can never
/// appear in one.
pub fn is_valid_account(account: &str) -> bool {
    let body = account.strip_prefix(RESERVED_PREFIX).unwrap_or(account);
    !body.is_empty()
        && account.len() <= MAX_ACCOUNT_LEN
        && body
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
}

/// Basic validity check for a token symbol: 1-16 uppercase letters, digits or `_`.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 16
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_accounts() {
        assert!(is_reserved(TRANSITIONS_ACCOUNT));
        assert!(is_reserved(STAKE_ISSUER_ACCOUNT));
        assert!(!is_reserved("alice"));
    }

    #[test]
    fn test_account_names() {
        assert!(is_valid_account("alice"));
        assert!(is_valid_account("steem.dao-1"));
        assert!(is_valid_account(REWARD_HOLDING_ACCOUNT));
        assert!(!is_valid_account(""));
        assert!(!is_valid_account("$"));
        assert!(!is_valid_account("alice:SPS"));
        assert!(!is_valid_account("al ice"));
        assert!(!is_valid_account(&"a".repeat(MAX_ACCOUNT_LEN + 1)));
    }

    #[test]
    fn test_token_symbols() {
        assert!(is_valid_token("SPS"));
        assert!(is_valid_token("SPSP"));
        assert!(!is_valid_token("sps"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("WAY_TOO_LONG_TOKEN_NAME"));
    }
}
