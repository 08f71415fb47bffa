// crates/strata-economics/src/emission.rs
//
// Reward emission per pool advance.
//
// Fixed pools release `tokens_per_block` for every elapsed block. Capped
// dynamic pools bound emission between 70% and 90% of that nominal rate and
// drift upward only while the reward account is well funded:
//
//   X = tokens_per_block * blocks
//   Y = (reward_account_balance / BLOCKS_PER_MONTH) * blocks
//   emission = max(X * 0.7, min(Y * 0.05, X * 0.9))
//
// All arithmetic is fixed-point and truncates toward zero.

use strata_core::amount::Amount;
use strata_core::error::StrataError;

use crate::pool::EmissionRule;

/// Blocks in a 30-day month at 3 seconds per block.
pub const BLOCKS_PER_MONTH: u64 = 864_000;

/// Lower bound of capped emission, as a fraction of nominal (70%).
pub const CAPPED_FLOOR: (u64, u64) = (7, 10);

/// Upper bound of capped emission, as a fraction of nominal (90%).
pub const CAPPED_CEILING: (u64, u64) = (9, 10);

/// Share of the monthly-normalized reward balance released (5%).
pub const FUNDING_SHARE: (u64, u64) = (5, 100);

/// Tokens emitted by `rule` over `blocks` elapsed blocks.
///
/// `reward_balance` is the reward account's balance before this advance; it
/// only matters for capped dynamic pools. Overflow is an invariant violation.
pub fn emission_for(
    rule: &EmissionRule,
    blocks: u64,
    reward_balance: Amount,
) -> Result<Amount, StrataError> {
    let overflow = || StrataError::invariant(format!("emission overflow over {} blocks", blocks));

    match rule {
        EmissionRule::Fixed { tokens_per_block } => {
            tokens_per_block.checked_mul_int(blocks).ok_or_else(overflow)
        }
        EmissionRule::CappedDynamic { tokens_per_block } => {
            capped_dynamic(*tokens_per_block, blocks, reward_balance).ok_or_else(overflow)
        }
    }
}

fn capped_dynamic(tokens_per_block: Amount, blocks: u64, reward_balance: Amount) -> Option<Amount> {
    let nominal = tokens_per_block.checked_mul_int(blocks)?;
    let funded = reward_balance
        .checked_div_int(BLOCKS_PER_MONTH)?
        .checked_mul_int(blocks)?;

    let floor = nominal.mul_ratio(CAPPED_FLOOR.0, CAPPED_FLOOR.1)?;
    let ceiling = nominal.mul_ratio(CAPPED_CEILING.0, CAPPED_CEILING.1)?;
    let dynamic = funded.mul_ratio(FUNDING_SHARE.0, FUNDING_SHARE.1)?;

    Some(floor.max(dynamic.min(ceiling)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capped(tpb: &str) -> EmissionRule {
        EmissionRule::CappedDynamic {
            tokens_per_block: tpb.parse().unwrap(),
        }
    }

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    #[test]
    fn test_fixed_emission_scales_with_blocks() {
        let rule = EmissionRule::Fixed {
            tokens_per_block: amt("2.5"),
        };
        assert_eq!(emission_for(&rule, 0, Amount::ZERO).unwrap(), Amount::ZERO);
        assert_eq!(emission_for(&rule, 4, Amount::ZERO).unwrap(), amt("10"));
    }

    #[test]
    fn test_capped_empty_reward_account_emits_floor() {
        let emission = emission_for(&capped("5.32407"), 1, Amount::ZERO).unwrap();
        assert_eq!(emission, amt("3.726849"));
    }

    #[test]
    fn test_capped_large_reward_account_emits_ceiling() {
        let emission = emission_for(&capped("5.32407"), 1, amt("1000000000")).unwrap();
        assert_eq!(emission, amt("4.791663"));
    }

    #[test]
    fn test_capped_mid_balance_emits_funding_share() {
        // 69,120,000 / 864,000 = 80 per block; 5% of that is 4, inside [3.73, 4.79].
        let emission = emission_for(&capped("5.32407"), 1, amt("69120000")).unwrap();
        assert_eq!(emission, amt("4"));
    }

    #[test]
    fn test_capped_over_many_blocks() {
        let emission = emission_for(&capped("5.32407"), 10, Amount::ZERO).unwrap();
        assert_eq!(emission, amt("37.26849"));
    }

    #[test]
    fn test_overflow_is_invariant_violation() {
        let rule = EmissionRule::Fixed {
            tokens_per_block: Amount::from_units(i128::MAX / 2),
        };
        let err = emission_for(&rule, 3, Amount::ZERO).unwrap_err();
        assert!(matches!(err, StrataError::InvariantViolation(_)));
    }
}
