// crates/strata-cli/src/commands/history.rs
//
// `strata history <account> <token> [--limit N]`

use serde::Serialize;
use tabled::Tabled;

use strata_core::error::StrataError;
use strata_economics::ledger;
use strata_engine::BlockProcessor;

use crate::output::{print_rows, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "Block")]
    pub block: u64,
    #[tabled(rename = "Change")]
    pub amount: String,
    #[tabled(rename = "Balance")]
    pub balance_end: String,
    #[tabled(rename = "Reason")]
    pub reason: String,
    #[tabled(rename = "Counterparty")]
    pub counterparty: String,
    #[tabled(rename = "Trx")]
    pub trx_id: String,
}

pub fn rows(
    processor: &mut BlockProcessor,
    account: &str,
    token: &str,
    limit: Option<usize>,
) -> Result<Vec<HistoryRow>, StrataError> {
    let history = processor.view(|tx| ledger::history(tx, account, token))?;
    let skip = limit.map_or(0, |n| history.len().saturating_sub(n));
    Ok(history
        .into_iter()
        .skip(skip)
        .map(|h| HistoryRow {
            block: h.block_num,
            amount: h.amount.to_string(),
            balance_end: h.balance_end.to_string(),
            reason: h.reason,
            counterparty: h.counterparty.unwrap_or_default(),
            trx_id: h.trx_id,
        })
        .collect())
}

/// Run the history command.
pub async fn run(
    processor: &mut BlockProcessor,
    account: &str,
    token: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = rows(processor, account, token, limit)?;
    print_rows(format, &rows, &format!("No {} history for {}", token, account));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testutil::chain;

    #[test]
    fn test_history_in_order_with_limit() {
        let mut processor = chain();
        let all = rows(&mut processor, "alice", "SPS", None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].reason, "genesis");
        assert_eq!(all[0].balance_end, "1000");
        assert_eq!(all[1].reason, "stake_tokens");
        assert_eq!(all[1].amount, "-100");
        assert_eq!(all[1].counterparty, "$TOKEN_STAKING");

        let last = rows(&mut processor, "alice", "SPS", Some(1)).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].block, 20);
    }
}
