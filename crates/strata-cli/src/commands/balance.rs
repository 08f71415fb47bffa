// crates/strata-cli/src/commands/balance.rs
//
// `strata balance <account>` - every token balance held by an account.

use serde::Serialize;
use tabled::Tabled;

use strata_core::error::StrataError;
use strata_economics::ledger::BalanceRecord;
use strata_engine::BlockProcessor;
use strata_store::keys;

use crate::output::{print_rows, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
pub struct BalanceRow {
    #[tabled(rename = "Token")]
    pub token: String,
    #[tabled(rename = "Balance")]
    pub balance: String,
}

pub fn rows(processor: &mut BlockProcessor, account: &str) -> Result<Vec<BalanceRow>, StrataError> {
    processor.view(|tx| {
        Ok(tx
            .store()
            .scan_json::<BalanceRecord>(&keys::all_balances_prefix())?
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| record.account == account)
            .map(|record| BalanceRow {
                token: record.token,
                balance: record.balance.to_string(),
            })
            .collect())
    })
}

/// Run the balance command.
pub async fn run(
    processor: &mut BlockProcessor,
    account: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = rows(processor, account)?;
    print_rows(format, &rows, &format!("{} holds no tokens", account));
    Ok(())
}
