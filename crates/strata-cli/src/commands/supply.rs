// crates/strata-cli/src/commands/supply.rs
//
// `strata supply <token>` - holders of a token and the net supply across
// every account, bookkeeping accounts included. The net is zero unless the
// ledger has been corrupted.

use serde::Serialize;
use tabled::Tabled;

use strata_core::error::StrataError;
use strata_economics::ledger;
use strata_engine::BlockProcessor;

use crate::output::{format_json, format_table, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
pub struct HolderRow {
    #[tabled(rename = "Account")]
    pub account: String,
    #[tabled(rename = "Balance")]
    pub balance: String,
    #[tabled(rename = "Bookkeeping")]
    pub bookkeeping: bool,
}

#[derive(Debug, Serialize)]
pub struct SupplyReport {
    pub token: String,
    pub net_supply: String,
    pub holders: Vec<HolderRow>,
}

pub fn report(processor: &mut BlockProcessor, token: &str) -> Result<SupplyReport, StrataError> {
    processor.view(|tx| {
        let mut holders = Vec::new();
        for record in ledger::holders(tx, token)? {
            holders.push(HolderRow {
                bookkeeping: ledger::is_bookkeeping(tx, &record.account)?,
                account: record.account,
                balance: record.balance.to_string(),
            });
        }
        Ok(SupplyReport {
            token: token.to_string(),
            net_supply: ledger::token_supply(tx, token)?.to_string(),
            holders,
        })
    })
}

/// Run the supply command.
pub async fn run(
    processor: &mut BlockProcessor,
    token: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = report(processor, token)?;
    match format {
        OutputFormat::Json => println!("{}", format_json(&report)),
        OutputFormat::Table => {
            println!("{}: net supply {}", report.token, report.net_supply);
            println!();
            println!("{}", format_table(&report.holders));
        }
    }
    Ok(())
}
