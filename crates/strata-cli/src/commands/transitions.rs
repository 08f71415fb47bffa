// crates/strata-cli/src/commands/transitions.rs
//
// `strata transitions` - every known or scheduled transition point.

use std::collections::BTreeSet;

use serde::Serialize;
use tabled::Tabled;

use strata_core::error::StrataError;
use strata_engine::{BlockProcessor, TransitionManager};
use strata_store::keys;
use strata_store::snapshot::groups;

use crate::output::{print_rows, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
pub struct TransitionRow {
    #[tabled(rename = "Transition")]
    pub name: String,
    #[tabled(rename = "Height")]
    pub height: String,
    #[tabled(rename = "Applied at")]
    pub applied_at: String,
}

pub fn rows(processor: &mut BlockProcessor) -> Result<Vec<TransitionRow>, StrataError> {
    let config = processor.config();
    let mut names: BTreeSet<String> = TransitionManager::standard()
        .table()
        .iter()
        .map(|def| def.name.to_string())
        .collect();
    if let Some(group) = config.group(groups::TRANSITIONS) {
        names.extend(group.keys().cloned());
    }

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let height = config.transition_height(&name)?;
        let applied = processor.view(|tx| tx.get_json::<u64>(&keys::transition_applied(&name)))?;
        rows.push(TransitionRow {
            height: height.map_or("unscheduled".to_string(), |h| h.to_string()),
            applied_at: applied.map_or("-".to_string(), |b| b.to_string()),
            name,
        });
    }
    Ok(rows)
}

/// Run the transitions command.
pub async fn run(
    processor: &mut BlockProcessor,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rows = rows(processor)?;
    print_rows(format, &rows, "No transitions");
    Ok(())
}
