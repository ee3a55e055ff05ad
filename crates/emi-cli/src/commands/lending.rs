use chrono::NaiveDate;
use clap::Args;
use serde_json::Value;

use emi_core::lending::ledger::{self, LendingRecord, LendingSummaryInput};

use crate::input;

/// Arguments for the lending ledger summary
#[derive(Args)]
pub struct LendingArgs {
    /// Path to JSON input file with `records` and optional `as_of`
    #[arg(long)]
    pub input: Option<String>,

    /// Valuation date; overrides `as_of` in the input (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(serde::Deserialize)]
struct LendingFile {
    records: Vec<LendingRecord>,
    as_of: Option<NaiveDate>,
}

pub fn run_lending(args: LendingArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let file: LendingFile = input::read_structured(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for lending summary")?;

    let summary_input = LendingSummaryInput {
        records: file.records,
        as_of: args
            .as_of
            .or(file.as_of)
            .unwrap_or_else(|| chrono::Local::now().date_naive()),
    };
    let result = ledger::summarize_lending(&summary_input)?;
    Ok(serde_json::to_value(result)?)
}
