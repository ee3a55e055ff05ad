use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use emi_core::emi::EmiLimits;
use emi_core::loans::progress::{self, LoanPortfolioInput, LoanProgressInput, LoanTerms};

use crate::input;

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Arguments for tracking a single loan
#[derive(Args)]
pub struct LoanStatusArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long, default_value = "Loan")]
    pub name: String,

    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Due date of the first installment (YYYY-MM-DD)
    #[arg(long)]
    pub first_due: Option<NaiveDate>,

    /// Valuation date (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_loan_status(
    args: LoanStatusArgs,
    limits: &EmiLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanProgressInput = match input::read_structured(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => LoanProgressInput {
            loan: LoanTerms {
                name: args.name,
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
                tenure_months: args
                    .tenure
                    .ok_or("--tenure is required (or provide --input)")?,
                first_due_date: args
                    .first_due
                    .ok_or("--first-due is required (or provide --input)")?,
            },
            as_of: args.as_of.unwrap_or_else(today),
        },
    };

    let result = progress::track_loan_with_limits(&loan_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for summarising several loans
#[derive(Args)]
pub struct LoansArgs {
    /// Path to JSON input file with `loans` and optional `as_of`
    #[arg(long)]
    pub input: Option<String>,

    /// Valuation date; overrides `as_of` in the input (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

#[derive(serde::Deserialize)]
struct LoansFile {
    loans: Vec<LoanTerms>,
    as_of: Option<NaiveDate>,
}

pub fn run_loans(args: LoansArgs, limits: &EmiLimits) -> Result<Value, Box<dyn std::error::Error>> {
    let file: LoansFile = input::read_structured(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for loan summary")?;

    let portfolio = LoanPortfolioInput {
        loans: file.loans,
        as_of: args.as_of.or(file.as_of).unwrap_or_else(today),
    };
    let result = progress::summarize_loans_with_limits(&portfolio, limits)?;
    Ok(serde_json::to_value(result)?)
}
