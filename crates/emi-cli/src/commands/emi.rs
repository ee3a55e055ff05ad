use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use emi_core::emi::calculator::{self, EmiInput};
use emi_core::emi::prepayment::{self, PrepaymentInput, PrepaymentStrategy};
use emi_core::emi::purchase::{self, PurchaseEmiInput};
use emi_core::emi::schedule::{self, ScheduleInput};
use emi_core::emi::sensitivity::{self, EmiSensitivityInput, RateSweep};
use emi_core::emi::EmiLimits;

use crate::input;

/// Arguments for the EMI calculation
#[derive(Args)]
pub struct EmiArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan or purchase amount before down payment
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Down payment subtracted from the principal
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 12.5)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long)]
    pub tenure: Option<u32>,
}

pub fn run_emi(args: EmiArgs, limits: &EmiLimits) -> Result<Value, Box<dyn std::error::Error>> {
    let emi_input: EmiInput = match input::read_structured(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => EmiInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            down_payment: args.down_payment,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
        },
    };

    let result = calculator::calculate_emi_with_limits(&emi_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the month-by-month amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<Decimal>,

    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Due date of the first installment (YYYY-MM-DD)
    #[arg(long)]
    pub first_due: Option<NaiveDate>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    limits: &EmiLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = match input::read_structured(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => ScheduleInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            down_payment: args.down_payment,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
            first_due_date: args.first_due,
        },
    };

    let result = schedule::build_schedule_with_limits(&schedule_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for buying an item on EMI
#[derive(Args)]
pub struct PurchaseArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Price of the item
    #[arg(long)]
    pub price: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of monthly installments
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Processing fee as a percent of the financed amount
    #[arg(long)]
    pub fee_percent: Option<Decimal>,
}

pub fn run_purchase(
    args: PurchaseArgs,
    limits: &EmiLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let purchase_input: PurchaseEmiInput = match input::read_structured(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => PurchaseEmiInput {
            item_price: args.price.ok_or("--price is required (or provide --input)")?,
            down_payment: args.down_payment,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
            processing_fee_percent: args.fee_percent,
        },
    };

    let result = purchase::calculate_purchase_emi_with_limits(&purchase_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    ReduceTenure,
    ReduceEmi,
}

impl From<StrategyArg> for PrepaymentStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ReduceTenure => PrepaymentStrategy::ReduceTenure,
            StrategyArg::ReduceEmi => PrepaymentStrategy::ReduceEmi,
        }
    }
}

/// Arguments for a part-prepayment
#[derive(Args)]
pub struct PrepayArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Original number of monthly installments
    #[arg(long)]
    pub tenure: Option<u32>,

    /// Lump sum paid towards principal
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Installments already paid when the prepayment is made
    #[arg(long)]
    pub after: Option<u32>,

    #[arg(long, value_enum, default_value = "reduce-tenure")]
    pub strategy: StrategyArg,
}

pub fn run_prepay(args: PrepayArgs, limits: &EmiLimits) -> Result<Value, Box<dyn std::error::Error>> {
    let prepay_input: PrepaymentInput = match input::read_structured(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => PrepaymentInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            tenure_months: args
                .tenure
                .ok_or("--tenure is required (or provide --input)")?,
            prepayment_amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            after_installment: args.after.ok_or("--after is required (or provide --input)")?,
            strategy: args.strategy.into(),
        },
    };

    let result = prepayment::calculate_prepayment_with_limits(&prepay_input, limits)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the rate x tenure grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Rate sweep in format min:max:step (e.g. "8:12:0.5")
    #[arg(long)]
    pub rates: Option<String>,

    /// Tenures in months (comma-separated, e.g. "12,24,36")
    #[arg(long, value_delimiter = ',')]
    pub tenures: Option<Vec<u32>>,
}

fn parse_rate_sweep(spec: &str) -> Result<RateSweep, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Rate sweep must be min:max:step, got '{spec}'").into());
    }
    let parse = |s: &str| -> Result<Decimal, Box<dyn std::error::Error>> {
        s.trim()
            .parse::<Decimal>()
            .map_err(|e| format!("Invalid number '{s}' in rate sweep: {e}").into())
    };
    Ok(RateSweep {
        min: parse(parts[0])?,
        max: parse(parts[1])?,
        step: parse(parts[2])?,
    })
}

pub fn run_sensitivity(
    args: SensitivityArgs,
    limits: &EmiLimits,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: EmiSensitivityInput = match input::read_structured(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => EmiSensitivityInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            rate_sweep: parse_rate_sweep(
                args.rates
                    .as_deref()
                    .ok_or("--rates is required (or provide --input)")?,
            )?,
            tenures: args
                .tenures
                .ok_or("--tenures is required (or provide --input)")?,
        },
    };

    let result = sensitivity::emi_sensitivity_with_limits(&sens_input, limits)?;
    Ok(serde_json::to_value(result)?)
}
