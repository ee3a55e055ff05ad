mod commands;
mod config;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::emi::{EmiArgs, PrepayArgs, PurchaseArgs, ScheduleArgs, SensitivityArgs};
use commands::lending::LendingArgs;
use commands::loans::{LoanStatusArgs, LoansArgs};

/// EMI, amortization and loan tracking calculations
#[derive(Parser)]
#[command(
    name = "emi",
    version,
    about = "EMI, amortization and loan tracking calculations",
    long_about = "Compute equated monthly installments with decimal precision. \
                  Supports plain and purchase EMIs, amortization schedules, \
                  part-prepayments, rate/tenure grids, loan progress and a \
                  lending ledger."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to the config file's `output`, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,

    /// Path to a TOML config file (defaults to $EMI_CONFIG)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Currency code used when formatting amounts (e.g. INR, USD)
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the monthly installment and totals for a loan
    Emi(EmiArgs),
    /// Month-by-month reducing-balance amortization schedule
    Schedule(ScheduleArgs),
    /// EMI for buying an item with a down payment and processing fee
    Purchase(PurchaseArgs),
    /// Effect of a part-prepayment on EMI, tenure and interest
    Prepay(PrepayArgs),
    /// EMI over a grid of interest rates and tenures
    Sensitivity(SensitivityArgs),
    /// Progress of a single loan as of a date
    LoanStatus(LoanStatusArgs),
    /// Summary across several loans
    Loans(LoansArgs),
    /// Balances of money lent and borrowed
    Lending(LendingArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let config = config::load(cli.config.as_deref()).unwrap_or_else(|e| fail(e));
    let format = match cli.output {
        Some(format) => format,
        None => config
            .output_format()
            .unwrap_or_else(|e| fail(e))
            .unwrap_or(OutputFormat::Json),
    };
    let currency = match cli.currency.as_deref() {
        Some(code) => emi_core::Currency::from_code(code),
        None => config.currency(),
    };
    let limits = &config.limits;

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::emi::run_emi(args, limits),
        Commands::Schedule(args) => commands::emi::run_schedule(args, limits),
        Commands::Purchase(args) => commands::emi::run_purchase(args, limits),
        Commands::Prepay(args) => commands::emi::run_prepay(args, limits),
        Commands::Sensitivity(args) => commands::emi::run_sensitivity(args, limits),
        Commands::LoanStatus(args) => commands::loans::run_loan_status(args, limits),
        Commands::Loans(args) => commands::loans::run_loans(args, limits),
        Commands::Lending(args) => commands::lending::run_lending(args),
        Commands::Version => {
            println!("emi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&format, &value, &currency);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!("command failed: {:?}", e);
            fail(e);
        }
    }
}
