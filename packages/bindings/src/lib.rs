use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use emi_core::emi::calculator::EmiInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn to_decimal(field: &str, value: f64) -> NapiResult<Decimal> {
    Decimal::try_from(value)
        .map_err(|e| to_napi_error(format!("Invalid {field} '{value}': {e}")))
}

// ---------------------------------------------------------------------------
// EMI
// ---------------------------------------------------------------------------

/// Live form preview: plain numbers in, `{ monthly_payment, total_payment, total_interest }` JSON out.
#[napi]
pub fn compute_emi(principal: f64, annual_rate_percent: f64, tenure_months: u32) -> NapiResult<String> {
    let breakdown = emi_core::emi::compute_emi(
        to_decimal("principal", principal)?,
        to_decimal("annual_rate_percent", annual_rate_percent)?,
        tenure_months,
    );
    serde_json::to_string(&breakdown).map_err(to_napi_error)
}

#[napi]
pub fn calculate_emi(input_json: String) -> NapiResult<String> {
    let input: EmiInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi_core::emi::calculator::calculate_emi(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: emi_core::emi::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi_core::emi::schedule::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_purchase_emi(input_json: String) -> NapiResult<String> {
    let input: emi_core::emi::purchase::PurchaseEmiInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        emi_core::emi::purchase::calculate_purchase_emi(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_prepayment(input_json: String) -> NapiResult<String> {
    let input: emi_core::emi::prepayment::PrepaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        emi_core::emi::prepayment::calculate_prepayment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn emi_sensitivity(input_json: String) -> NapiResult<String> {
    let input: emi_core::emi::sensitivity::EmiSensitivityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi_core::emi::sensitivity::emi_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans & lending
// ---------------------------------------------------------------------------

#[napi]
pub fn track_loan(input_json: String) -> NapiResult<String> {
    let input: emi_core::loans::progress::LoanProgressInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi_core::loans::progress::track_loan(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_loans(input_json: String) -> NapiResult<String> {
    let input: emi_core::loans::progress::LoanPortfolioInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi_core::loans::progress::summarize_loans(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_lending(input_json: String) -> NapiResult<String> {
    let input: emi_core::lending::ledger::LendingSummaryInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = emi_core::lending::ledger::summarize_lending(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Format an amount for display, e.g. `formatMoney("100000", "INR")` -> `₹1,00,000.00`.
#[napi]
pub fn format_money(amount: String, currency: String) -> NapiResult<String> {
    let value: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| to_napi_error(format!("Invalid amount '{amount}': {e}")))?;
    Ok(emi_core::format::format_money(
        value,
        &emi_core::Currency::from_code(&currency),
    ))
}
