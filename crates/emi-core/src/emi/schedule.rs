use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calculator::{
    checked_emi, financed_amount, monthly_rate, round_money, try_compute_emi, validate_terms,
    EmiLimits,
};
use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

/// One row of a reducing-balance amortization table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub opening_balance: Money,
    pub installment: Money,
    pub interest: Money,
    pub principal: Money,
    pub closing_balance: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
    pub annual_rate_percent: Percent,
    pub tenure_months: u32,
    /// Due date of the first installment; later installments fall on the same day of
    /// each following month (clamped to month end).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub financed_amount: Money,
    pub monthly_payment: Money,
    pub installments: Vec<Installment>,
    pub total_payment: Money,
    pub total_interest: Money,
    pub total_principal: Money,
}

/// Amortize `opening_balance` with a fixed `payment` for at most `max_months`.
///
/// Each month's interest is charged on the opening balance and rounded to the minor
/// unit. The row that would overpay, or the last permitted row, settles the
/// remaining balance exactly.
pub(crate) fn amortize_with_payment(
    opening_balance: Money,
    rate: Decimal,
    payment: Money,
    max_months: u32,
    first_number: u32,
) -> Vec<Installment> {
    let mut rows = Vec::with_capacity(max_months as usize);
    let mut balance = round_money(opening_balance);

    for month in 0..max_months {
        if balance <= Decimal::ZERO {
            break;
        }
        let opening = balance;
        let interest = round_money(opening * rate);
        let is_last = month + 1 == max_months;

        let (installment, principal) = if is_last || payment - interest >= opening {
            (opening + interest, opening)
        } else {
            (payment, payment - interest)
        };

        balance = opening - principal;
        rows.push(Installment {
            number: first_number + month,
            due_date: None,
            opening_balance: opening,
            installment,
            interest,
            principal,
            closing_balance: balance,
        });
    }

    rows
}

/// Full month-by-month schedule at the EMI from [`compute_emi`](super::compute_emi).
///
/// Empty when there is nothing to finance. The principal is rounded to the minor unit
/// before the first row; principal components sum to that rounded amount and the
/// final closing balance is zero. Also empty when the terms leave the decimal range.
pub fn amortize(principal: Money, annual_rate_percent: Percent, tenure_months: u32) -> Vec<Installment> {
    if principal <= Decimal::ZERO || tenure_months == 0 {
        return Vec::new();
    }
    let Some(emi) = try_compute_emi(principal, annual_rate_percent, tenure_months) else {
        return Vec::new();
    };
    amortize_with_payment(
        principal,
        monthly_rate(annual_rate_percent),
        emi.monthly_payment,
        tenure_months,
        1,
    )
}

/// Due date of installment `number` (1-based) given the first due date.
pub fn due_date(first_due_date: NaiveDate, number: u32) -> EmiResult<NaiveDate> {
    let offset = number.saturating_sub(1);
    first_due_date
        .checked_add_months(Months::new(offset))
        .ok_or_else(|| {
            EmiError::DateError(format!(
                "Installment {number} due date overflows the calendar (first due {first_due_date})"
            ))
        })
}

/// Build a validated amortization schedule with the default form bounds.
pub fn build_schedule(input: &ScheduleInput) -> EmiResult<ComputationOutput<ScheduleOutput>> {
    build_schedule_with_limits(input, &EmiLimits::default())
}

pub fn build_schedule_with_limits(
    input: &ScheduleInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_terms(input.annual_rate_percent, input.tenure_months, limits)?;
    let (financed, _) = financed_amount(input.principal, input.down_payment, limits)?;
    if financed <= Decimal::ZERO {
        warnings.push("Down payment covers the full principal; schedule is empty".into());
    }

    let monthly_payment =
        checked_emi(financed, input.annual_rate_percent, input.tenure_months)?.monthly_payment;
    let mut installments = amortize(financed, input.annual_rate_percent, input.tenure_months);

    if let Some(first) = input.first_due_date {
        for row in installments.iter_mut() {
            row.due_date = Some(due_date(first, row.number)?);
        }
    }

    if let Some(last) = installments.last() {
        if last.installment != monthly_payment {
            warnings.push(format!(
                "Final installment adjusted to {} to absorb rounding",
                last.installment
            ));
        }
    }

    let total_payment: Money = installments.iter().map(|r| r.installment).sum();
    let total_interest: Money = installments.iter().map(|r| r.interest).sum();
    let total_principal: Money = installments.iter().map(|r| r.principal).sum();

    let output = ScheduleOutput {
        financed_amount: financed.max(Decimal::ZERO),
        monthly_payment,
        installments,
        total_payment,
        total_interest,
        total_principal,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reducing-balance amortization schedule",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "tenure_months": input.tenure_months,
            "interest": "monthly on opening balance, rounded to 2dp",
        }),
        warnings,
        elapsed,
        output,
    ))
}
