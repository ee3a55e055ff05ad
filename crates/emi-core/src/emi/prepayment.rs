use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calculator::{checked_emi, monthly_rate, validate_principal, validate_terms, EmiLimits};
use super::schedule::{amortize, amortize_with_payment};
use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

/// What the lender adjusts after a part-prepayment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentStrategy {
    /// Keep the installment, finish earlier
    ReduceTenure,
    /// Keep the end date, pay less each month
    ReduceEmi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentInput {
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub tenure_months: u32,
    pub prepayment_amount: Money,
    /// Number of regular installments paid before the prepayment is made
    pub after_installment: u32,
    pub strategy: PrepaymentStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentOutput {
    pub original_monthly_payment: Money,
    pub original_total_interest: Money,
    pub outstanding_before_prepayment: Money,
    pub prepayment_applied: Money,
    pub outstanding_after_prepayment: Money,
    pub new_monthly_payment: Money,
    pub remaining_months_before: u32,
    pub remaining_months_after: u32,
    pub new_total_interest: Money,
    pub interest_saved: Money,
    pub loan_closed: bool,
}

pub fn calculate_prepayment(input: &PrepaymentInput) -> EmiResult<ComputationOutput<PrepaymentOutput>> {
    calculate_prepayment_with_limits(input, &EmiLimits::default())
}

pub fn calculate_prepayment_with_limits(
    input: &PrepaymentInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<PrepaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_terms(input.annual_rate_percent, input.tenure_months, limits)?;
    if input.principal <= Decimal::ZERO {
        return Err(EmiError::invalid("principal", "Principal must be positive"));
    }
    validate_principal("principal", input.principal, limits)?;
    if input.prepayment_amount <= Decimal::ZERO {
        return Err(EmiError::invalid(
            "prepayment_amount",
            "Prepayment must be positive",
        ));
    }
    if input.after_installment == 0 || input.after_installment >= input.tenure_months {
        return Err(EmiError::invalid(
            "after_installment",
            format!(
                "Prepayment must follow installment 1..{}",
                input.tenure_months.saturating_sub(1)
            ),
        ));
    }

    let rate = input.annual_rate_percent;
    let original_emi = checked_emi(input.principal, rate, input.tenure_months)?.monthly_payment;
    let original = amortize(input.principal, rate, input.tenure_months);
    let original_total_interest: Money = original.iter().map(|r| r.interest).sum();

    let paid = input.after_installment as usize;
    let (paid_rows, _) = original.split_at(paid.min(original.len()));
    let interest_paid: Money = paid_rows.iter().map(|r| r.interest).sum();
    let outstanding = paid_rows
        .last()
        .map(|r| r.closing_balance)
        .unwrap_or(input.principal);
    let remaining_before = input.tenure_months - input.after_installment;

    let (applied, loan_closed) = if input.prepayment_amount >= outstanding {
        if input.prepayment_amount > outstanding {
            warnings.push(format!(
                "Prepayment exceeds outstanding balance; {} not applied",
                input.prepayment_amount - outstanding
            ));
        }
        (outstanding, true)
    } else {
        (input.prepayment_amount, false)
    };
    let balance_after = outstanding - applied;

    let (new_emi, rows) = if loan_closed {
        (Decimal::ZERO, Vec::new())
    } else {
        match input.strategy {
            PrepaymentStrategy::ReduceEmi => (
                checked_emi(balance_after, rate, remaining_before)?.monthly_payment,
                amortize(balance_after, rate, remaining_before),
            ),
            PrepaymentStrategy::ReduceTenure => (
                original_emi,
                amortize_with_payment(
                    balance_after,
                    monthly_rate(rate),
                    original_emi,
                    remaining_before,
                    input.after_installment + 1,
                ),
            ),
        }
    };

    let new_total_interest = interest_paid + rows.iter().map(|r| r.interest).sum::<Money>();
    tracing::debug!(
        strategy = ?input.strategy,
        %applied,
        months = rows.len(),
        "applied prepayment"
    );

    let output = PrepaymentOutput {
        original_monthly_payment: original_emi,
        original_total_interest,
        outstanding_before_prepayment: outstanding,
        prepayment_applied: applied,
        outstanding_after_prepayment: balance_after,
        new_monthly_payment: new_emi,
        remaining_months_before: remaining_before,
        remaining_months_after: rows.len() as u32,
        new_total_interest,
        interest_saved: original_total_interest - new_total_interest,
        loan_closed,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Part-prepayment on a reducing-balance loan",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_percent": rate.to_string(),
            "tenure_months": input.tenure_months,
            "prepayment_amount": input.prepayment_amount.to_string(),
            "after_installment": input.after_installment,
            "strategy": format!("{:?}", input.strategy),
        }),
        warnings,
        elapsed,
        output,
    ))
}
