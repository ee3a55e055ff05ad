use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::emi::calculator::{
    checked_emi, round_money, validate_principal, validate_terms, EmiLimits,
};
use crate::emi::schedule::{amortize, due_date};
use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

/// Terms of a loan being repaid by EMI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    pub name: String,
    pub principal: Money,
    pub annual_rate_percent: Percent,
    pub tenure_months: u32,
    pub first_due_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// First installment not yet due
    NotStarted,
    Active,
    /// Every installment has fallen due
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProgressInput {
    #[serde(flatten)]
    pub loan: LoanTerms,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanProgress {
    pub name: String,
    pub monthly_payment: Money,
    pub installments_paid: u32,
    pub installments_remaining: u32,
    pub amount_paid: Money,
    pub principal_repaid: Money,
    pub interest_paid: Money,
    pub interest_remaining: Money,
    pub outstanding_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
    pub final_due_date: NaiveDate,
    pub status: LoanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPortfolioInput {
    pub loans: Vec<LoanTerms>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPortfolioOutput {
    pub loans: Vec<LoanProgress>,
    pub total_outstanding: Money,
    /// Sum of EMIs for loans that are not closed
    pub total_monthly_commitment: Money,
    pub total_interest_remaining: Money,
    pub active_loans: u32,
}

/// Position of a loan on `as_of`, assuming every installment due by then was paid.
pub fn loan_progress(loan: &LoanTerms, as_of: NaiveDate) -> EmiResult<LoanProgress> {
    loan_progress_with_limits(loan, as_of, &EmiLimits::default())
}

pub fn loan_progress_with_limits(
    loan: &LoanTerms,
    as_of: NaiveDate,
    limits: &EmiLimits,
) -> EmiResult<LoanProgress> {
    if loan.principal <= Decimal::ZERO {
        return Err(EmiError::invalid(
            "principal",
            format!("Loan '{}' must have a positive principal", loan.name),
        ));
    }
    validate_principal("principal", loan.principal, limits)?;
    validate_terms(loan.annual_rate_percent, loan.tenure_months, limits)?;

    let monthly_payment =
        checked_emi(loan.principal, loan.annual_rate_percent, loan.tenure_months)?.monthly_payment;
    let mut rows = amortize(loan.principal, loan.annual_rate_percent, loan.tenure_months);
    for row in rows.iter_mut() {
        row.due_date = Some(due_date(loan.first_due_date, row.number)?);
    }

    let paid = rows
        .iter()
        .take_while(|r| r.due_date.is_some_and(|d| d <= as_of))
        .count();
    let (paid_rows, open_rows) = rows.split_at(paid);

    let amount_paid: Money = paid_rows.iter().map(|r| r.installment).sum();
    let principal_repaid: Money = paid_rows.iter().map(|r| r.principal).sum();
    let interest_paid: Money = paid_rows.iter().map(|r| r.interest).sum();
    let interest_remaining: Money = open_rows.iter().map(|r| r.interest).sum();
    let outstanding_balance = paid_rows
        .last()
        .map(|r| r.closing_balance)
        .unwrap_or_else(|| round_money(loan.principal));

    let status = if paid == 0 {
        LoanStatus::NotStarted
    } else if open_rows.is_empty() {
        LoanStatus::Closed
    } else {
        LoanStatus::Active
    };

    Ok(LoanProgress {
        name: loan.name.clone(),
        monthly_payment,
        installments_paid: paid as u32,
        installments_remaining: open_rows.len() as u32,
        amount_paid,
        principal_repaid,
        interest_paid,
        interest_remaining,
        outstanding_balance,
        next_due_date: open_rows.first().and_then(|r| r.due_date),
        final_due_date: due_date(loan.first_due_date, rows.len() as u32)?,
        status,
    })
}

pub fn track_loan(input: &LoanProgressInput) -> EmiResult<ComputationOutput<LoanProgress>> {
    track_loan_with_limits(input, &EmiLimits::default())
}

pub fn track_loan_with_limits(
    input: &LoanProgressInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<LoanProgress>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let progress = loan_progress_with_limits(&input.loan, input.as_of, limits)?;
    if progress.status == LoanStatus::NotStarted {
        warnings.push(format!(
            "First installment of '{}' falls due on {}",
            progress.name, input.loan.first_due_date
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan progress from the reducing-balance schedule",
        &serde_json::json!({
            "name": input.loan.name,
            "as_of": input.as_of.to_string(),
            "assumption": "all installments due on or before as_of were paid",
        }),
        warnings,
        elapsed,
        progress,
    ))
}

pub fn summarize_loans(
    input: &LoanPortfolioInput,
) -> EmiResult<ComputationOutput<LoanPortfolioOutput>> {
    summarize_loans_with_limits(input, &EmiLimits::default())
}

pub fn summarize_loans_with_limits(
    input: &LoanPortfolioInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<LoanPortfolioOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if input.loans.is_empty() {
        return Err(EmiError::InsufficientData(
            "At least one loan is required".into(),
        ));
    }

    let loans = input
        .loans
        .iter()
        .map(|loan| loan_progress_with_limits(loan, input.as_of, limits))
        .collect::<EmiResult<Vec<_>>>()?;

    let open: Vec<&LoanProgress> = loans
        .iter()
        .filter(|l| l.status != LoanStatus::Closed)
        .collect();

    let output = LoanPortfolioOutput {
        total_outstanding: loans.iter().map(|l| l.outstanding_balance).sum(),
        total_monthly_commitment: open.iter().map(|l| l.monthly_payment).sum(),
        total_interest_remaining: loans.iter().map(|l| l.interest_remaining).sum(),
        active_loans: open.len() as u32,
        loans,
    };
    tracing::debug!(
        loans = output.loans.len(),
        outstanding = %output.total_outstanding,
        "summarized loans"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan portfolio summary",
        &serde_json::json!({
            "loans": input.loans.len(),
            "as_of": input.as_of.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn car_loan() -> LoanTerms {
        LoanTerms {
            name: "Car".into(),
            principal: dec!(100000),
            annual_rate_percent: dec!(12),
            tenure_months: 12,
            first_due_date: date(2025, 1, 10),
        }
    }

    #[test]
    fn test_progress_midway() {
        let p = loan_progress(&car_loan(), date(2025, 3, 15)).unwrap();
        assert_eq!(p.installments_paid, 3);
        assert_eq!(p.installments_remaining, 9);
        assert_eq!(p.next_due_date, Some(date(2025, 4, 10)));
        assert_eq!(p.final_due_date, date(2025, 12, 10));
        assert_eq!(p.status, LoanStatus::Active);
        assert_eq!(p.amount_paid, dec!(8884.88) * dec!(3));
        assert_eq!(p.principal_repaid + p.outstanding_balance, dec!(100000));
    }

    #[test]
    fn test_due_date_counts_as_paid() {
        let p = loan_progress(&car_loan(), date(2025, 1, 10)).unwrap();
        assert_eq!(p.installments_paid, 1);
        assert_eq!(p.outstanding_balance, dec!(92115.12));
    }

    #[test]
    fn test_not_started() {
        let out = track_loan(&LoanProgressInput {
            loan: car_loan(),
            as_of: date(2024, 12, 31),
        })
        .unwrap();
        assert_eq!(out.result.status, LoanStatus::NotStarted);
        assert_eq!(out.result.outstanding_balance, dec!(100000));
        assert_eq!(out.result.next_due_date, Some(date(2025, 1, 10)));
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_closed() {
        let p = loan_progress(&car_loan(), date(2026, 6, 1)).unwrap();
        assert_eq!(p.status, LoanStatus::Closed);
        assert_eq!(p.outstanding_balance, Decimal::ZERO);
        assert_eq!(p.next_due_date, None);
        assert_eq!(p.interest_remaining, Decimal::ZERO);
    }

    #[test]
    fn test_portfolio_excludes_closed_from_commitment() {
        let mut old = car_loan();
        old.name = "Old laptop".into();
        old.first_due_date = date(2022, 1, 1);
        let input = LoanPortfolioInput {
            loans: vec![car_loan(), old],
            as_of: date(2025, 6, 1),
        };
        let out = summarize_loans(&input).unwrap();
        assert_eq!(out.result.active_loans, 1);
        assert_eq!(out.result.total_monthly_commitment, dec!(8884.88));
        assert_eq!(
            out.result.total_outstanding,
            out.result.loans[0].outstanding_balance
        );
    }

    #[test]
    fn test_empty_portfolio_rejected() {
        let input = LoanPortfolioInput {
            loans: vec![],
            as_of: date(2025, 1, 1),
        };
        assert!(summarize_loans(&input).is_err());
    }

    #[test]
    fn test_configured_rate_limit_applies() {
        let mut loan = car_loan();
        loan.annual_rate_percent = dec!(60);
        let as_of = date(2025, 3, 15);
        assert!(loan_progress(&loan, as_of).is_err());

        let limits = EmiLimits {
            max_annual_rate_percent: dec!(80),
            ..EmiLimits::default()
        };
        let p = loan_progress_with_limits(&loan, as_of, &limits).unwrap();
        assert_eq!(p.installments_paid, 3);

        let input = LoanPortfolioInput {
            loans: vec![car_loan(), loan.clone()],
            as_of,
        };
        assert!(summarize_loans(&input).is_err());
        let out = summarize_loans_with_limits(&input, &limits).unwrap();
        assert_eq!(out.result.active_loans, 2);

        let single = LoanProgressInput { loan, as_of };
        assert!(track_loan_with_limits(&single, &limits).is_ok());
    }

    #[test]
    fn test_principal_above_limit_rejected() {
        let mut loan = car_loan();
        loan.principal = dec!(5000000000000000000000000000);
        assert!(matches!(
            loan_progress(&loan, date(2025, 3, 15)),
            Err(EmiError::InvalidInput { ref field, .. }) if field == "principal"
        ));
    }
}
