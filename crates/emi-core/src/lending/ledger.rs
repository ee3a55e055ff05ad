use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

/// Which side of an informal loan the user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LendingDirection {
    /// Money the user gave out and expects back
    Lent,
    /// Money the user owes
    Borrowed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repayment {
    pub date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingRecord {
    pub counterparty: String,
    pub direction: LendingDirection,
    pub amount: Money,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub repayments: Vec<Repayment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LendingStatus {
    Outstanding,
    PartiallyRepaid,
    Settled,
    Overdue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingPosition {
    pub counterparty: String,
    pub direction: LendingDirection,
    pub amount: Money,
    pub repaid: Money,
    pub outstanding: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_repayment: Option<NaiveDate>,
    pub status: LendingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingSummaryInput {
    pub records: Vec<LendingRecord>,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingSummary {
    pub positions: Vec<LendingPosition>,
    /// Still owed to the user
    pub total_receivable: Money,
    /// Still owed by the user
    pub total_payable: Money,
    pub net_position: Money,
    pub overdue_count: u32,
}

fn position(
    record: &LendingRecord,
    as_of: NaiveDate,
    warnings: &mut Vec<String>,
) -> EmiResult<LendingPosition> {
    if record.amount <= Decimal::ZERO {
        return Err(EmiError::invalid(
            "amount",
            format!("Amount for '{}' must be positive", record.counterparty),
        ));
    }
    if let Some(bad) = record.repayments.iter().find(|r| r.amount < Decimal::ZERO) {
        return Err(EmiError::invalid(
            "repayments",
            format!(
                "Repayment of {} on {} for '{}' is negative",
                bad.amount, bad.date, record.counterparty
            ),
        ));
    }

    // Repayments dated after as_of have not happened yet
    let counted: Vec<&Repayment> = record
        .repayments
        .iter()
        .filter(|r| r.date <= as_of)
        .collect();
    let repaid: Money = counted.iter().map(|r| r.amount).sum();

    if repaid > record.amount {
        warnings.push(format!(
            "'{}' repaid {} more than the original {}",
            record.counterparty,
            repaid - record.amount,
            record.amount
        ));
    }
    let outstanding = (record.amount - repaid).max(Decimal::ZERO);

    let status = if outstanding.is_zero() {
        LendingStatus::Settled
    } else if record.due_date.is_some_and(|d| d < as_of) {
        LendingStatus::Overdue
    } else if repaid > Decimal::ZERO {
        LendingStatus::PartiallyRepaid
    } else {
        LendingStatus::Outstanding
    };

    Ok(LendingPosition {
        counterparty: record.counterparty.clone(),
        direction: record.direction,
        amount: record.amount,
        repaid,
        outstanding,
        last_repayment: counted.iter().map(|r| r.date).max(),
        status,
    })
}

/// Balances of money lent and borrowed as of a date.
pub fn summarize_lending(input: &LendingSummaryInput) -> EmiResult<ComputationOutput<LendingSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let positions = input
        .records
        .iter()
        .map(|r| position(r, input.as_of, &mut warnings))
        .collect::<EmiResult<Vec<_>>>()?;

    let total_for = |direction: LendingDirection| -> Money {
        positions
            .iter()
            .filter(|p| p.direction == direction)
            .map(|p| p.outstanding)
            .sum()
    };
    let total_receivable = total_for(LendingDirection::Lent);
    let total_payable = total_for(LendingDirection::Borrowed);
    let overdue_count = positions
        .iter()
        .filter(|p| p.status == LendingStatus::Overdue)
        .count() as u32;

    if overdue_count > 0 {
        tracing::warn!(overdue_count, "lending records past due");
    }

    let output = LendingSummary {
        positions,
        total_receivable,
        total_payable,
        net_position: total_receivable - total_payable,
        overdue_count,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lending ledger balances",
        &serde_json::json!({
            "records": input.records.len(),
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

    fn lent(amount: Decimal, repayments: Vec<Repayment>) -> LendingRecord {
        LendingRecord {
            counterparty: "Asha".into(),
            direction: LendingDirection::Lent,
            amount,
            date: date(2025, 1, 1),
            due_date: Some(date(2025, 6, 30)),
            repayments,
        }
    }

    fn summarize(records: Vec<LendingRecord>, as_of: NaiveDate) -> ComputationOutput<LendingSummary> {
        summarize_lending(&LendingSummaryInput { records, as_of }).unwrap()
    }

    #[test]
    fn test_partial_repayment() {
        let out = summarize(
            vec![lent(
                dec!(5000),
                vec![Repayment {
                    date: date(2025, 2, 1),
                    amount: dec!(2000),
                }],
            )],
            date(2025, 3, 1),
        );
        let p = &out.result.positions[0];
        assert_eq!(p.outstanding, dec!(3000));
        assert_eq!(p.status, LendingStatus::PartiallyRepaid);
        assert_eq!(p.last_repayment, Some(date(2025, 2, 1)));
        assert_eq!(out.result.total_receivable, dec!(3000));
    }

    #[test]
    fn test_overdue_after_due_date() {
        let out = summarize(vec![lent(dec!(5000), vec![])], date(2025, 7, 1));
        assert_eq!(out.result.positions[0].status, LendingStatus::Overdue);
        assert_eq!(out.result.overdue_count, 1);
    }

    #[test]
    fn test_future_repayments_ignored() {
        let out = summarize(
            vec![lent(
                dec!(1000),
                vec![Repayment {
                    date: date(2025, 5, 1),
                    amount: dec!(1000),
                }],
            )],
            date(2025, 4, 1),
        );
        assert_eq!(out.result.positions[0].status, LendingStatus::Outstanding);
        assert_eq!(out.result.positions[0].repaid, Decimal::ZERO);
    }

    #[test]
    fn test_over_repayment_clamps() {
        let out = summarize(
            vec![lent(
                dec!(1000),
                vec![Repayment {
                    date: date(2025, 2, 1),
                    amount: dec!(1200),
                }],
            )],
            date(2025, 3, 1),
        );
        assert_eq!(out.result.positions[0].outstanding, Decimal::ZERO);
        assert_eq!(out.result.positions[0].status, LendingStatus::Settled);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_net_position() {
        let mut borrowed = lent(dec!(800), vec![]);
        borrowed.direction = LendingDirection::Borrowed;
        borrowed.counterparty = "Ravi".into();
        let out = summarize(vec![lent(dec!(5000), vec![]), borrowed], date(2025, 3, 1));
        assert_eq!(out.result.total_receivable, dec!(5000));
        assert_eq!(out.result.total_payable, dec!(800));
        assert_eq!(out.result.net_position, dec!(4200));
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let input = LendingSummaryInput {
            records: vec![lent(Decimal::ZERO, vec![])],
            as_of: date(2025, 3, 1),
        };
        assert!(summarize_lending(&input).is_err());
    }
}
