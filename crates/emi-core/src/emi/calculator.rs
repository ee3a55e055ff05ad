use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// Upper bounds applied to user-entered loan terms before they reach the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmiLimits {
    pub max_annual_rate_percent: Percent,
    pub max_tenure_months: u32,
    /// Largest principal (or item price) accepted
    pub max_principal: Money,
}

impl Default for EmiLimits {
    fn default() -> Self {
        EmiLimits {
            max_annual_rate_percent: dec!(50),
            max_tenure_months: 600,
            max_principal: dec!(1000000000000000),
        }
    }
}

/// Fixed installment and aggregate totals for a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmiBreakdown {
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiInput {
    /// Amount before any down payment is subtracted
    pub principal: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment: Option<Money>,
    pub annual_rate_percent: Percent,
    pub tenure_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiOutput {
    pub financed_amount: Money,
    pub down_payment: Money,
    pub monthly_rate_percent: Percent,
    pub tenure_months: u32,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

/// Round to currency-minor-unit precision (2 dp, midpoint away from zero).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Monthly rate as a fraction, e.g. 12% p.a. -> 0.01.
pub fn monthly_rate(annual_rate_percent: Percent) -> Decimal {
    annual_rate_percent / MONTHS_PER_YEAR / PERCENT
}

/// Unrounded fixed installment at full decimal precision.
///
/// Evaluates `P * r * (1+r)^n / ((1+r)^n - 1)` as `P * r / (1 - (1+r)^-n)`, which is
/// algebraically equal and keeps the intermediate product small. When `(1+r)^n`
/// leaves the decimal range the installment converges to the interest-only
/// payment `P * r`. `None` when `P * r` itself does not fit.
pub(crate) fn raw_installment(principal: Money, rate: Decimal, tenure_months: u32) -> Option<Decimal> {
    let n = Decimal::from(tenure_months);
    if rate.is_zero() {
        return Some(principal / n);
    }

    let growth = Decimal::ONE.checked_add(rate)?;
    if growth <= Decimal::ZERO {
        tracing::warn!(%rate, "monthly rate at or below -100%; installment undefined");
        return Some(Decimal::ZERO);
    }

    let interest_only = principal.checked_mul(rate)?;
    let Some(factor) = growth.checked_powu(u64::from(tenure_months)) else {
        tracing::debug!(%rate, tenure_months, "compound factor overflowed; using interest-only limit");
        return Some(interest_only);
    };

    let denominator = match Decimal::ONE.checked_div(factor) {
        Some(discount) => Decimal::ONE - discount,
        None => return Some(Decimal::ZERO),
    };

    // A rate too small to move the compound factor behaves like a zero rate.
    if denominator.is_zero() {
        return Some(principal / n);
    }
    interest_only.checked_div(denominator)
}

/// [`compute_emi`] with every product checked; `None` if a value leaves the decimal range.
pub(crate) fn try_compute_emi(
    principal: Money,
    annual_rate_percent: Percent,
    tenure_months: u32,
) -> Option<EmiBreakdown> {
    if principal <= Decimal::ZERO || tenure_months == 0 {
        return Some(EmiBreakdown::default());
    }

    let rate = monthly_rate(annual_rate_percent);
    let monthly_payment = round_money(raw_installment(principal, rate, tenure_months)?);
    let total_payment = round_money(monthly_payment.checked_mul(Decimal::from(tenure_months))?);
    let total_interest = round_money(total_payment - principal).max(Decimal::ZERO);

    Some(EmiBreakdown {
        monthly_payment,
        total_payment,
        total_interest,
    })
}

/// Like [`try_compute_emi`], reporting an out-of-range result as invalid input.
pub(crate) fn checked_emi(
    principal: Money,
    annual_rate_percent: Percent,
    tenure_months: u32,
) -> EmiResult<EmiBreakdown> {
    try_compute_emi(principal, annual_rate_percent, tenure_months).ok_or_else(|| {
        EmiError::invalid(
            "principal",
            "Principal and rate are too large to compute an installment",
        )
    })
}

/// Fixed monthly installment plus totals under reducing-balance amortization.
///
/// Total over its documented domain (`principal > 0`, `annual_rate_percent >= 0`,
/// `tenure_months >= 1`). A non-positive principal, such as one fully covered by a
/// down payment, yields an all-zero breakdown; so does a zero tenure.
/// Totals are derived from the rounded installment, i.e. what is actually paid.
/// Terms whose totals leave the decimal range also yield zeros, with a warning;
/// the validated entry points reject them instead.
pub fn compute_emi(principal: Money, annual_rate_percent: Percent, tenure_months: u32) -> EmiBreakdown {
    try_compute_emi(principal, annual_rate_percent, tenure_months).unwrap_or_else(|| {
        tracing::warn!(%principal, %annual_rate_percent, tenure_months, "EMI out of decimal range");
        EmiBreakdown::default()
    })
}

/// Check rate and tenure against the configured bounds.
pub(crate) fn validate_terms(
    annual_rate_percent: Percent,
    tenure_months: u32,
    limits: &EmiLimits,
) -> EmiResult<()> {
    if annual_rate_percent < Decimal::ZERO {
        return Err(EmiError::invalid(
            "annual_rate_percent",
            "Interest rate cannot be negative",
        ));
    }
    if annual_rate_percent > limits.max_annual_rate_percent {
        return Err(EmiError::invalid(
            "annual_rate_percent",
            format!(
                "Interest rate must be at most {}%",
                limits.max_annual_rate_percent
            ),
        ));
    }
    if tenure_months == 0 {
        return Err(EmiError::invalid(
            "tenure_months",
            "Tenure must be at least 1 month",
        ));
    }
    if tenure_months > limits.max_tenure_months {
        return Err(EmiError::invalid(
            "tenure_months",
            format!("Tenure must be at most {} months", limits.max_tenure_months),
        ));
    }
    Ok(())
}

/// Reject an amount above the configured principal bound.
pub(crate) fn validate_principal(field: &str, amount: Money, limits: &EmiLimits) -> EmiResult<()> {
    if amount > limits.max_principal {
        return Err(EmiError::invalid(
            field,
            format!("Amount must be at most {}", limits.max_principal),
        ));
    }
    Ok(())
}

/// Principal left to finance after the down payment, validated and rounded to the
/// minor unit.
pub(crate) fn financed_amount(
    principal: Money,
    down_payment: Option<Money>,
    limits: &EmiLimits,
) -> EmiResult<(Money, Money)> {
    if principal < Decimal::ZERO {
        return Err(EmiError::invalid("principal", "Principal cannot be negative"));
    }
    validate_principal("principal", principal, limits)?;
    let down = down_payment.unwrap_or(Decimal::ZERO);
    if down < Decimal::ZERO {
        return Err(EmiError::invalid(
            "down_payment",
            "Down payment cannot be negative",
        ));
    }
    Ok((round_money(principal - down), down))
}

/// Validated EMI calculation with the default form bounds.
pub fn calculate_emi(input: &EmiInput) -> EmiResult<ComputationOutput<EmiOutput>> {
    calculate_emi_with_limits(input, &EmiLimits::default())
}

/// Validated EMI calculation.
pub fn calculate_emi_with_limits(
    input: &EmiInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<EmiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_terms(input.annual_rate_percent, input.tenure_months, limits)?;
    let (financed, down) = financed_amount(input.principal, input.down_payment, limits)?;

    if financed <= Decimal::ZERO {
        warnings.push("Down payment covers the full principal; nothing to finance".into());
    }

    let breakdown = checked_emi(financed, input.annual_rate_percent, input.tenure_months)?;
    tracing::debug!(
        %financed,
        rate = %input.annual_rate_percent,
        tenure = input.tenure_months,
        emi = %breakdown.monthly_payment,
        "computed EMI"
    );

    let output = EmiOutput {
        financed_amount: financed.max(Decimal::ZERO),
        down_payment: down,
        monthly_rate_percent: (input.annual_rate_percent / MONTHS_PER_YEAR).round_dp(6),
        tenure_months: input.tenure_months,
        monthly_payment: breakdown.monthly_payment,
        total_payment: breakdown.total_payment,
        total_interest: breakdown.total_interest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Reducing-balance EMI (fixed installment amortization)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "down_payment": down.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "tenure_months": input.tenure_months,
            "rounding": "2dp, midpoint away from zero",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(principal: Decimal, rate: Decimal, tenure: u32) -> EmiInput {
        EmiInput {
            principal,
            down_payment: None,
            annual_rate_percent: rate,
            tenure_months: tenure,
        }
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let emi = compute_emi(dec!(1200), dec!(0), 12);
        assert_eq!(emi.monthly_payment, dec!(100.00));
        assert_eq!(emi.total_payment, dec!(1200.00));
        assert_eq!(emi.total_interest, dec!(0.00));
    }

    #[test]
    fn test_known_amortization_value() {
        let emi = compute_emi(dec!(100000), dec!(12), 12);
        assert_eq!(emi.monthly_payment, dec!(8884.88));
        assert_eq!(emi.total_payment, dec!(106618.56));
        assert_eq!(emi.total_interest, dec!(6618.56));
    }

    #[test]
    fn test_single_month_tenure() {
        let emi = compute_emi(dec!(5000), dec!(18), 1);
        // 5000 * (1 + 0.015) = 5075
        assert_eq!(emi.monthly_payment, dec!(5075.00));
        assert_eq!(emi.total_payment, emi.monthly_payment);
        assert_eq!(emi.total_interest, dec!(75.00));
    }

    #[test]
    fn test_non_positive_principal_is_zero() {
        assert_eq!(compute_emi(dec!(0), dec!(10), 24), EmiBreakdown::default());
        assert_eq!(compute_emi(dec!(-50), dec!(10), 24), EmiBreakdown::default());
    }

    #[test]
    fn test_zero_tenure_is_zero() {
        assert_eq!(compute_emi(dec!(1000), dec!(10), 0), EmiBreakdown::default());
    }

    #[test]
    fn test_idempotent() {
        let a = compute_emi(dec!(250000), dec!(8.75), 240);
        let b = compute_emi(dec!(250000), dec!(8.75), 240);
        assert_eq!(a, b);
    }

    #[test]
    fn test_overflowing_factor_uses_interest_only_limit() {
        // (1 + 5)^1000 is far beyond the decimal range
        let emi = compute_emi(dec!(1000), dec!(6000), 1000);
        assert_eq!(emi.monthly_payment, dec!(5000.00));
    }

    #[test]
    fn test_calculate_emi_envelope() {
        let out = calculate_emi(&input(dec!(100000), dec!(12), 12)).unwrap();
        assert_eq!(out.result.monthly_payment, dec!(8884.88));
        assert_eq!(out.result.financed_amount, dec!(100000));
        assert_eq!(out.result.monthly_rate_percent, dec!(1));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_down_payment_covering_principal() {
        let mut inp = input(dec!(40000), dec!(10), 12);
        inp.down_payment = Some(dec!(40000));
        let out = calculate_emi(&inp).unwrap();
        assert_eq!(out.result.financed_amount, Decimal::ZERO);
        assert_eq!(out.result.monthly_payment, Decimal::ZERO);
        assert_eq!(out.result.total_payment, Decimal::ZERO);
        assert_eq!(out.result.total_interest, Decimal::ZERO);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_rate_above_limit_rejected() {
        let err = calculate_emi(&input(dec!(1000), dec!(50.5), 12)).unwrap_err();
        assert!(matches!(err, EmiError::InvalidInput { ref field, .. } if field == "annual_rate_percent"));
    }

    #[test]
    fn test_custom_limits() {
        let limits = EmiLimits {
            max_annual_rate_percent: dec!(80),
            max_tenure_months: 12,
            ..EmiLimits::default()
        };
        assert!(calculate_emi_with_limits(&input(dec!(1000), dec!(60), 12), &limits).is_ok());
        assert!(calculate_emi_with_limits(&input(dec!(1000), dec!(60), 13), &limits).is_err());
    }

    #[test]
    fn test_zero_tenure_rejected() {
        assert!(calculate_emi(&input(dec!(1000), dec!(10), 0)).is_err());
    }

    #[test]
    fn test_negative_principal_rejected() {
        assert!(calculate_emi(&input(dec!(-1), dec!(10), 12)).is_err());
    }

    #[test]
    fn test_principal_above_limit_rejected() {
        let err = calculate_emi(&input(dec!(5000000000000000000000000000), dec!(50), 600))
            .unwrap_err();
        assert!(matches!(err, EmiError::InvalidInput { ref field, .. } if field == "principal"));
    }

    #[test]
    fn test_out_of_range_terms_rejected_under_loose_limits() {
        let limits = EmiLimits {
            max_annual_rate_percent: dec!(1000000),
            max_tenure_months: 600,
            max_principal: Decimal::MAX,
        };
        let err = calculate_emi_with_limits(
            &input(dec!(50000000000000000000000000000), dec!(1000000), 600),
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, EmiError::InvalidInput { ref field, .. } if field == "principal"));
    }

    #[test]
    fn test_compute_emi_out_of_range_is_zero() {
        let emi = compute_emi(Decimal::MAX, dec!(2400), 12);
        assert_eq!(emi, EmiBreakdown::default());
    }

    #[test]
    fn test_financed_amount_rounded_to_minor_unit() {
        let out = calculate_emi(&input(dec!(100.005), dec!(0), 1)).unwrap();
        assert_eq!(out.result.financed_amount, dec!(100.01));
        assert_eq!(out.result.total_payment, dec!(100.01));
    }
}
