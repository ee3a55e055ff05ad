use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calculator::{checked_emi, round_money, validate_principal, validate_terms, EmiLimits};
use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

/// Buying an item on instalments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseEmiInput {
    pub item_price: Money,
    #[serde(default)]
    pub down_payment: Money,
    pub annual_rate_percent: Percent,
    pub tenure_months: u32,
    /// One-off fee charged on the financed amount, paid upfront
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_fee_percent: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseEmiOutput {
    pub financed_amount: Money,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub processing_fee: Money,
    /// Down payment plus processing fee
    pub upfront_cost: Money,
    /// Everything paid for the item over the life of the plan
    pub total_cost: Money,
    /// Extra paid relative to buying outright
    pub cost_over_price: Money,
}

pub fn calculate_purchase_emi(
    input: &PurchaseEmiInput,
) -> EmiResult<ComputationOutput<PurchaseEmiOutput>> {
    calculate_purchase_emi_with_limits(input, &EmiLimits::default())
}

pub fn calculate_purchase_emi_with_limits(
    input: &PurchaseEmiInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<PurchaseEmiOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.item_price <= Decimal::ZERO {
        return Err(EmiError::invalid("item_price", "Item price must be positive"));
    }
    validate_principal("item_price", input.item_price, limits)?;
    if input.down_payment < Decimal::ZERO {
        return Err(EmiError::invalid(
            "down_payment",
            "Down payment cannot be negative",
        ));
    }
    let fee_percent = input.processing_fee_percent.unwrap_or(Decimal::ZERO);
    if fee_percent < Decimal::ZERO {
        return Err(EmiError::invalid(
            "processing_fee_percent",
            "Processing fee cannot be negative",
        ));
    }
    validate_terms(input.annual_rate_percent, input.tenure_months, limits)?;

    let financed = round_money(input.item_price - input.down_payment).max(Decimal::ZERO);
    if financed.is_zero() {
        warnings.push("Down payment covers the item price; no EMI required".into());
    }
    if input.down_payment > input.item_price {
        warnings.push(format!(
            "Down payment exceeds item price by {}",
            input.down_payment - input.item_price
        ));
    }

    let breakdown = checked_emi(financed, input.annual_rate_percent, input.tenure_months)?;
    let processing_fee = financed
        .checked_mul(fee_percent)
        .map(|fee| round_money(fee / dec!(100)))
        .ok_or_else(|| {
            EmiError::invalid("processing_fee_percent", "Processing fee is out of range")
        })?;
    let upfront_cost = input.down_payment + processing_fee;
    let total_cost = upfront_cost + breakdown.total_payment;

    let output = PurchaseEmiOutput {
        financed_amount: financed,
        monthly_payment: breakdown.monthly_payment,
        total_payment: breakdown.total_payment,
        total_interest: breakdown.total_interest,
        processing_fee,
        upfront_cost,
        total_cost,
        cost_over_price: total_cost - input.item_price,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Purchase EMI (price less down payment, fee paid upfront)",
        &serde_json::json!({
            "item_price": input.item_price.to_string(),
            "down_payment": input.down_payment.to_string(),
            "annual_rate_percent": input.annual_rate_percent.to_string(),
            "tenure_months": input.tenure_months,
            "processing_fee_percent": fee_percent.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
