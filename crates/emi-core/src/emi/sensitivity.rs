use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::calculator::{checked_emi, validate_principal, EmiBreakdown, EmiLimits};
use crate::error::EmiError;
use crate::types::*;
use crate::EmiResult;

const MAX_GRID_CELLS: usize = 10_000;

/// Annual rates swept from `min` to `max` inclusive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSweep {
    pub min: Percent,
    pub max: Percent,
    pub step: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiSensitivityInput {
    pub principal: Money,
    pub rate_sweep: RateSweep,
    pub tenures: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmiSensitivityOutput {
    pub principal: Money,
    pub rates: Vec<Percent>,
    pub tenures: Vec<u32>,
    /// monthly_payment[i][j] = EMI at rates[i], tenures[j]
    pub monthly_payment: Vec<Vec<Money>>,
    pub total_interest: Vec<Vec<Money>>,
}

fn sweep_values(sweep: &RateSweep) -> EmiResult<Vec<Percent>> {
    if sweep.step <= Decimal::ZERO {
        return Err(EmiError::invalid("rate_sweep.step", "Step must be positive"));
    }
    if sweep.min < Decimal::ZERO {
        return Err(EmiError::invalid(
            "rate_sweep.min",
            "Interest rate cannot be negative",
        ));
    }
    if sweep.min > sweep.max {
        return Err(EmiError::invalid("rate_sweep", "Min must be <= max"));
    }

    let mut values = Vec::new();
    let mut current = sweep.min;
    while current <= sweep.max {
        values.push(current);
        if values.len() > MAX_GRID_CELLS {
            return Err(EmiError::invalid(
                "rate_sweep",
                format!("Sweep produces more than {MAX_GRID_CELLS} rates"),
            ));
        }
        current += sweep.step;
    }
    // Include max when the step does not land on it
    if let Some(&last) = values.last() {
        if last < sweep.max {
            values.push(sweep.max);
        }
    }
    Ok(values)
}

/// EMI and total interest over a grid of rates and tenures for one principal.
pub fn emi_sensitivity(
    input: &EmiSensitivityInput,
) -> EmiResult<ComputationOutput<EmiSensitivityOutput>> {
    emi_sensitivity_with_limits(input, &EmiLimits::default())
}

/// Sensitivity grid whose principal, rates and tenures all stay within `limits`.
pub fn emi_sensitivity_with_limits(
    input: &EmiSensitivityInput,
    limits: &EmiLimits,
) -> EmiResult<ComputationOutput<EmiSensitivityOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if input.principal <= Decimal::ZERO {
        return Err(EmiError::invalid("principal", "Principal must be positive"));
    }
    validate_principal("principal", input.principal, limits)?;
    if input.tenures.is_empty() {
        return Err(EmiError::InsufficientData(
            "At least one tenure is required".into(),
        ));
    }
    if let Some(&bad) = input
        .tenures
        .iter()
        .find(|&&n| n == 0 || n > limits.max_tenure_months)
    {
        return Err(EmiError::invalid(
            "tenures",
            format!(
                "Tenure {bad} must be between 1 and {} months",
                limits.max_tenure_months
            ),
        ));
    }
    if input.rate_sweep.max > limits.max_annual_rate_percent {
        return Err(EmiError::invalid(
            "rate_sweep.max",
            format!(
                "Interest rate must be at most {}%",
                limits.max_annual_rate_percent
            ),
        ));
    }

    let rates = sweep_values(&input.rate_sweep)?;
    let cells = rates.len() * input.tenures.len();
    if cells > MAX_GRID_CELLS {
        return Err(EmiError::invalid(
            "rate_sweep",
            format!("Grid has {cells} cells; limit is {MAX_GRID_CELLS}"),
        ));
    }

    let mut monthly_payment: Vec<Vec<Money>> = Vec::with_capacity(rates.len());
    let mut total_interest: Vec<Vec<Money>> = Vec::with_capacity(rates.len());
    for &rate in &rates {
        let row: Vec<EmiBreakdown> = input
            .tenures
            .iter()
            .map(|&n| checked_emi(input.principal, rate, n))
            .collect::<EmiResult<_>>()?;
        monthly_payment.push(row.iter().map(|b| b.monthly_payment).collect());
        total_interest.push(row.iter().map(|b| b.total_interest).collect());
    }

    let output = EmiSensitivityOutput {
        principal: input.principal,
        rates,
        tenures: input.tenures.clone(),
        monthly_payment,
        total_interest,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "EMI sensitivity grid (rate x tenure)",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "rate_min": input.rate_sweep.min.to_string(),
            "rate_max": input.rate_sweep.max.to_string(),
            "rate_step": input.rate_sweep.step.to_string(),
            "tenures": input.tenures,
        }),
        warnings,
        elapsed,
        output,
    ))
}
