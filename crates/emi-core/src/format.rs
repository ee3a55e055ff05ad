//! Display formatting for monetary amounts.
//!
//! Applied only when presenting results; computations never see formatted values.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::{Currency, Money};

impl Currency {
    pub fn symbol(&self) -> String {
        match self {
            Currency::INR => "₹".into(),
            Currency::USD => "$".into(),
            Currency::EUR => "€".into(),
            Currency::GBP => "£".into(),
            Currency::JPY => "¥".into(),
            Currency::CAD => "CA$".into(),
            Currency::AUD => "A$".into(),
            Currency::CHF => "CHF ".into(),
            Currency::SGD => "S$".into(),
            Currency::Other(code) => format!("{code} "),
        }
    }

    /// Digits after the decimal point in the major unit
    pub fn minor_digits(&self) -> u32 {
        match self {
            Currency::JPY => 0,
            _ => 2,
        }
    }
}

/// Insert separators: groups of three, or lakh/crore grouping (3 then 2s) for INR.
fn group_digits(digits: &str, currency: &Currency) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(len - 3);
    let group = if *currency == Currency::INR { 2 } else { 3 };

    let mut parts: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let begin = end.saturating_sub(group);
        parts.push(&head[begin..end]);
        end = begin;
    }
    parts.reverse();
    parts.push(tail);
    parts.join(",")
}

/// Format an amount with the currency symbol, grouping and minor-unit precision.
///
/// `format_money(dec!(1234567.5), &Currency::INR)` gives `₹12,34,567.50`.
pub fn format_money(amount: Money, currency: &Currency) -> String {
    let digits = currency.minor_digits();
    let mut value = amount
        .abs()
        .round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(digits);

    let text = value.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let sign = if amount < Decimal::ZERO && !value.is_zero() {
        "-"
    } else {
        ""
    };
    let grouped = group_digits(int_part, currency);
    match frac_part {
        Some(f) => format!("{sign}{}{grouped}.{f}", currency.symbol()),
        None => format!("{sign}{}{grouped}", currency.symbol()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_inr_lakh_grouping() {
        assert_eq!(format_money(dec!(1234567.5), &Currency::INR), "₹12,34,567.50");
        assert_eq!(format_money(dec!(100000), &Currency::INR), "₹1,00,000.00");
    }

    #[test]
    fn test_usd_thousands() {
        assert_eq!(format_money(dec!(8884.878), &Currency::USD), "$8,884.88");
        assert_eq!(format_money(dec!(1234567), &Currency::USD), "$1,234,567.00");
        assert_eq!(format_money(dec!(999), &Currency::USD), "$999.00");
    }

    #[test]
    fn test_negative_and_zero() {
        assert_eq!(format_money(dec!(-1500.25), &Currency::EUR), "-€1,500.25");
        assert_eq!(format_money(dec!(-0.001), &Currency::EUR), "€0.00");
    }

    #[test]
    fn test_jpy_has_no_minor_unit() {
        assert_eq!(format_money(dec!(150000.4), &Currency::JPY), "¥150,000");
    }

    #[test]
    fn test_other_currency_uses_code() {
        assert_eq!(
            format_money(dec!(42), &Currency::from_code("nzd")),
            "NZD 42.00"
        );
    }
}
