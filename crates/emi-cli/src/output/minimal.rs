use emi_core::format::format_money;
use emi_core::Currency;
use rust_decimal::Decimal;
use serde_json::Value;

use super::format_value;

/// Result fields worth printing on their own, most specific first.
const PRIORITY_KEYS: [&str; 7] = [
    "new_monthly_payment",
    "monthly_payment",
    "outstanding_balance",
    "total_outstanding",
    "net_position",
    "interest_saved",
    "total_cost",
];

/// Print just the key answer value from the output, formatted in `currency`.
///
/// Looks for well-known result fields in priority order, then falls back to
/// the first field in the result object.
pub fn print_minimal(value: &Value, currency: &Currency) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    println!("{}", format_amount(val, currency));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_value(val));
            return;
        }
    }

    println!("{}", format_value(result_obj));
}

/// Money fields serialise as decimal strings; anything unparseable prints as-is.
fn format_amount(value: &Value, currency: &Currency) -> String {
    value
        .as_str()
        .and_then(|s| s.parse::<Decimal>().ok())
        .map(|amount| format_money(amount, currency))
        .unwrap_or_else(|| format_value(value))
}
