use emi_core::emi::calculator::{self, EmiInput};
use emi_core::emi::{compute_emi, schedule, EmiBreakdown};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Fixed-installment EMI properties
// ===========================================================================

#[test]
fn test_zero_rate_straight_line() {
    assert_eq!(
        compute_emi(dec!(1200), dec!(0), 12),
        EmiBreakdown {
            monthly_payment: dec!(100.00),
            total_payment: dec!(1200.00),
            total_interest: dec!(0.00),
        }
    );
}

#[test]
fn test_known_amortization_table_value() {
    // 12% p.a. over 12 months => monthly rate 1%
    let emi = compute_emi(dec!(100000), dec!(12), 12);
    assert!(
        (emi.monthly_payment - dec!(8884.88)).abs() <= dec!(0.01),
        "Expected EMI ~8884.88, got {}",
        emi.monthly_payment
    );
    assert!(
        (emi.total_interest - dec!(6618.56)).abs() <= dec!(0.01),
        "Expected interest ~6618.56, got {}",
        emi.total_interest
    );
}

#[test]
fn test_single_month_tenure_pays_one_month_interest() {
    for (principal, rate) in [
        (dec!(1000), dec!(12)),
        (dec!(2500.50), dec!(7.5)),
        (dec!(99999), dec!(49)),
    ] {
        let emi = compute_emi(principal, rate, 1);
        let expected = principal * (Decimal::ONE + rate / dec!(12) / dec!(100));
        assert!((emi.monthly_payment - expected).abs() <= dec!(0.005));
        assert_eq!(emi.total_payment, emi.monthly_payment);
        assert_eq!(emi.total_interest, emi.monthly_payment - principal);
    }
}

#[test]
fn test_monthly_payment_strictly_increasing_in_rate() {
    let rates = [
        dec!(0),
        dec!(0.5),
        dec!(1),
        dec!(5),
        dec!(8.25),
        dec!(12),
        dec!(20),
        dec!(35),
        dec!(50),
    ];
    let payments: Vec<Decimal> = rates
        .iter()
        .map(|&r| compute_emi(dec!(500000), r, 60).monthly_payment)
        .collect();
    for pair in payments.windows(2) {
        assert!(pair[1] > pair[0], "EMI not increasing: {:?}", payments);
    }
}

#[test]
fn test_scale_invariance() {
    let base = compute_emi(dec!(75000), dec!(10.5), 36).monthly_payment;
    for k in [dec!(2), dec!(10), dec!(0.5), dec!(123)] {
        let scaled = compute_emi(dec!(75000) * k, dec!(10.5), 36).monthly_payment;
        // Each side is rounded to a cent, so the gap is bounded by half a cent on each
        let tolerance = dec!(0.005) * (k + Decimal::ONE);
        assert!(
            (scaled - k * base).abs() <= tolerance,
            "k={k}: {scaled} vs {}",
            k * base
        );
    }
}

#[test]
fn test_down_payment_at_or_above_principal_gives_zeros() {
    for down in [dec!(20000), dec!(25000)] {
        let out = calculator::calculate_emi(&EmiInput {
            principal: dec!(20000),
            down_payment: Some(down),
            annual_rate_percent: dec!(11),
            tenure_months: 18,
        })
        .unwrap();
        assert_eq!(out.result.monthly_payment, Decimal::ZERO);
        assert_eq!(out.result.total_payment, Decimal::ZERO);
        assert_eq!(out.result.total_interest, Decimal::ZERO);
    }
}

#[test]
fn test_down_payment_reduces_financed_amount() {
    let with_down = calculator::calculate_emi(&EmiInput {
        principal: dec!(800000),
        down_payment: Some(dec!(200000)),
        annual_rate_percent: dec!(9),
        tenure_months: 60,
    })
    .unwrap();
    assert_eq!(with_down.result.financed_amount, dec!(600000));
    assert_eq!(
        with_down.result.monthly_payment,
        compute_emi(dec!(600000), dec!(9), 60).monthly_payment
    );
}

#[test]
fn test_outputs_are_non_negative_and_two_decimal() {
    for (p, r, n) in [
        (dec!(1000), dec!(0), 7),
        (dec!(1234.56), dec!(13.37), 19),
        (dec!(5000000), dec!(8.4), 240),
    ] {
        let emi = compute_emi(p, r, n);
        for v in [emi.monthly_payment, emi.total_payment, emi.total_interest] {
            assert!(v >= Decimal::ZERO);
            assert!(v.scale() <= 2, "{v} has more than 2 dp");
        }
    }
}

// ===========================================================================
// Schedule agrees with the calculator
// ===========================================================================

#[test]
fn test_schedule_totals_match_emi_within_rounding() {
    let emi = compute_emi(dec!(350000), dec!(10.25), 48);
    let rows = schedule::amortize(dec!(350000), dec!(10.25), 48);
    assert_eq!(rows.len(), 48);
    assert!(rows[..47]
        .iter()
        .all(|r| r.installment == emi.monthly_payment));

    let paid: Decimal = rows.iter().map(|r| r.installment).sum();
    // Per-row interest rounding drifts by at most a few cents over the tenure
    assert!((paid - emi.total_payment).abs() < dec!(1));
}
