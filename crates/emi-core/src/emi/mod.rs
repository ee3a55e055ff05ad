pub mod calculator;
pub mod prepayment;
pub mod purchase;
pub mod schedule;
pub mod sensitivity;

pub use calculator::{compute_emi, round_money, EmiBreakdown, EmiLimits};
