pub mod emi;
pub mod lending;
pub mod loans;
