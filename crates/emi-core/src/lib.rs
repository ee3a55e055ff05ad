pub mod error;
pub mod format;
pub mod types;

#[cfg(feature = "emi")]
pub mod emi;

#[cfg(feature = "loans")]
pub mod loans;

#[cfg(feature = "lending")]
pub mod lending;

pub use error::EmiError;
pub use types::*;

/// Standard result type for all EMI operations
pub type EmiResult<T> = Result<T, EmiError>;
