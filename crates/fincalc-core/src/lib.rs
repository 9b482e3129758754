pub mod error;
pub mod types;

#[cfg(feature = "mortgage")]
pub mod mortgage;

#[cfg(feature = "tax")]
pub mod tax;

#[cfg(feature = "growth")]
pub mod growth;

#[cfg(feature = "salary")]
pub mod salary;

#[cfg(feature = "scenarios")]
pub mod scenarios;

#[cfg(feature = "operations")]
pub mod operations;

pub use error::FinCalcError;
pub use types::*;

/// Standard result type for all fincalc operations
pub type FinCalcResult<T> = Result<T, FinCalcError>;
