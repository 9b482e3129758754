use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinCalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error(
        "Infeasible repayment: a fixed payment of {payment} cannot amortize a balance of \
         {balance} at a monthly rate of {monthly_rate}"
    )]
    InfeasibleRepayment {
        balance: Decimal,
        payment: Decimal,
        monthly_rate: Decimal,
    },

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl FinCalcError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FinCalcError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FinCalcError {
    fn from(e: serde_json::Error) -> Self {
        FinCalcError::SerializationError(e.to_string())
    }
}
