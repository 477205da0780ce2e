use crate::transaction::StateRef;
use crate::types::{Amount, Currency};

/// Core ledger model errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("token mismatch: {left} vs {right}")]
    CurrencyMismatch { left: Currency, right: Currency },

    #[error("amount overflow")]
    AmountOverflow,

    #[error("amount underflow: {left} - {right}")]
    AmountUnderflow { left: Amount, right: Amount },

    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("invalid party name: {0}")]
    InvalidPartyName(String),

    #[error("invalid linear id: {0}")]
    InvalidLinearId(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("payment of {payment} exceeds the outstanding {remaining}")]
    Overpayment { payment: Amount, remaining: Amount },

    #[error("input state {0} could not be resolved")]
    UnresolvedInput(StateRef),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A contract clause failed. The message is the clause text and is meant to
/// be shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ContractViolation(pub String);

impl ContractViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<CoreError> for ContractViolation {
    fn from(err: CoreError) -> Self {
        Self(err.to_string())
    }
}
