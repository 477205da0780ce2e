use iou_core::{Amount, ContractViolation, CoreError, OwningKey, PartyName, TxId};
use iou_crypto::CryptoError;
use iou_ledger::LedgerError;

/// Flow errors. Every variant is terminal for the request that raised it.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// A contract clause failed; the clause text is passed through as-is.
    #[error("{0}")]
    Contract(#[from] ContractViolation),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Borrower only has {available} but needs {required} to settle.")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("Borrower tried to settle with {payment} but only needs {remaining}.")]
    Overpayment { payment: Amount, remaining: Amount },

    #[error("{party} refused to sign: {reason}")]
    CounterpartyRefused { party: PartyName, reason: String },

    #[error("transaction carries a signature by unknown key {0}")]
    UnknownSigner(OwningKey),

    #[error("no node on the network is called {0}")]
    UnknownParty(String),

    #[error("no notary on the network")]
    NoNotary,

    #[error("protocol error: {0}")]
    Protocol(String),

    /// The transaction is final but some counterparties did not record it.
    #[error("transaction {tx_id} is final but was not recorded by {}", describe_failures(.failures))]
    Undelivered {
        tx_id: TxId,
        failures: Vec<(PartyName, String)>,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

fn describe_failures(failures: &[(PartyName, String)]) -> String {
    failures
        .iter()
        .map(|(party, reason)| format!("{} ({})", party, reason))
        .collect::<Vec<_>>()
        .join(", ")
}
