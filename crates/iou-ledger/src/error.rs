use iou_core::{Amount, ContractViolation, CoreError, LinearId, OwningKey, StateRef, TxId};
use iou_crypto::CryptoError;

/// Ledger service errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("no unconsumed IOU with id {0}")]
    NoteNotFound(LinearId),

    #[error("expected one unconsumed IOU with id {id}, found {count}")]
    AmbiguousNote { id: LinearId, count: usize },

    #[error("unknown party: {0}")]
    UnknownParty(String),

    #[error("key {0} is not held by this node")]
    UnknownKey(OwningKey),

    #[error("transaction not found: {0}")]
    TransactionNotFound(TxId),

    #[error("key {key} is already mapped to {existing}")]
    ConflictingIdentity { key: OwningKey, existing: String },

    #[error("input state {state} was already consumed by transaction {consumed_by}")]
    DoubleSpend { state: StateRef, consumed_by: TxId },

    #[error("transaction names notary {0}, which is not this notary")]
    WrongNotary(String),

    #[error("insufficient cash: available {available}, required {required}")]
    InsufficientCash { available: Amount, required: Amount },

    #[error("contract rejected transaction: {0}")]
    Contract(#[from] ContractViolation),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
