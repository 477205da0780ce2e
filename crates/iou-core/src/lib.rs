pub mod error;
pub mod types;
pub mod note;
pub mod cash;
pub mod transaction;
pub mod contract;

pub use error::{ContractViolation, CoreError};
pub use note::DebtNote;
pub use cash::{CashContract, CashHolding};
pub use contract::IouContract;
pub use transaction::{
    CashCommand, Command, CommandData, IouCommand, LedgerState, LedgerTransaction,
    SignedTransaction, StateAndRef, StateRef, TransactionBuilder, TransactionSignature, TxId,
    WireTransaction,
};
pub use types::{Amount, Currency, LinearId, OwningKey, Party, PartyAndReference, PartyName};
