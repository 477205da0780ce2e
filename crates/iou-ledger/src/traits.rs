use async_trait::async_trait;
use iou_core::{Party, SignedTransaction, TransactionSignature};

use crate::error::LedgerError;

/// Ordering service for state consumption.
///
/// Each implementation guarantees that a given input state is consumed by
/// at most one transaction. Transactions without inputs need no notary.
#[async_trait]
pub trait NotaryService: Send + Sync {
    /// The identity transactions name as their notary.
    fn identity(&self) -> &Party;

    /// Commit the inputs of `stx` and return the notary's signature over
    /// its id. Fails with [`LedgerError::DoubleSpend`] if any input was
    /// already consumed by a different transaction.
    async fn notarise(&self, stx: &SignedTransaction) -> Result<TransactionSignature, LedgerError>;
}
