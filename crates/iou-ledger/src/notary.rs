use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use iou_core::{Party, PartyName, SignedTransaction, StateRef, TransactionSignature, TxId};
use iou_crypto::{sign_transaction, verify_signatures, KeyPair};
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::traits::NotaryService;

/// Single-node, non-validating notary.
///
/// Checks signatures and input uniqueness only. Contract validity is the
/// business of the transaction's participants.
pub struct InMemoryNotary {
    identity: Party,
    key: KeyPair,
    /// Consumed input -> the transaction that consumed it.
    committed: Mutex<HashMap<StateRef, TxId>>,
}

impl InMemoryNotary {
    pub fn new(name: PartyName) -> Self {
        let key = KeyPair::generate();
        let identity = Party::new(name, key.owning_key());
        Self {
            identity,
            key,
            committed: Mutex::new(HashMap::new()),
        }
    }

    /// Number of input states committed so far.
    pub async fn committed_count(&self) -> usize {
        self.committed.lock().await.len()
    }
}

#[async_trait]
impl NotaryService for InMemoryNotary {
    fn identity(&self) -> &Party {
        &self.identity
    }

    async fn notarise(&self, stx: &SignedTransaction) -> Result<TransactionSignature, LedgerError> {
        let id = stx.id();
        if stx.tx.notary != self.identity {
            return Err(LedgerError::WrongNotary(stx.tx.notary.name.to_string()));
        }

        let own_key: BTreeSet<_> = [self.identity.owning_key].into_iter().collect();
        verify_signatures(stx, &own_key)?;

        let mut committed = self.committed.lock().await;
        for input in &stx.tx.inputs {
            if let Some(consumed_by) = committed.get(input) {
                if *consumed_by != id {
                    tracing::warn!(
                        tx_id = %id,
                        state = %input,
                        consumed_by = %consumed_by,
                        "double spend rejected"
                    );
                    return Err(LedgerError::DoubleSpend {
                        state: *input,
                        consumed_by: *consumed_by,
                    });
                }
            }
        }
        for input in &stx.tx.inputs {
            committed.insert(*input, id);
        }
        drop(committed);

        tracing::info!(tx_id = %id, inputs = stx.tx.inputs.len(), "transaction notarised");
        Ok(sign_transaction(&id, &self.key))
    }
}
