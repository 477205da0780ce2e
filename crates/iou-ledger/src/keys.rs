use std::collections::BTreeSet;

use dashmap::DashMap;
use iou_core::{OwningKey, TransactionSignature, TxId};
use iou_crypto::{sign_transaction, KeyPair};

use crate::error::LedgerError;

/// The private keys a node holds: its legal identity key plus any fresh
/// anonymous keys it has generated for receiving cash.
pub struct KeyManagementService {
    legal_key: OwningKey,
    keys: DashMap<OwningKey, KeyPair>,
}

impl KeyManagementService {
    pub fn new(legal_identity: KeyPair) -> Self {
        let legal_key = legal_identity.owning_key();
        let keys = DashMap::new();
        keys.insert(legal_key, legal_identity);
        Self { legal_key, keys }
    }

    pub fn legal_key(&self) -> OwningKey {
        self.legal_key
    }

    /// Generate and keep a new anonymous key.
    pub fn fresh_key(&self) -> OwningKey {
        let kp = KeyPair::generate();
        let key = kp.owning_key();
        self.keys.insert(key, kp);
        tracing::debug!(key = %key.short(), "generated fresh key");
        key
    }

    pub fn owns(&self, key: &OwningKey) -> bool {
        self.keys.contains_key(key)
    }

    /// The subset of `candidates` this node can sign for.
    pub fn filter_my_keys<'a>(&self, candidates: impl IntoIterator<Item = &'a OwningKey>) -> BTreeSet<OwningKey> {
        candidates.into_iter().filter(|k| self.owns(k)).copied().collect()
    }

    pub fn sign(&self, tx_id: &TxId, key: &OwningKey) -> Result<TransactionSignature, LedgerError> {
        let kp = self.keys.get(key).ok_or(LedgerError::UnknownKey(*key))?;
        Ok(sign_transaction(tx_id, kp.value()))
    }

    /// Sign with each of `keys`; fails on the first key not held here.
    pub fn sign_all<'a>(
        &self,
        tx_id: &TxId,
        keys: impl IntoIterator<Item = &'a OwningKey>,
    ) -> Result<Vec<TransactionSignature>, LedgerError> {
        keys.into_iter().map(|k| self.sign(tx_id, k)).collect()
    }
}
