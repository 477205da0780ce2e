use std::sync::Arc;

use iou_core::{OwningKey, Party, PartyName, SignedTransaction, TransactionBuilder, WireTransaction};
use iou_crypto::KeyPair;
use iou_ledger::{IdentityService, KeyManagementService, LedgerError, NetworkMapCache, NodeVault};

use crate::error::FlowError;
use crate::responder::{DefaultApprover, ProposalApprover};

/// Everything a node's flows and responders can reach.
pub struct ServiceHub {
    my_info: Party,
    pub identity: IdentityService,
    pub keys: Arc<KeyManagementService>,
    pub vault: NodeVault,
    pub network_map: Arc<NetworkMapCache>,
    pub approver: Arc<dyn ProposalApprover>,
}

impl ServiceHub {
    pub fn new(name: PartyName, network_map: Arc<NetworkMapCache>) -> Self {
        Self::with_approver(name, network_map, Arc::new(DefaultApprover))
    }

    pub fn with_approver(
        name: PartyName,
        network_map: Arc<NetworkMapCache>,
        approver: Arc<dyn ProposalApprover>,
    ) -> Self {
        let legal = KeyPair::generate();
        let my_info = Party::new(name, legal.owning_key());
        let keys = Arc::new(KeyManagementService::new(legal));
        let vault = NodeVault::new(keys.clone());
        let identity = IdentityService::new();
        identity.register(my_info.clone());
        Self {
            my_info,
            identity,
            keys,
            vault,
            network_map,
            approver,
        }
    }

    pub fn our_identity(&self) -> &Party {
        &self.my_info
    }

    /// The notary new transactions are sent to: the first one on the map.
    pub fn notary(&self) -> Result<Party, FlowError> {
        self.network_map
            .notary_identities()
            .into_iter()
            .next()
            .ok_or(FlowError::NoNotary)
    }

    /// Resolve a counterparty by X.500 name or organisation.
    pub fn resolve_party(&self, name: &str) -> Result<Party, FlowError> {
        self.identity.resolve(name).map_err(|e| match e {
            LedgerError::UnknownParty(name) => FlowError::UnknownParty(name),
            other => FlowError::Ledger(other),
        })
    }

    /// Sign the builder's transaction with `keys`, all of which must be ours.
    pub fn sign_initial_transaction<'a>(
        &self,
        builder: &TransactionBuilder,
        keys: impl IntoIterator<Item = &'a OwningKey>,
    ) -> Result<SignedTransaction, FlowError> {
        let wire = builder.to_wire_transaction();
        let sigs = self.keys.sign_all(&wire.id(), keys)?;
        Ok(SignedTransaction::new(wire, sigs))
    }

    /// The finalised transactions that produced the inputs of `tx`.
    pub fn dependencies(&self, tx: &WireTransaction) -> Result<Vec<SignedTransaction>, FlowError> {
        let mut ids: Vec<_> = tx.inputs.iter().map(|r| r.tx_id).collect();
        ids.sort();
        ids.dedup();
        ids.into_iter()
            .map(|id| {
                self.vault
                    .transaction(&id)
                    .ok_or(FlowError::Ledger(LedgerError::TransactionNotFound(id)))
            })
            .collect()
    }
}
