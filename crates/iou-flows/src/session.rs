use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use iou_core::{OwningKey, Party, SignedTransaction, TransactionSignature};
use iou_ledger::NotaryService;
use serde::{Deserialize, Serialize};

use crate::error::FlowError;
use crate::hub::ServiceHub;

/// Which initiating flow a session belongs to; selects the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowKind {
    Issue,
    Transfer,
    Settle,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Issue => write!(f, "issue"),
            Self::Transfer => write!(f, "transfer"),
            Self::Settle => write!(f, "settle"),
        }
    }
}

/// A partially signed transaction sent for countersignature, with the
/// transactions needed to resolve its inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub stx: SignedTransaction,
    pub dependencies: Vec<SignedTransaction>,
}

/// Claim that `key` belongs to `party`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMapping {
    pub key: OwningKey,
    pub party: Party,
}

/// One side of a conversation with a counterparty's responder.
#[async_trait]
pub trait FlowSession: Send + Sync {
    fn counterparty(&self) -> &Party;

    async fn send_identities(&self, mappings: Vec<IdentityMapping>) -> Result<(), FlowError>;

    /// Ask the counterparty to countersign. Returns its signatures or the
    /// reason it refused.
    async fn request_signatures(
        &self,
        request: SignatureRequest,
    ) -> Result<Vec<TransactionSignature>, FlowError>;

    /// Hand the counterparty the notarised transaction to record.
    async fn send_finalised(
        &self,
        stx: SignedTransaction,
        dependencies: Vec<SignedTransaction>,
    ) -> Result<(), FlowError>;
}

/// Transport between nodes.
pub trait Messaging: Send + Sync {
    /// Open a session with `party`'s responder for `kind`, on behalf of
    /// `initiator`.
    fn initiate_flow(
        &self,
        initiator: &Party,
        party: &Party,
        kind: FlowKind,
    ) -> Result<Box<dyn FlowSession>, FlowError>;

    /// The notary service behind a notary identity.
    fn notary_service(&self, notary: &Party) -> Result<Arc<dyn NotaryService>, FlowError>;
}

/// What a running flow has access to: its node and the network.
#[derive(Clone)]
pub struct FlowContext {
    pub hub: Arc<ServiceHub>,
    pub messaging: Arc<dyn Messaging>,
}

impl FlowContext {
    pub fn new(hub: Arc<ServiceHub>, messaging: Arc<dyn Messaging>) -> Self {
        Self { hub, messaging }
    }

    pub fn our_identity(&self) -> &Party {
        self.hub.our_identity()
    }

    pub fn initiate_flow(&self, party: &Party, kind: FlowKind) -> Result<Box<dyn FlowSession>, FlowError> {
        self.messaging.initiate_flow(self.our_identity(), party, kind)
    }
}
