use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use iou_core::{OwningKey, Party, PartyName, SignedTransaction, TransactionSignature};
use iou_ledger::{InMemoryNotary, NetworkMapCache, NotaryService};

use crate::error::FlowError;
use crate::hub::ServiceHub;
use crate::responder::{self, ProposalApprover};
use crate::session::{FlowContext, FlowKind, FlowSession, IdentityMapping, Messaging, SignatureRequest};

/// Several nodes and notaries hosted in one process. Sessions are direct
/// calls into the counterparty's responder.
pub struct LocalNetwork {
    network_map: Arc<NetworkMapCache>,
    nodes: DashMap<OwningKey, Arc<ServiceHub>>,
    notaries: DashMap<OwningKey, Arc<dyn NotaryService>>,
}

impl LocalNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            network_map: Arc::new(NetworkMapCache::new()),
            nodes: DashMap::new(),
            notaries: DashMap::new(),
        })
    }

    pub fn network_map(&self) -> &Arc<NetworkMapCache> {
        &self.network_map
    }

    pub fn add_notary(&self, name: PartyName) -> Party {
        let notary = Arc::new(InMemoryNotary::new(name));
        let identity = notary.identity().clone();
        self.notaries.insert(identity.owning_key, notary);
        self.network_map.add_notary(identity.clone());
        self.introduce(&identity);
        identity
    }

    pub fn add_node(&self, name: PartyName) -> Arc<ServiceHub> {
        let hub = Arc::new(ServiceHub::new(name, self.network_map.clone()));
        self.register(hub)
    }

    /// Add a node whose responders apply `approver` before countersigning.
    pub fn add_node_with_approver(&self, name: PartyName, approver: Arc<dyn ProposalApprover>) -> Arc<ServiceHub> {
        let hub = Arc::new(ServiceHub::with_approver(name, self.network_map.clone(), approver));
        self.register(hub)
    }

    fn register(&self, hub: Arc<ServiceHub>) -> Arc<ServiceHub> {
        let me = hub.our_identity().clone();
        for known in self.network_map.all_nodes() {
            hub.identity.register(known.legal_identity);
        }
        self.introduce(&me);
        self.network_map.add_node(me.clone());
        self.nodes.insert(me.owning_key, hub.clone());
        hub
    }

    /// Make `party` known to every hosted node.
    fn introduce(&self, party: &Party) {
        for node in self.nodes.iter() {
            node.value().identity.register(party.clone());
        }
    }

    pub fn node(&self, party: &Party) -> Option<Arc<ServiceHub>> {
        self.nodes.get(&party.owning_key).map(|n| n.value().clone())
    }

    pub fn node_by_organisation(&self, organisation: &str) -> Option<Arc<ServiceHub>> {
        self.nodes
            .iter()
            .find(|n| {
                n.value()
                    .our_identity()
                    .name
                    .organisation
                    .eq_ignore_ascii_case(organisation)
            })
            .map(|n| n.value().clone())
    }

    pub fn nodes(&self) -> Vec<Arc<ServiceHub>> {
        let mut nodes: Vec<_> = self.nodes.iter().map(|n| n.value().clone()).collect();
        nodes.sort_by(|a, b| a.our_identity().name.cmp(&b.our_identity().name));
        nodes
    }

    /// A flow context for running flows as `hub`.
    pub fn context(self: &Arc<Self>, hub: Arc<ServiceHub>) -> FlowContext {
        FlowContext::new(hub, self.clone())
    }
}

impl Messaging for LocalNetwork {
    fn initiate_flow(
        &self,
        initiator: &Party,
        party: &Party,
        kind: FlowKind,
    ) -> Result<Box<dyn FlowSession>, FlowError> {
        let hub = self
            .node(party)
            .ok_or_else(|| FlowError::UnknownParty(party.name.to_string()))?;
        tracing::debug!(initiator = %initiator.name, counterparty = %party.name, flow = %kind, "session opened");
        Ok(Box::new(LocalSession {
            initiator: initiator.clone(),
            counterparty: party.clone(),
            kind,
            hub,
        }))
    }

    fn notary_service(&self, notary: &Party) -> Result<Arc<dyn NotaryService>, FlowError> {
        self.notaries
            .get(&notary.owning_key)
            .map(|n| n.value().clone())
            .ok_or(FlowError::NoNotary)
    }
}

/// Session whose counterparty lives in the same process.
struct LocalSession {
    initiator: Party,
    counterparty: Party,
    kind: FlowKind,
    hub: Arc<ServiceHub>,
}

#[async_trait]
impl FlowSession for LocalSession {
    fn counterparty(&self) -> &Party {
        &self.counterparty
    }

    async fn send_identities(&self, mappings: Vec<IdentityMapping>) -> Result<(), FlowError> {
        responder::receive_identities(&self.hub, &self.initiator, mappings)
    }

    async fn request_signatures(
        &self,
        request: SignatureRequest,
    ) -> Result<Vec<TransactionSignature>, FlowError> {
        responder::sign_proposal(&self.hub, &self.initiator, self.kind, request)
    }

    async fn send_finalised(
        &self,
        stx: SignedTransaction,
        dependencies: Vec<SignedTransaction>,
    ) -> Result<(), FlowError> {
        responder::receive_finalised(&self.hub, stx, dependencies)
    }
}
