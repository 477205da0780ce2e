use dashmap::DashMap;
use iou_core::{OwningKey, Party, PartyName};
use serde::Serialize;

/// A node advertised on the network map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub legal_identity: Party,
    pub is_notary: bool,
}

/// The network's directory of nodes and notaries. Shared by every node.
pub struct NetworkMapCache {
    nodes: DashMap<OwningKey, NodeInfo>,
}

impl NetworkMapCache {
    pub fn new() -> Self {
        Self {
            nodes: DashMap::new(),
        }
    }

    pub fn add_node(&self, party: Party) {
        tracing::info!(party = %party.name, "node added to network map");
        self.nodes.insert(
            party.owning_key,
            NodeInfo {
                legal_identity: party,
                is_notary: false,
            },
        );
    }

    pub fn add_notary(&self, party: Party) {
        tracing::info!(party = %party.name, "notary added to network map");
        self.nodes.insert(
            party.owning_key,
            NodeInfo {
                legal_identity: party,
                is_notary: true,
            },
        );
    }

    pub fn all_nodes(&self) -> Vec<NodeInfo> {
        let mut nodes: Vec<NodeInfo> = self.nodes.iter().map(|e| e.value().clone()).collect();
        nodes.sort_by(|a, b| a.legal_identity.name.cmp(&b.legal_identity.name));
        nodes
    }

    pub fn notary_identities(&self) -> Vec<Party> {
        self.all_nodes()
            .into_iter()
            .filter(|n| n.is_notary)
            .map(|n| n.legal_identity)
            .collect()
    }

    pub fn get_notary(&self, name: &PartyName) -> Option<Party> {
        self.notary_identities().into_iter().find(|p| p.name == *name)
    }

    pub fn node_by_name(&self, name: &PartyName) -> Option<NodeInfo> {
        self.nodes
            .iter()
            .find(|e| e.value().legal_identity.name == *name)
            .map(|e| e.value().clone())
    }

    /// Counterparties of `me`: every non-notary node except `me`.
    pub fn peers(&self, me: &Party) -> Vec<Party> {
        self.all_nodes()
            .into_iter()
            .filter(|n| !n.is_notary && n.legal_identity != *me)
            .map(|n| n.legal_identity)
            .collect()
    }
}

impl Default for NetworkMapCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(org: &str, byte: u8) -> Party {
        Party::new(PartyName::new(org, "London", "GB"), OwningKey([byte; 32]))
    }

    #[test]
    fn test_peers_exclude_self_and_notaries() {
        let map = NetworkMapCache::new();
        let alice = party("Alice", 1);
        let bob = party("Bob", 2);
        let notary = party("Notary", 9);
        map.add_node(alice.clone());
        map.add_node(bob.clone());
        map.add_notary(notary.clone());

        assert_eq!(map.peers(&alice), vec![bob]);
        assert_eq!(map.notary_identities(), vec![notary.clone()]);
        assert_eq!(map.get_notary(&notary.name), Some(notary));
        assert!(map.get_notary(&alice.name).is_none());
        assert_eq!(map.all_nodes().len(), 3);
    }
}
