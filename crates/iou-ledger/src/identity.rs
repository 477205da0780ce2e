use dashmap::DashMap;
use iou_core::{OwningKey, Party, PartyName};

use crate::error::LedgerError;

/// Resolves keys to well-known parties.
///
/// Holds the well-known identities of the network and the anonymous-key
/// mappings learned through identity sync. A key the service cannot
/// resolve belongs to nobody this node knows about.
pub struct IdentityService {
    by_key: DashMap<OwningKey, Party>,
    by_name: DashMap<PartyName, Party>,
    /// Anonymous key -> well-known owner.
    anonymous: DashMap<OwningKey, Party>,
}

impl IdentityService {
    pub fn new() -> Self {
        Self {
            by_key: DashMap::new(),
            by_name: DashMap::new(),
            anonymous: DashMap::new(),
        }
    }

    /// Register a well-known identity.
    pub fn register(&self, party: Party) {
        tracing::debug!(party = %party.name, key = %party.owning_key.short(), "registering identity");
        self.by_key.insert(party.owning_key, party.clone());
        self.by_name.insert(party.name.clone(), party);
    }

    /// Map an anonymous key to its well-known owner. Registering the same
    /// mapping twice is a no-op; remapping a key to another party fails.
    pub fn register_anonymous(&self, key: OwningKey, owner: Party) -> Result<(), LedgerError> {
        if let Some(existing) = self.by_key.get(&key) {
            if *existing != owner {
                return Err(LedgerError::ConflictingIdentity {
                    key,
                    existing: existing.name.to_string(),
                });
            }
            return Ok(());
        }
        if let Some(existing) = self.anonymous.get(&key) {
            if *existing != owner {
                return Err(LedgerError::ConflictingIdentity {
                    key,
                    existing: existing.name.to_string(),
                });
            }
            return Ok(());
        }
        tracing::debug!(key = %key.short(), owner = %owner.name, "registering anonymous key");
        self.anonymous.insert(key, owner);
        Ok(())
    }

    pub fn well_known_party_from_name(&self, name: &PartyName) -> Option<Party> {
        self.by_name.get(name).map(|p| p.value().clone())
    }

    /// Look up by organisation alone, the way operators name nodes.
    pub fn party_from_organisation(&self, organisation: &str) -> Option<Party> {
        self.by_name
            .iter()
            .find(|entry| entry.key().organisation.eq_ignore_ascii_case(organisation))
            .map(|entry| entry.value().clone())
    }

    /// Resolve a well-known key or a synced anonymous key to its party.
    pub fn party_from_key(&self, key: &OwningKey) -> Option<Party> {
        self.by_key
            .get(key)
            .or_else(|| self.anonymous.get(key))
            .map(|p| p.value().clone())
    }

    /// Resolve a party name string in either `O=..,L=..,C=..` form or a
    /// bare organisation.
    pub fn resolve(&self, name: &str) -> Result<Party, LedgerError> {
        let found = match PartyName::parse(name) {
            Ok(parsed) => self.well_known_party_from_name(&parsed),
            Err(_) => self.party_from_organisation(name),
        };
        found.ok_or_else(|| LedgerError::UnknownParty(name.to_string()))
    }

    pub fn is_known(&self, key: &OwningKey) -> bool {
        self.by_key.contains_key(key) || self.anonymous.contains_key(key)
    }

    pub fn well_known_parties(&self) -> Vec<Party> {
        let mut parties: Vec<Party> = self.by_key.iter().map(|e| e.value().clone()).collect();
        parties.sort_by(|a, b| a.name.cmp(&b.name));
        parties
    }
}

impl Default for IdentityService {
    fn default() -> Self {
        Self::new()
    }
}
