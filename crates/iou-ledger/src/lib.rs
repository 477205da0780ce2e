//! IOU Ledger Services
//!
//! The services a node's flows call into: who is who, which keys we hold,
//! which states we own, and the notary that orders consumption of states.
//! Everything here is in memory; the notary sits behind the
//! [`NotaryService`] trait so another ordering service can replace it.

pub mod error;
pub mod traits;
pub mod identity;
pub mod keys;
pub mod network_map;
pub mod vault;
pub mod notary;
pub mod cash;

pub use error::LedgerError;
pub use traits::NotaryService;
pub use identity::IdentityService;
pub use keys::KeyManagementService;
pub use network_map::{NetworkMapCache, NodeInfo};
pub use vault::NodeVault;
pub use notary::InMemoryNotary;
pub use cash::generate_spend;
