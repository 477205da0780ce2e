//! IOU Flows
//!
//! Multi-party procedures over the ledger services: a flow builds and
//! verifies a transaction, signs it, collects counterparty signatures,
//! and finalises it through the notary. Counterparties answer through the
//! responder functions, reached over a [`Messaging`] implementation.

pub mod error;
pub mod hub;
pub mod session;
pub mod responder;
pub mod collect;
pub mod finality;
pub mod identity_sync;
pub mod issue;
pub mod transfer;
pub mod settle;
pub mod cash;
pub mod network;

pub use error::FlowError;
pub use hub::ServiceHub;
pub use session::{FlowContext, FlowKind, FlowSession, IdentityMapping, Messaging, SignatureRequest};
pub use responder::{DefaultApprover, ProposalApprover};
pub use issue::IssueFlow;
pub use transfer::TransferFlow;
pub use settle::SettleFlow;
pub use cash::SelfIssueCashFlow;
pub use network::LocalNetwork;

#[cfg(test)]
mod test_support;
