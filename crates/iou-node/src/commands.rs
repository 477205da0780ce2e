//! Commands dispatched from the HTTP API to the node event loop.

use std::sync::Arc;

use iou_core::{Amount, LinearId};
use iou_flows::ServiceHub;
use serde::Serialize;
use tokio::sync::oneshot;

pub type Reply = oneshot::Sender<Result<CommandResponse, String>>;

/// A command sent from the HTTP API to the node's main event loop. Each one
/// runs a flow as `hub` and answers once the flow has finalised or failed.
pub enum NodeCommand {
    /// Issue a debt note owed by `hub` to `counterparty`.
    Issue {
        hub: Arc<ServiceHub>,
        amount: Amount,
        counterparty: String,
        reply: Reply,
    },
    /// Move a note held by `hub` to a new payee.
    Transfer {
        hub: Arc<ServiceHub>,
        id: LinearId,
        new_payee: String,
        reply: Reply,
    },
    /// Pay cash against a note owed by `hub`.
    Settle {
        hub: Arc<ServiceHub>,
        id: LinearId,
        amount: Amount,
        reply: Reply,
    },
    /// Give `hub` some test currency.
    SelfIssueCash {
        hub: Arc<ServiceHub>,
        amount: Amount,
        reply: Reply,
    },
}

impl NodeCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Issue { .. } => "issue",
            Self::Transfer { .. } => "transfer",
            Self::Settle { .. } => "settle",
            Self::SelfIssueCash { .. } => "self-issue-cash",
        }
    }
}

/// Response returned once a command's flow has finalised.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_id: Option<String>,
}
