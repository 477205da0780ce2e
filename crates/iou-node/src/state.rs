//! Shared node state for cross-task communication.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use iou_flows::{LocalNetwork, ServiceHub};
use tokio::sync::mpsc;

use crate::commands::NodeCommand;

/// Shared state for the running node, accessible from HTTP handlers.
pub struct NodeState {
    /// The parties and notary this node hosts.
    pub network: Arc<LocalNetwork>,
    /// When the node started.
    pub start_time: Instant,
    /// Wall-clock start time, for display.
    pub started_at: DateTime<Utc>,
    /// Channel to send commands to the event loop.
    pub command_tx: mpsc::Sender<NodeCommand>,
}

impl NodeState {
    pub fn new(network: Arc<LocalNetwork>, command_tx: mpsc::Sender<NodeCommand>) -> Self {
        Self {
            network,
            start_time: Instant::now(),
            started_at: Utc::now(),
            command_tx,
        }
    }

    /// The hosted party with the given organisation name.
    pub fn hub(&self, organisation: &str) -> Option<Arc<ServiceHub>> {
        self.network.node_by_organisation(organisation)
    }
}
