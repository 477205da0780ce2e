//! The IOU node orchestrator.
//!
//! Hosts the configured parties and notary on an in-process network, serves
//! the HTTP API and runs the flows the API asks for.

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use iou_core::{Amount, DebtNote, LinearId};
use iou_flows::{
    FlowContext, FlowError, IssueFlow, LocalNetwork, SelfIssueCashFlow, SettleFlow, TransferFlow,
};

use crate::commands::{CommandResponse, NodeCommand, Reply};
use crate::config::IouConfig;
use crate::state::NodeState;

pub struct IouNode {
    config: IouConfig,
    network: Arc<LocalNetwork>,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
}

impl IouNode {
    /// Create the node and bring up its notary and parties.
    pub fn new(config: IouConfig) -> Result<Self> {
        let network = LocalNetwork::new();
        let notary = network.add_notary(config.notary_name()?);
        tracing::info!(notary = %notary.name, key = %notary.owning_key.short(), "notary started");

        for name in config.node_names()? {
            let hub = network.add_node(name);
            let me = hub.our_identity();
            tracing::info!(party = %me.name, key = %me.owning_key.short(), "party hosted");
        }

        Ok(Self {
            config,
            network,
            node_state: None,
            command_rx: None,
        })
    }

    /// Start the HTTP API. Returns the address it listens on.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        tracing::info!("starting IOU node");

        // HTTP API -> main event loop
        let (command_tx, command_rx) = mpsc::channel::<NodeCommand>(256);
        let node_state = Arc::new(NodeState::new(self.network.clone(), command_tx));

        let listener = tokio::net::TcpListener::bind(self.config.api_addr()).await?;
        let api_addr = listener.local_addr()?;

        let api_state = node_state.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::api::serve(listener, api_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });

        self.node_state = Some(node_state);
        self.command_rx = Some(command_rx);
        Ok(api_addr)
    }

    /// Run the node's main event loop. Commands run one at a time, in the
    /// order the API received them.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        tracing::info!("entering main event loop");
        while let Some(cmd) = command_rx.recv().await {
            Self::handle_api_command(&self.network, cmd).await;
        }
        tracing::info!("API command channel closed");
        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down IOU node");
        self.command_rx = None;
        self.node_state = None;
        Ok(())
    }

    async fn handle_api_command(network: &Arc<LocalNetwork>, cmd: NodeCommand) {
        let name = cmd.name();
        tracing::debug!(command = name, "handling API command");
        match cmd {
            NodeCommand::Issue {
                hub,
                amount,
                counterparty,
                reply,
            } => {
                let ctx = network.context(hub);
                Self::respond(name, reply, issue(&ctx, amount, &counterparty).await);
            }
            NodeCommand::Transfer {
                hub,
                id,
                new_payee,
                reply,
            } => {
                let ctx = network.context(hub);
                Self::respond(name, reply, transfer(&ctx, id, &new_payee).await);
            }
            NodeCommand::Settle {
                hub,
                id,
                amount,
                reply,
            } => {
                let ctx = network.context(hub);
                Self::respond(name, reply, settle(&ctx, id, amount).await);
            }
            NodeCommand::SelfIssueCash { hub, amount, reply } => {
                let ctx = network.context(hub);
                Self::respond(name, reply, self_issue_cash(&ctx, amount).await);
            }
        }
    }

    fn respond(name: &str, reply: Reply, result: Result<CommandResponse, FlowError>) {
        let result = result.map_err(|e| {
            tracing::warn!(command = name, error = %e, "command failed");
            e.to_string()
        });
        if reply.send(result).is_err() {
            tracing::warn!(command = name, "API caller went away before the reply");
        }
    }
}

async fn issue(ctx: &FlowContext, amount: Amount, counterparty: &str) -> Result<CommandResponse, FlowError> {
    let lender = ctx.hub.resolve_party(counterparty)?;
    let note = DebtNote::new(amount, lender, ctx.our_identity().clone());
    let linear_id = note.lifecycle_id.to_string();
    let stx = IssueFlow::new(note).call(ctx).await?;
    let issued = stx
        .tx
        .outputs
        .iter()
        .find_map(|o| o.as_note())
        .map(|n| n.to_string())
        .unwrap_or_default();
    Ok(CommandResponse {
        message: format!("Transaction id {} committed to ledger.\n{}", stx.id(), issued),
        tx_id: Some(stx.id().to_string()),
        linear_id: Some(linear_id),
    })
}

async fn transfer(ctx: &FlowContext, id: LinearId, new_payee: &str) -> Result<CommandResponse, FlowError> {
    let new_payee = ctx.hub.resolve_party(new_payee)?;
    let stx = TransferFlow::new(id.clone(), new_payee.clone()).call(ctx).await?;
    Ok(CommandResponse {
        message: format!("IOU {} transferred to {}.", id, new_payee.name),
        tx_id: Some(stx.id().to_string()),
        linear_id: Some(id.to_string()),
    })
}

async fn settle(ctx: &FlowContext, id: LinearId, amount: Amount) -> Result<CommandResponse, FlowError> {
    let stx = SettleFlow::new(id.clone(), amount.clone()).call(ctx).await?;
    Ok(CommandResponse {
        message: format!("{} paid off on IOU id {}.", amount, id),
        tx_id: Some(stx.id().to_string()),
        linear_id: Some(id.to_string()),
    })
}

async fn self_issue_cash(ctx: &FlowContext, amount: Amount) -> Result<CommandResponse, FlowError> {
    let holding = SelfIssueCashFlow::new(amount).call(ctx).await?;
    Ok(CommandResponse {
        message: format!(
            "Issued {} to {} (key {}).",
            holding.amount,
            ctx.our_identity().name,
            holding.owner.short()
        ),
        tx_id: None,
        linear_id: None,
    })
}
