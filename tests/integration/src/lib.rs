//! Fixtures shared by the scenario tests: a notary and three parties on an
//! in-process network.

use std::sync::Arc;

use iou_core::{Amount, Currency, DebtNote, LinearId, PartyName, SignedTransaction};
use iou_flows::{FlowContext, FlowError, IssueFlow, LocalNetwork, SelfIssueCashFlow, SettleFlow, TransferFlow};

pub struct Scenario {
    pub network: Arc<LocalNetwork>,
    pub a: FlowContext,
    pub b: FlowContext,
    pub c: FlowContext,
}

impl Scenario {
    pub fn new() -> Self {
        let network = LocalNetwork::new();
        network.add_notary(PartyName::new("Notary", "London", "GB"));
        let a = network.add_node(PartyName::new("PartyA", "London", "GB"));
        let b = network.add_node(PartyName::new("PartyB", "New York", "US"));
        let c = network.add_node(PartyName::new("PartyC", "Paris", "FR"));
        Self {
            a: network.context(a),
            b: network.context(b),
            c: network.context(c),
            network,
        }
    }
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

/// `pounds` whole pounds sterling.
pub fn gbp(pounds: u64) -> Amount {
    Amount::from_major(pounds, Currency::GBP).unwrap_or_else(|_| Amount::zero(Currency::GBP))
}

/// Issue a note for `amount` owed by `payer` to `payee`.
pub async fn issue(payer: &FlowContext, payee: &FlowContext, amount: Amount) -> Result<DebtNote, FlowError> {
    let note = DebtNote::new(amount, payee.our_identity().clone(), payer.our_identity().clone());
    IssueFlow::new(note.clone()).call(payer).await?;
    Ok(note)
}

pub async fn self_issue(ctx: &FlowContext, amount: Amount) -> Result<(), FlowError> {
    SelfIssueCashFlow::new(amount).call(ctx).await.map(|_| ())
}

pub async fn transfer(ctx: &FlowContext, id: &LinearId, to: &FlowContext) -> Result<SignedTransaction, FlowError> {
    TransferFlow::new(id.clone(), to.our_identity().clone()).call(ctx).await
}

pub async fn settle(ctx: &FlowContext, id: &LinearId, amount: Amount) -> Result<SignedTransaction, FlowError> {
    SettleFlow::new(id.clone(), amount).call(ctx).await
}

/// The current version of note `id` as `ctx` sees it, if any.
pub fn current(ctx: &FlowContext, id: &LinearId) -> Option<DebtNote> {
    ctx.hub.vault.note_by_id(id).ok().map(|s| s.state)
}
