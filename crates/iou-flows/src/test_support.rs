use std::sync::Arc;

use iou_core::{Amount, Currency, DebtNote, PartyName, SignedTransaction};

use crate::network::LocalNetwork;
use crate::session::FlowContext;
use crate::{IssueFlow, SelfIssueCashFlow};

/// Three nodes and a notary on one local network.
pub struct TestNet {
    pub network: Arc<LocalNetwork>,
    pub a: FlowContext,
    pub b: FlowContext,
    pub c: FlowContext,
}

impl TestNet {
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

pub fn gbp(value: u128) -> Amount {
    Amount::new(value, Currency::GBP)
}

/// Issue a note for `value` pence owed by `payer` to `payee`, started by
/// the payer.
pub async fn issue_note(payer: &FlowContext, payee: &FlowContext, value: u128) -> (DebtNote, SignedTransaction) {
    let note = DebtNote::new(gbp(value), payee.our_identity().clone(), payer.our_identity().clone());
    let stx = IssueFlow::new(note.clone()).call(payer).await.unwrap();
    (note, stx)
}

pub async fn fund(ctx: &FlowContext, value: u128) {
    SelfIssueCashFlow::new(gbp(value)).call(ctx).await.unwrap();
}
