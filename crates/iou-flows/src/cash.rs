use iou_core::{Amount, CashCommand, CashHolding, PartyAndReference, TransactionBuilder};

use crate::error::FlowError;
use crate::finality::finalise;
use crate::session::FlowContext;

/// Issue test currency to ourselves. The holding is owned by a fresh
/// anonymous key and issued by our legal identity.
pub struct SelfIssueCashFlow {
    pub amount: Amount,
}

impl SelfIssueCashFlow {
    pub fn new(amount: Amount) -> Self {
        Self { amount }
    }

    pub async fn call(self, ctx: &FlowContext) -> Result<CashHolding, FlowError> {
        let me = ctx.our_identity().clone();
        let notary = ctx.hub.notary()?;
        let owner = ctx.hub.keys.fresh_key();
        let holding = CashHolding::new(
            self.amount,
            PartyAndReference::new(me.clone(), vec![0]),
            owner,
        );

        let mut builder = TransactionBuilder::new(notary);
        builder.add_output_state(holding.clone());
        builder.add_command(CashCommand::Issue, vec![me.owning_key]);
        builder.verify()?;

        let stx = ctx.hub.sign_initial_transaction(&builder, &[me.owning_key])?;
        finalise(ctx, stx, &[]).await?;
        tracing::info!(amount = %holding.amount, owner = %owner.short(), "self-issued cash");
        Ok(holding)
    }
}
