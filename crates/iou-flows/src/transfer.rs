use std::collections::BTreeSet;

use iou_core::{IouCommand, LinearId, OwningKey, Party, SignedTransaction, TransactionBuilder};

use crate::collect::collect_signatures;
use crate::error::FlowError;
use crate::finality::finalise;
use crate::session::{FlowContext, FlowKind, FlowSession};

/// Move a debt note to a new payee. Only the current payee may start it.
pub struct TransferFlow {
    pub lifecycle_id: LinearId,
    pub new_payee: Party,
}

impl TransferFlow {
    pub fn new(lifecycle_id: LinearId, new_payee: Party) -> Self {
        Self {
            lifecycle_id,
            new_payee,
        }
    }

    pub async fn call(self, ctx: &FlowContext) -> Result<SignedTransaction, FlowError> {
        let me = ctx.our_identity().clone();
        let input = ctx.hub.vault.note_by_id(&self.lifecycle_id)?;
        let current = &input.state;
        if current.payee != me {
            return Err(FlowError::Unauthorized(
                "An IOU transfer can only be initiated by the IOU's current payee.".to_string(),
            ));
        }
        tracing::info!(
            note = %self.lifecycle_id,
            new_payee = %self.new_payee.name,
            "transferring IOU"
        );

        let output = current.with_new_payee(self.new_payee.clone());
        let mut signers: Vec<OwningKey> = current.participants().iter().map(|p| p.owning_key).collect();
        signers.push(self.new_payee.owning_key);

        let mut builder = TransactionBuilder::new(input.notary.clone());
        builder.add_input_state(input.clone().into_any());
        builder.add_output_state(output);
        builder.add_command(IouCommand::Transfer, signers);
        builder.verify()?;

        let ptx = ctx.hub.sign_initial_transaction(&builder, &[me.owning_key])?;

        let mut counterparties: BTreeSet<Party> = current.participants().into_iter().collect();
        counterparties.insert(self.new_payee.clone());
        counterparties.remove(&me);
        let sessions = counterparties
            .iter()
            .map(|p| ctx.initiate_flow(p, FlowKind::Transfer))
            .collect::<Result<Vec<Box<dyn FlowSession>>, _>>()?;

        let stx = collect_signatures(ctx, ptx, &sessions).await?;
        finalise(ctx, stx, &sessions).await
    }
}
