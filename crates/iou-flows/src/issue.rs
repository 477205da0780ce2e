use std::collections::BTreeSet;

use iou_core::{DebtNote, IouCommand, Party, SignedTransaction, TransactionBuilder};

use crate::collect::collect_signatures;
use crate::error::FlowError;
use crate::finality::finalise;
use crate::session::{FlowContext, FlowKind, FlowSession};

/// Put a new debt note on the ledger, countersigned by the other
/// participant.
pub struct IssueFlow {
    pub note: DebtNote,
}

impl IssueFlow {
    pub fn new(note: DebtNote) -> Self {
        Self { note }
    }

    pub async fn call(self, ctx: &FlowContext) -> Result<SignedTransaction, FlowError> {
        let me = ctx.our_identity().clone();
        let participants = self.note.participants();
        if !participants.contains(&me) {
            return Err(FlowError::Unauthorized(
                "An IOU can only be issued by one of its participants.".to_string(),
            ));
        }
        tracing::info!(note = %self.note, "issuing IOU");

        let notary = ctx.hub.notary()?;
        let signers = participants.iter().map(|p| p.owning_key).collect();
        let mut builder = TransactionBuilder::new(notary);
        builder.add_output_state(self.note.clone());
        builder.add_command(IouCommand::Issue, signers);
        builder.verify()?;

        let ptx = ctx.hub.sign_initial_transaction(&builder, &[me.owning_key])?;

        let counterparties: BTreeSet<Party> = participants.into_iter().filter(|p| *p != me).collect();
        let sessions = counterparties
            .iter()
            .map(|p| ctx.initiate_flow(p, FlowKind::Issue))
            .collect::<Result<Vec<Box<dyn FlowSession>>, _>>()?;

        let stx = collect_signatures(ctx, ptx, &sessions).await?;
        finalise(ctx, stx, &sessions).await
    }
}
