use std::collections::BTreeSet;

use iou_core::SignedTransaction;
use iou_crypto::verify_signatures;

use crate::error::FlowError;
use crate::session::{FlowContext, FlowSession};

/// Notarise if needed, record locally, then send to every session. A
/// session that fails to record does not stop delivery to the others.
pub async fn finalise(
    ctx: &FlowContext,
    stx: SignedTransaction,
    sessions: &[Box<dyn FlowSession>],
) -> Result<SignedTransaction, FlowError> {
    let id = stx.id();
    let notary_key: BTreeSet<_> = [stx.tx.notary.owning_key].into_iter().collect();
    verify_signatures(&stx, &notary_key)?;
    let ltx = stx.tx.resolve(|r| ctx.hub.vault.resolve_state(r))?;
    ltx.verify()?;

    let stx = if stx.tx.needs_notary_signature() {
        let notary = ctx.messaging.notary_service(&stx.tx.notary)?;
        let sig = notary.notarise(&stx).await?;
        stx.with_additional_signatures(vec![sig])
    } else {
        stx
    };

    ctx.hub.vault.record_transaction(&stx);

    let dependencies = ctx.hub.dependencies(&stx.tx)?;
    let mut failures = Vec::new();
    for session in sessions {
        if let Err(e) = session.send_finalised(stx.clone(), dependencies.clone()).await {
            let party = session.counterparty().name.clone();
            tracing::warn!(tx_id = %id, counterparty = %party, error = %e, "counterparty did not record transaction");
            failures.push((party, e.to_string()));
        }
    }
    if !failures.is_empty() {
        return Err(FlowError::Undelivered { tx_id: id, failures });
    }
    tracing::info!(
        tx_id = %id,
        node = %ctx.our_identity().name,
        recipients = sessions.len(),
        "transaction finalised"
    );
    Ok(stx)
}
