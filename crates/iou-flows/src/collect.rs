use std::collections::BTreeSet;

use iou_core::SignedTransaction;
use iou_crypto::{verify_signatures, verify_transaction_signature};

use crate::error::FlowError;
use crate::session::{FlowContext, FlowSession, SignatureRequest};

/// Gather countersignatures from every session.
///
/// The returned transaction carries a valid signature from every command
/// signer. Only the notary's signature may still be missing.
pub async fn collect_signatures(
    ctx: &FlowContext,
    partially_signed: SignedTransaction,
    sessions: &[Box<dyn FlowSession>],
) -> Result<SignedTransaction, FlowError> {
    let id = partially_signed.id();
    for sig in &partially_signed.sigs {
        verify_transaction_signature(&id, sig)?;
    }

    let dependencies = ctx.hub.dependencies(&partially_signed.tx)?;
    let required = partially_signed.tx.required_signing_keys();
    let mut stx = partially_signed;

    for session in sessions {
        tracing::info!(tx_id = %id, counterparty = %session.counterparty().name, "requesting signatures");
        let sigs = session
            .request_signatures(SignatureRequest {
                stx: stx.clone(),
                dependencies: dependencies.clone(),
            })
            .await?;
        for sig in &sigs {
            verify_transaction_signature(&id, sig)?;
            if !required.contains(&sig.by) {
                return Err(FlowError::Protocol(format!(
                    "{} returned a signature by {}, which is not a required signer",
                    session.counterparty().name,
                    sig.by.short()
                )));
            }
        }
        stx = stx.with_additional_signatures(sigs);
    }

    let notary: BTreeSet<_> = [stx.tx.notary.owning_key].into_iter().collect();
    verify_signatures(&stx, &notary)?;
    Ok(stx)
}
