//! Counterparty side of every flow.

use std::collections::BTreeSet;

use iou_core::{LedgerTransaction, Party, SignedTransaction, TransactionSignature};
use iou_crypto::{verify_signatures, verify_transaction_signature};

use crate::error::FlowError;
use crate::hub::ServiceHub;
use crate::session::{FlowKind, IdentityMapping, SignatureRequest};

/// Node-specific acceptance check run before countersigning. The contract
/// has already passed when this runs.
pub trait ProposalApprover: Send + Sync {
    fn check(&self, kind: FlowKind, stx: &SignedTransaction, ltx: &LedgerTransaction) -> Result<(), String>;
}

/// Issue and transfer proposals must produce exactly one debt note; any
/// contract-valid settlement is accepted.
pub struct DefaultApprover;

impl ProposalApprover for DefaultApprover {
    fn check(&self, kind: FlowKind, _stx: &SignedTransaction, ltx: &LedgerTransaction) -> Result<(), String> {
        match kind {
            FlowKind::Issue | FlowKind::Transfer => {
                let single_note = ltx.outputs.len() == 1 && ltx.outputs[0].as_note().is_some();
                if single_note {
                    Ok(())
                } else {
                    Err("This must be an IOU transaction.".to_string())
                }
            }
            FlowKind::Settle => Ok(()),
        }
    }
}

/// Check and store the transactions a proposal's inputs come from.
fn accept_dependencies(hub: &ServiceHub, dependencies: &[SignedTransaction]) -> Result<(), FlowError> {
    for dep in dependencies {
        verify_signatures(dep, &BTreeSet::new())?;
        hub.vault.store_dependency(dep);
    }
    Ok(())
}

/// Register the anonymous keys the initiator says it owns. An initiator
/// may only speak for itself.
pub fn receive_identities(
    hub: &ServiceHub,
    initiator: &Party,
    mappings: Vec<IdentityMapping>,
) -> Result<(), FlowError> {
    for mapping in mappings {
        if mapping.party != *initiator {
            return Err(FlowError::Protocol(format!(
                "{} sent an identity mapping for {}",
                initiator.name, mapping.party.name
            )));
        }
        hub.identity.register_anonymous(mapping.key, mapping.party)?;
    }
    Ok(())
}

/// Verify a proposal and countersign it with our legal identity key.
pub fn sign_proposal(
    hub: &ServiceHub,
    initiator: &Party,
    kind: FlowKind,
    request: SignatureRequest,
) -> Result<Vec<TransactionSignature>, FlowError> {
    let me = hub.our_identity();
    let stx = request.stx;
    let id = stx.id();
    tracing::info!(tx_id = %id, node = %me.name, initiator = %initiator.name, flow = %kind, "received proposal");

    accept_dependencies(hub, &request.dependencies)?;
    let ltx = stx.tx.resolve(|r| hub.vault.resolve_state(r))?;
    ltx.verify()?;

    for sig in &stx.sigs {
        verify_transaction_signature(&id, sig)?;
        if !hub.identity.is_known(&sig.by) && !hub.keys.owns(&sig.by) {
            return Err(FlowError::UnknownSigner(sig.by));
        }
    }

    hub.approver
        .check(kind, &stx, &ltx)
        .map_err(|reason| FlowError::CounterpartyRefused {
            party: me.name.clone(),
            reason,
        })?;

    // Anonymous keys are signed for only by the flow that selected them.
    let required = stx.tx.required_signing_keys();
    let legal_key = hub.keys.legal_key();
    let anonymous = hub
        .keys
        .filter_my_keys(&required)
        .into_iter()
        .filter(|k| *k != legal_key)
        .count();
    if anonymous > 0 {
        return Err(FlowError::CounterpartyRefused {
            party: me.name.clone(),
            reason: format!("{} asked us to sign for {} of our anonymous keys", initiator.name, anonymous),
        });
    }
    if !required.contains(&legal_key) {
        return Err(FlowError::Protocol(format!(
            "{} is not a required signer of {}",
            me.name, id
        )));
    }
    let sigs = vec![hub.keys.sign(&id, &legal_key)?];
    tracing::info!(tx_id = %id, node = %me.name, "countersigned proposal");
    Ok(sigs)
}

/// Record a notarised transaction sent by the initiator.
pub fn receive_finalised(
    hub: &ServiceHub,
    stx: SignedTransaction,
    dependencies: Vec<SignedTransaction>,
) -> Result<(), FlowError> {
    accept_dependencies(hub, &dependencies)?;
    verify_signatures(&stx, &BTreeSet::new())?;
    let ltx = stx.tx.resolve(|r| hub.vault.resolve_state(r))?;
    ltx.verify()?;
    hub.vault.record_transaction(&stx);
    Ok(())
}
