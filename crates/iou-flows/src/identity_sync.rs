use std::collections::BTreeSet;

use iou_core::{LedgerState, OwningKey, WireTransaction};

use crate::error::FlowError;
use crate::session::{FlowContext, FlowSession, IdentityMapping};

/// Every key mentioned by `tx`: command signers, cash owners and note
/// participants.
fn keys_in(tx: &WireTransaction) -> BTreeSet<OwningKey> {
    let mut keys: BTreeSet<OwningKey> = tx
        .commands
        .iter()
        .flat_map(|c| c.signers.iter().copied())
        .collect();
    for output in &tx.outputs {
        match output {
            LedgerState::Cash(cash) => {
                keys.insert(cash.owner);
            }
            LedgerState::Iou(note) => keys.extend(note.participant_keys()),
        }
    }
    keys
}

/// Tell the counterparty which anonymous keys in `tx` are ours, so it can
/// resolve our signatures.
pub async fn send_identities(
    ctx: &FlowContext,
    session: &dyn FlowSession,
    tx: &WireTransaction,
) -> Result<usize, FlowError> {
    let me = ctx.our_identity();
    let mappings: Vec<IdentityMapping> = ctx
        .hub
        .keys
        .filter_my_keys(&keys_in(tx))
        .into_iter()
        .filter(|k| *k != me.owning_key)
        .map(|key| IdentityMapping {
            key,
            party: me.clone(),
        })
        .collect();
    let count = mappings.len();
    session.send_identities(mappings).await?;
    tracing::debug!(counterparty = %session.counterparty().name, count, "identities synced");
    Ok(count)
}
