use std::collections::{BTreeMap, BTreeSet};

use iou_core::{Amount, CashCommand, CashHolding, OwningKey, PartyAndReference, TransactionBuilder};

use crate::error::LedgerError;
use crate::keys::KeyManagementService;
use crate::vault::NodeVault;

/// Add a cash payment of `amount` to `recipient` to `builder`.
///
/// Selects unconsumed holdings in the payment currency (oldest reference
/// first) until they cover the amount, consumes them, pays the recipient
/// and returns any change to a fresh anonymous key. Outputs are split per
/// issuer so the cash contract balances. Returns the keys that must sign
/// for the consumed holdings.
pub fn generate_spend(
    vault: &NodeVault,
    keys: &KeyManagementService,
    builder: &mut TransactionBuilder,
    amount: &Amount,
    recipient: OwningKey,
) -> Result<Vec<OwningKey>, LedgerError> {
    let candidates: Vec<_> = vault
        .unconsumed_cash()
        .into_iter()
        .filter(|c| c.state.amount.currency == amount.currency)
        .collect();

    let mut selected = Vec::new();
    let mut gathered: u128 = 0;
    for holding in candidates {
        if gathered >= amount.value {
            break;
        }
        gathered = gathered.saturating_add(holding.state.amount.value);
        selected.push(holding);
    }
    if gathered < amount.value {
        return Err(LedgerError::InsufficientCash {
            available: Amount::new(gathered, amount.currency),
            required: amount.clone(),
        });
    }

    // Per issuer: (paid to recipient, change).
    let mut split: BTreeMap<PartyAndReference, (u128, u128)> = BTreeMap::new();
    let mut to_pay = amount.value;
    let mut signers = BTreeSet::new();
    for holding in &selected {
        let value = holding.state.amount.value;
        let pay = value.min(to_pay);
        to_pay -= pay;
        let entry = split.entry(holding.state.issuer.clone()).or_insert((0, 0));
        entry.0 += pay;
        entry.1 += value - pay;
        signers.insert(holding.state.owner);
    }

    let needs_change = split.values().any(|(_, change)| *change > 0);
    let change_key = if needs_change { Some(keys.fresh_key()) } else { None };

    for holding in selected {
        builder.add_input_state(holding.into_any());
    }
    for (issuer, (pay, change)) in split {
        if pay > 0 {
            builder.add_output_state(CashHolding::new(
                Amount::new(pay, amount.currency),
                issuer.clone(),
                recipient,
            ));
        }
        if let (Some(owner), true) = (change_key, change > 0) {
            builder.add_output_state(CashHolding::new(
                Amount::new(change, amount.currency),
                issuer,
                owner,
            ));
        }
    }

    let signers: Vec<OwningKey> = signers.into_iter().collect();
    builder.add_command(CashCommand::Move, signers.clone());
    tracing::debug!(
        amount = %amount,
        inputs = builder.inputs().len(),
        change = needs_change,
        "generated cash spend"
    );
    Ok(signers)
}
