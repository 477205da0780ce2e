//! Verification rules for debt notes.
//!
//! Every clause maps to one rejection message. Messages are surfaced to the
//! user verbatim, so they are part of the interface.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::cash::CashHolding;
use crate::error::ContractViolation;
use crate::note::DebtNote;
use crate::transaction::{IouCommand, LedgerTransaction};
use crate::types::OwningKey;

fn require(condition: bool, message: &str) -> Result<(), ContractViolation> {
    if condition {
        Ok(())
    } else {
        Err(ContractViolation::new(message))
    }
}

/// The IOU contract: issuance, transfer and settlement of [`DebtNote`]s.
pub struct IouContract;

impl IouContract {
    pub fn verify(tx: &LedgerTransaction) -> Result<(), ContractViolation> {
        let commands = tx.iou_commands();
        require(
            commands.len() == 1,
            "A transaction must carry exactly one IOU command.",
        )?;
        let (command, signed) = commands[0];
        let signers = signed.signer_set();

        tracing::debug!(tx_id = %tx.id, command = %command, "verifying IOU contract");

        match command {
            IouCommand::Issue => Self::verify_issue(tx, &signers),
            IouCommand::Transfer => Self::verify_transfer(tx, &signers),
            IouCommand::Settle => Self::verify_settle(tx, &signers),
        }
    }

    fn verify_issue(tx: &LedgerTransaction, signers: &BTreeSet<OwningKey>) -> Result<(), ContractViolation> {
        require(
            tx.inputs.is_empty(),
            "No inputs should be consumed when issuing an IOU.",
        )?;
        require(
            tx.outputs.len() == 1,
            "Only one output state should be created when issuing an IOU.",
        )?;
        let output = tx.outputs[0]
            .as_note()
            .ok_or_else(|| ContractViolation::new("The output of an IOU issuance must be an IOU."))?;
        require(
            output.principal.value > 0,
            "A newly issued IOU must have a positive amount.",
        )?;
        require(
            output.payee != output.payer,
            "The payee and payer cannot have the same identity.",
        )?;
        require(
            *signers == output.participant_keys(),
            "Both payee and payer together only may sign IOU issue transaction.",
        )
    }

    fn verify_transfer(tx: &LedgerTransaction, signers: &BTreeSet<OwningKey>) -> Result<(), ContractViolation> {
        require(
            tx.inputs.len() == 1,
            "An IOU transfer transaction should only consume one input state.",
        )?;
        require(
            tx.outputs.len() == 1,
            "An IOU transfer transaction should only create one output state.",
        )?;
        let input = tx.inputs[0]
            .state
            .as_note()
            .ok_or_else(|| ContractViolation::new("The input of an IOU transfer must be an IOU."))?;
        let output = tx.outputs[0]
            .as_note()
            .ok_or_else(|| ContractViolation::new("The output of an IOU transfer must be an IOU."))?;
        require(
            output.with_new_payee(input.payee.clone()) == *input,
            "Only the payee property may change.",
        )?;
        require(
            input.payee != output.payee,
            "The payee property must change in a transfer.",
        )?;
        let expected: BTreeSet<OwningKey> = input
            .participant_keys()
            .union(&output.participant_keys())
            .copied()
            .collect();
        require(
            *signers == expected,
            "The payer, old payee and new payee only must sign an IOU transfer transaction.",
        )
    }

    fn verify_settle(tx: &LedgerTransaction, signers: &BTreeSet<OwningKey>) -> Result<(), ContractViolation> {
        let groups = tx.group_notes();
        require(
            groups.len() <= 1,
            "Only one IOU lineage may be settled per transaction.",
        )?;
        let (inputs, outputs): (Vec<&DebtNote>, Vec<&DebtNote>) = match groups.first() {
            Some(group) => (group.inputs.clone(), group.outputs.clone()),
            None => (Vec::new(), Vec::new()),
        };
        require(inputs.len() == 1, "There must be one input IOU.")?;
        let input = inputs[0];

        let cash = tx.output_cash();
        require(!cash.is_empty(), "There must be output cash.")?;

        let paid_to_payee: Vec<&CashHolding> = cash
            .into_iter()
            .filter(|c| c.owner == input.payee.owning_key)
            .collect();
        require(
            !paid_to_payee.is_empty(),
            "There must be output cash paid to the recipient.",
        )?;
        let payment = CashHolding::sum_without_issuer(paid_to_payee)?
            .ok_or_else(|| ContractViolation::new("There must be output cash paid to the recipient."))?;

        let remaining = input.remaining()?;
        let ordering = remaining.try_cmp(&payment)?;
        require(
            ordering != Ordering::Less,
            "The amount settled cannot be more than the amount outstanding.",
        )?;

        if ordering == Ordering::Equal {
            require(
                outputs.is_empty(),
                "There must be no output IOU as it has been fully settled.",
            )?;
        } else {
            require(outputs.len() == 1, "There must be one output IOU.")?;
            let output = outputs[0];
            require(
                input.payer == output.payer,
                "The payer may not change when settling.",
            )?;
            require(
                input.principal == output.principal,
                "The principal may not change when settling.",
            )?;
            require(
                input.payee == output.payee,
                "The payee may not change when settling.",
            )?;
            let expected_paid = input.amount_paid.checked_add(&payment)?;
            require(
                output.amount_paid == expected_paid,
                "The amount paid must increase by exactly the settled amount.",
            )?;
        }

        require(
            *signers == input.participant_keys(),
            "Both payee and payer together only must sign IOU settle transaction.",
        )
    }
}
