use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::CoreError;
use crate::types::{Amount, LinearId, OwningKey, Party};

/// An IOU: `payer` owes `principal` to `payee`, of which `amount_paid` has
/// already been settled.
///
/// Every version of one note shares the same `lifecycle_id`. Versions are
/// immutable; [`DebtNote::pay`] and [`DebtNote::with_new_payee`] return the
/// successor version. The constructors do not enforce the ledger rules
/// (positive principal, distinct parties); [`crate::IouContract`] does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtNote {
    /// Amount owed.
    pub principal: Amount,
    /// Lender; receives settlements.
    pub payee: Party,
    /// Borrower; makes settlements.
    pub payer: Party,
    /// Amount settled so far, same currency as the principal.
    pub amount_paid: Amount,
    /// Lineage identifier.
    pub lifecycle_id: LinearId,
}

impl DebtNote {
    /// A fresh note with nothing paid and a new lifecycle id.
    pub fn new(principal: Amount, payee: Party, payer: Party) -> Self {
        let amount_paid = Amount::zero(principal.currency);
        Self {
            principal,
            payee,
            payer,
            amount_paid,
            lifecycle_id: LinearId::new(),
        }
    }

    /// The parties that must see and sign for this note.
    pub fn participants(&self) -> Vec<Party> {
        vec![self.payee.clone(), self.payer.clone()]
    }

    pub fn participant_keys(&self) -> BTreeSet<OwningKey> {
        [self.payee.owning_key, self.payer.owning_key].into_iter().collect()
    }

    /// `principal - amount_paid`.
    pub fn remaining(&self) -> Result<Amount, CoreError> {
        self.principal.checked_sub(&self.amount_paid)
    }

    pub fn is_fully_paid(&self) -> bool {
        self.amount_paid.value >= self.principal.value
    }

    /// Successor version with `payment` applied to `amount_paid`.
    pub fn pay(&self, payment: &Amount) -> Result<DebtNote, CoreError> {
        let remaining = self.remaining()?;
        payment.ensure_same_currency(&remaining)?;
        if payment.value > remaining.value {
            return Err(CoreError::Overpayment {
                payment: payment.clone(),
                remaining,
            });
        }
        Ok(DebtNote {
            amount_paid: self.amount_paid.checked_add(payment)?,
            ..self.clone()
        })
    }

    /// Successor version owed to `payee` instead.
    pub fn with_new_payee(&self, payee: Party) -> DebtNote {
        DebtNote {
            payee,
            ..self.clone()
        }
    }
}

impl fmt::Display for DebtNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IOU {}: {} owes {} {} ({} paid)",
            self.lifecycle_id,
            self.payer.name.organisation,
            self.payee.name.organisation,
            self.principal,
            self.amount_paid
        )
    }
}
