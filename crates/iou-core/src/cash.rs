use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{ContractViolation, CoreError};
use crate::transaction::{CashCommand, LedgerTransaction};
use crate::types::{Amount, Currency, OwningKey, PartyAndReference};

/// Fungible cash issued by `issuer` and spendable by whoever holds the
/// private half of `owner`. The owner may be an anonymous key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashHolding {
    pub amount: Amount,
    pub issuer: PartyAndReference,
    pub owner: OwningKey,
}

impl CashHolding {
    pub fn new(amount: Amount, issuer: PartyAndReference, owner: OwningKey) -> Self {
        Self {
            amount,
            issuer,
            owner,
        }
    }

    pub fn with_new_owner(&self, owner: OwningKey) -> CashHolding {
        CashHolding {
            owner,
            ..self.clone()
        }
    }

    /// Sum holdings ignoring who issued them. `None` for no holdings.
    pub fn sum_without_issuer<'a>(
        holdings: impl IntoIterator<Item = &'a CashHolding>,
    ) -> Result<Option<Amount>, CoreError> {
        Amount::sum(holdings.into_iter().map(|h| &h.amount))
    }
}

fn require(condition: bool, message: &str) -> Result<(), ContractViolation> {
    if condition {
        Ok(())
    } else {
        Err(ContractViolation::new(message))
    }
}

/// Rules for moving cash holdings between owners.
pub struct CashContract;

impl CashContract {
    pub fn verify(tx: &LedgerTransaction) -> Result<(), ContractViolation> {
        let commands = tx.cash_commands();
        require(
            commands.len() == 1,
            "A transaction with cash states must carry exactly one cash command.",
        )?;
        let (command, signed) = commands[0];
        let signers = signed.signer_set();
        let inputs = tx.input_cash();
        let outputs = tx.output_cash();

        require(
            outputs.iter().all(|o| !o.amount.is_zero()),
            "Cash outputs must have a positive amount.",
        )?;

        match command {
            CashCommand::Issue => {
                require(inputs.is_empty(), "Cash issuance must not consume cash.")?;
                require(!outputs.is_empty(), "Cash issuance must create cash.")?;
                require(
                    outputs.iter().all(|o| signers.contains(&o.issuer.party.owning_key)),
                    "The issuer must sign a cash issuance.",
                )?;
            }
            CashCommand::Move => {
                require(!inputs.is_empty(), "A cash move must consume cash.")?;
                let groups: BTreeSet<(Currency, &PartyAndReference)> = inputs
                    .iter()
                    .chain(outputs.iter())
                    .map(|h| (h.amount.currency, &h.issuer))
                    .collect();
                for (currency, issuer) in groups {
                    let in_sum = sum_group(&inputs, currency, issuer)?;
                    let out_sum = sum_group(&outputs, currency, issuer)?;
                    require(
                        in_sum == out_sum,
                        "Cash inputs and outputs must balance for each currency and issuer.",
                    )?;
                }
                require(
                    inputs.iter().all(|i| signers.contains(&i.owner)),
                    "The owner of every cash input must sign a cash move.",
                )?;
            }
        }
        Ok(())
    }
}

fn sum_group(
    holdings: &[&CashHolding],
    currency: Currency,
    issuer: &PartyAndReference,
) -> Result<u128, ContractViolation> {
    holdings
        .iter()
        .filter(|h| h.amount.currency == currency && &h.issuer == issuer)
        .try_fold(0u128, |acc, h| acc.checked_add(h.amount.value))
        .ok_or_else(|| ContractViolation::from(CoreError::AmountOverflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TransactionBuilder;
    use crate::types::{Party, PartyName};

    fn party(org: &str, byte: u8) -> Party {
        Party::new(PartyName::new(org, "London", "GB"), OwningKey([byte; 32]))
    }

    fn issuer() -> PartyAndReference {
        PartyAndReference::new(party("MegaCorp", 7), vec![1])
    }

    fn gbp(value: u128) -> Amount {
        Amount::new(value, Currency::GBP)
    }

    fn issued(holding: CashHolding) -> crate::StateAndRef<crate::LedgerState> {
        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_output_state(holding);
        builder.to_wire_transaction().out_ref(0).unwrap()
    }

    #[test]
    fn test_sum_without_issuer() {
        let a = CashHolding::new(gbp(300), issuer(), OwningKey([1; 32]));
        let b = CashHolding::new(
            gbp(200),
            PartyAndReference::new(party("OtherBank", 8), vec![2]),
            OwningKey([1; 32]),
        );
        let total = CashHolding::sum_without_issuer([&a, &b]).unwrap().unwrap();
        assert_eq!(total, gbp(500));
    }

    #[test]
    fn test_sum_mixed_currency_fails() {
        let a = CashHolding::new(gbp(300), issuer(), OwningKey([1; 32]));
        let b = CashHolding::new(Amount::new(1, Currency::USD), issuer(), OwningKey([1; 32]));
        assert!(CashHolding::sum_without_issuer([&a, &b]).is_err());
    }

    #[test]
    fn test_issue_requires_issuer_signature() {
        let holding = CashHolding::new(gbp(500), issuer(), OwningKey([1; 32]));
        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_output_state(holding.clone());
        builder.add_command(CashCommand::Issue, vec![OwningKey([1; 32])]);
        assert_eq!(
            builder.verify().unwrap_err().message(),
            "The issuer must sign a cash issuance."
        );

        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_output_state(holding);
        builder.add_command(CashCommand::Issue, vec![OwningKey([7; 32])]);
        assert!(builder.verify().is_ok());
    }

    #[test]
    fn test_move_must_balance() {
        let owner = OwningKey([1; 32]);
        let holding = CashHolding::new(gbp(500), issuer(), owner);
        let input = issued(holding.clone());

        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_input_state(input.clone());
        builder.add_output_state(CashHolding::new(gbp(400), issuer(), OwningKey([2; 32])));
        builder.add_command(CashCommand::Move, vec![owner]);
        assert_eq!(
            builder.verify().unwrap_err().message(),
            "Cash inputs and outputs must balance for each currency and issuer."
        );

        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_input_state(input);
        builder.add_output_state(holding.with_new_owner(OwningKey([2; 32])));
        builder.add_command(CashCommand::Move, vec![owner]);
        assert!(builder.verify().is_ok());
    }

    #[test]
    fn test_move_requires_owner_signature() {
        let owner = OwningKey([1; 32]);
        let holding = CashHolding::new(gbp(500), issuer(), owner);
        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_input_state(issued(holding.clone()));
        builder.add_output_state(holding.with_new_owner(OwningKey([2; 32])));
        builder.add_command(CashCommand::Move, vec![OwningKey([2; 32])]);
        assert_eq!(
            builder.verify().unwrap_err().message(),
            "The owner of every cash input must sign a cash move."
        );
    }

    #[test]
    fn test_cash_requires_cash_command() {
        let holding = CashHolding::new(gbp(500), issuer(), OwningKey([1; 32]));
        let mut builder = TransactionBuilder::new(party("Notary", 9));
        builder.add_output_state(holding);
        assert_eq!(
            builder.verify().unwrap_err().message(),
            "A transaction with cash states must carry exactly one cash command."
        );
    }
}
