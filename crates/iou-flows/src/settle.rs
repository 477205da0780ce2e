use std::collections::BTreeSet;

use iou_core::{Amount, IouCommand, LinearId, SignedTransaction, TransactionBuilder};
use iou_ledger::generate_spend;

use crate::collect::collect_signatures;
use crate::error::FlowError;
use crate::finality::finalise;
use crate::identity_sync::send_identities;
use crate::session::{FlowContext, FlowKind};

/// Pay cash against a debt note. Only the payer may start it.
///
/// A payment equal to the outstanding amount retires the note; anything
/// less produces the next version with `amount_paid` increased.
pub struct SettleFlow {
    pub lifecycle_id: LinearId,
    pub amount: Amount,
}

impl SettleFlow {
    pub fn new(lifecycle_id: LinearId, amount: Amount) -> Self {
        Self {
            lifecycle_id,
            amount,
        }
    }

    pub async fn call(self, ctx: &FlowContext) -> Result<SignedTransaction, FlowError> {
        let me = ctx.our_identity().clone();
        let input = ctx.hub.vault.note_by_id(&self.lifecycle_id)?;
        let note = input.state.clone();
        if note.payer != me {
            return Err(FlowError::Unauthorized(
                "Settlement of an IOU must be initiated by the payer.".to_string(),
            ));
        }

        let balance = ctx.hub.vault.cash_balance(self.amount.currency)?;
        if balance.value < self.amount.value {
            return Err(FlowError::InsufficientFunds {
                available: balance,
                required: self.amount,
            });
        }
        let remaining = note.remaining()?;
        self.amount.ensure_same_currency(&remaining)?;
        if self.amount.value > remaining.value {
            return Err(FlowError::Overpayment {
                payment: self.amount,
                remaining,
            });
        }
        tracing::info!(note = %self.lifecycle_id, amount = %self.amount, remaining = %remaining, "settling IOU");

        let mut builder = TransactionBuilder::new(input.notary.clone());
        let cash_keys = generate_spend(
            &ctx.hub.vault,
            &ctx.hub.keys,
            &mut builder,
            &self.amount,
            note.payee.owning_key,
        )?;
        builder.add_command(
            IouCommand::Settle,
            vec![note.payee.owning_key, note.payer.owning_key],
        );
        builder.add_input_state(input.clone().into_any());
        if remaining.value > self.amount.value {
            builder.add_output_state(note.pay(&self.amount)?);
        }

        let session = ctx.initiate_flow(&note.payee, FlowKind::Settle)?;
        send_identities(ctx, session.as_ref(), &builder.to_wire_transaction()).await?;

        builder.verify()?;

        let mut my_keys: BTreeSet<_> = cash_keys.into_iter().collect();
        my_keys.insert(me.owning_key);
        let ptx = ctx.hub.sign_initial_transaction(&builder, &my_keys)?;

        let sessions = vec![session];
        let stx = collect_signatures(ctx, ptx, &sessions).await?;
        finalise(ctx, stx, &sessions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fund, gbp, issue_note, TestNet};
    use crate::TransferFlow;
    use iou_core::{CommandData, Currency, DebtNote, OwningKey};

    async fn settle(net: &TestNet, note: &DebtNote, value: u128) -> Result<SignedTransaction, FlowError> {
        SettleFlow::new(note.lifecycle_id.clone(), gbp(value)).call(&net.b).await
    }

    #[tokio::test]
    async fn test_partial_settlement_scenario() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 500).await;

        let stx = settle(&net, &note, 500).await.unwrap();

        let notes: Vec<_> = stx.tx.outputs.iter().filter_map(|o| o.as_note()).collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].amount_paid, gbp(500));

        let a_key = net.a.our_identity().owning_key;
        let paid: Vec<_> = stx
            .tx
            .outputs
            .iter()
            .filter_map(|o| o.as_cash())
            .filter(|c| c.owner == a_key)
            .collect();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].amount, gbp(500));

        let settle_cmd = stx
            .tx
            .commands
            .iter()
            .find(|c| c.data == CommandData::from(IouCommand::Settle))
            .unwrap();
        let expected: BTreeSet<OwningKey> = [a_key, net.b.our_identity().owning_key].into_iter().collect();
        assert_eq!(settle_cmd.signer_set(), expected);

        assert_eq!(net.a.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(500));
        assert_eq!(net.b.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(0));
        for ctx in [&net.a, &net.b] {
            let current = ctx.hub.vault.note_by_id(&note.lifecycle_id).unwrap();
            assert_eq!(current.state.amount_paid, gbp(500));
        }
    }

    #[tokio::test]
    async fn test_repeated_partial_settlements_accumulate() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 10).await;
        fund(&net.b, 10).await;

        for value in [1, 2, 2] {
            settle(&net, &note, value).await.unwrap();
        }
        let current = net.a.hub.vault.note_by_id(&note.lifecycle_id).unwrap();
        assert_eq!(current.state.amount_paid, gbp(5));
        assert_eq!(net.a.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(5));
        // Change came back to the payer each time.
        assert_eq!(net.b.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(5));
    }

    #[tokio::test]
    async fn test_settling_remaining_retires_note() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 1000).await;

        let stx = settle(&net, &note, 1000).await.unwrap();
        assert!(stx.tx.outputs.iter().all(|o| o.as_note().is_none()));
        assert!(net.a.hub.vault.note_by_id(&note.lifecycle_id).is_err());
        assert!(net.b.hub.vault.note_by_id(&note.lifecycle_id).is_err());
    }

    #[tokio::test]
    async fn test_settling_remaining_minus_one() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 1000).await;

        let stx = settle(&net, &note, 999).await.unwrap();
        let notes: Vec<_> = stx.tx.outputs.iter().filter_map(|o| o.as_note()).collect();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].amount_paid, gbp(999));
    }

    #[tokio::test]
    async fn test_settling_remaining_plus_one_is_overpayment() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 2000).await;

        let err = settle(&net, &note, 1001).await.unwrap_err();
        assert!(matches!(err, FlowError::Overpayment { .. }));
        assert_eq!(
            err.to_string(),
            "Borrower tried to settle with 10.01 GBP but only needs 10.00 GBP."
        );
        assert_eq!(net.b.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(2000));
    }

    #[tokio::test]
    async fn test_overpayment_counts_previous_payments() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 2000).await;
        settle(&net, &note, 600).await.unwrap();
        assert!(matches!(
            settle(&net, &note, 401).await,
            Err(FlowError::Overpayment { .. })
        ));
        assert!(settle(&net, &note, 400).await.is_ok());
    }

    #[tokio::test]
    async fn test_insufficient_funds() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 300).await;

        let err = settle(&net, &note, 500).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Borrower only has 3.00 GBP but needs 5.00 GBP to settle."
        );
        assert_eq!(net.a.hub.vault.note_by_id(&note.lifecycle_id).unwrap().state, note);
    }

    #[tokio::test]
    async fn test_settle_by_payee_unauthorized() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.a, 1000).await;
        let err = SettleFlow::new(note.lifecycle_id.clone(), gbp(500))
            .call(&net.a)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_settle_in_other_currency_rejected() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        let usd = iou_core::Amount::new(500, Currency::USD);
        crate::SelfIssueCashFlow::new(usd.clone()).call(&net.b).await.unwrap();
        let err = SettleFlow::new(note.lifecycle_id.clone(), usd)
            .call(&net.b)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "token mismatch: USD vs GBP");
    }

    #[tokio::test]
    async fn test_payee_learns_anonymous_cash_keys() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        fund(&net.b, 600).await;
        let stx = settle(&net, &note, 500).await.unwrap();

        let b = net.b.our_identity();
        let change_owner = stx
            .tx
            .outputs
            .iter()
            .filter_map(|o| o.as_cash())
            .find(|c| c.owner != net.a.our_identity().owning_key)
            .map(|c| c.owner)
            .unwrap();
        assert_eq!(net.a.hub.identity.party_from_key(&change_owner).as_ref(), Some(b));
    }

    #[tokio::test]
    async fn test_settle_after_transfer_pays_new_payee() {
        let net = TestNet::new();
        let (note, _) = issue_note(&net.b, &net.a, 1000).await;
        TransferFlow::new(note.lifecycle_id.clone(), net.c.our_identity().clone())
            .call(&net.a)
            .await
            .unwrap();
        fund(&net.b, 1000).await;

        settle(&net, &note, 400).await.unwrap();
        assert_eq!(net.c.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(400));
        assert_eq!(net.a.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(0));
        let current = net.c.hub.vault.note_by_id(&note.lifecycle_id).unwrap();
        assert_eq!(current.state.amount_paid, gbp(400));
    }
}
