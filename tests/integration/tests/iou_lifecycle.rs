//! Integration test: full IOU lifecycles across parties.
//!
//! Issue, transfer and settle notes between three nodes on one network,
//! checking every party's vault after each step.

use std::collections::BTreeSet;

use iou_core::{CommandData, Currency, IouCommand, OwningKey};
use iou_flows::FlowError;
use iou_integration_tests::{current, gbp, issue, self_issue, settle, transfer, Scenario};

fn keys(ctxs: &[&iou_flows::FlowContext]) -> BTreeSet<OwningKey> {
    ctxs.iter().map(|c| c.our_identity().owning_key).collect()
}

// =========================================================================
// Settlement
// =========================================================================

#[tokio::test]
async fn test_issue_fund_and_partially_settle() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    self_issue(&s.b, gbp(5)).await.unwrap();

    let stx = settle(&s.b, &note.lifecycle_id, gbp(5)).await.unwrap();

    let outputs: Vec<_> = stx.tx.outputs.iter().filter_map(|o| o.as_note()).collect();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].amount_paid, gbp(5));

    let to_a: Vec<_> = stx
        .tx
        .outputs
        .iter()
        .filter_map(|o| o.as_cash())
        .filter(|c| c.owner == s.a.our_identity().owning_key)
        .collect();
    assert_eq!(to_a.len(), 1);
    assert_eq!(to_a[0].amount, gbp(5));

    let settle_cmd = stx
        .tx
        .commands
        .iter()
        .find(|c| c.data == CommandData::from(IouCommand::Settle))
        .unwrap();
    assert_eq!(settle_cmd.signer_set(), keys(&[&s.a, &s.b]));

    assert_eq!(current(&s.a, &note.lifecycle_id).unwrap().amount_paid, gbp(5));
    assert_eq!(current(&s.b, &note.lifecycle_id).unwrap().amount_paid, gbp(5));
    assert!(current(&s.c, &note.lifecycle_id).is_none());
}

#[tokio::test]
async fn test_settlements_accumulate_and_retire_the_note() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    self_issue(&s.b, gbp(20)).await.unwrap();

    let mut paid = 0;
    for pounds in [1, 2, 2] {
        settle(&s.b, &note.lifecycle_id, gbp(pounds)).await.unwrap();
        paid += pounds;
        let now = current(&s.a, &note.lifecycle_id).unwrap();
        assert_eq!(now.amount_paid, gbp(paid));
        assert!(now.amount_paid.value <= now.principal.value);
    }
    assert_eq!(paid, 5);

    // Exactly the remainder retires the note.
    let stx = settle(&s.b, &note.lifecycle_id, gbp(5)).await.unwrap();
    assert!(stx.tx.outputs.iter().all(|o| o.as_note().is_none()));
    assert!(current(&s.a, &note.lifecycle_id).is_none());
    assert!(current(&s.b, &note.lifecycle_id).is_none());

    assert_eq!(s.a.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(10));
    assert_eq!(s.b.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(10));

    // Nothing left to settle.
    assert!(matches!(
        settle(&s.b, &note.lifecycle_id, gbp(1)).await,
        Err(FlowError::Ledger(_))
    ));
}

#[tokio::test]
async fn test_overpayment_and_insufficient_funds_leave_ledger_unchanged() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    self_issue(&s.b, gbp(4)).await.unwrap();

    let err = settle(&s.b, &note.lifecycle_id, gbp(5)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Borrower only has 4.00 GBP but needs 5.00 GBP to settle."
    );

    self_issue(&s.b, gbp(20)).await.unwrap();
    let err = settle(&s.b, &note.lifecycle_id, gbp(11)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Borrower tried to settle with 11.00 GBP but only needs 10.00 GBP."
    );

    assert_eq!(current(&s.a, &note.lifecycle_id).unwrap(), note);
    assert_eq!(s.b.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(24));
    assert_eq!(s.a.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(0));
}

// =========================================================================
// Transfer
// =========================================================================

#[tokio::test]
async fn test_transfer_to_third_party() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();

    // Only the current payee may transfer.
    let err = transfer(&s.b, &note.lifecycle_id, &s.c).await.unwrap_err();
    assert!(matches!(err, FlowError::Unauthorized(_)));
    assert_eq!(
        err.to_string(),
        "An IOU transfer can only be initiated by the IOU's current payee."
    );

    let stx = transfer(&s.a, &note.lifecycle_id, &s.c).await.unwrap();
    assert_eq!(stx.tx.commands[0].signer_set(), keys(&[&s.a, &s.b, &s.c]));

    let moved = current(&s.c, &note.lifecycle_id).unwrap();
    assert_eq!(&moved.payee, s.c.our_identity());
    assert_eq!(&moved.payer, s.b.our_identity());
    assert_eq!(moved.principal, note.principal);
    assert_eq!(moved.amount_paid, note.amount_paid);
    assert_eq!(current(&s.b, &note.lifecycle_id).unwrap(), moved);
    assert!(current(&s.a, &note.lifecycle_id).is_none());
}

#[tokio::test]
async fn test_transfer_then_settle_in_full() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    transfer(&s.a, &note.lifecycle_id, &s.c).await.unwrap();
    self_issue(&s.b, gbp(10)).await.unwrap();

    settle(&s.b, &note.lifecycle_id, gbp(3)).await.unwrap();
    settle(&s.b, &note.lifecycle_id, gbp(7)).await.unwrap();

    assert_eq!(s.c.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(10));
    assert_eq!(s.a.hub.vault.cash_balance(Currency::GBP).unwrap(), gbp(0));
    assert!(current(&s.c, &note.lifecycle_id).is_none());
}

// =========================================================================
// Issuance
// =========================================================================

#[tokio::test]
async fn test_invalid_issuances_rejected() {
    let s = Scenario::new();

    let err = issue(&s.b, &s.a, gbp(0)).await.unwrap_err();
    assert_eq!(err.to_string(), "A newly issued IOU must have a positive amount.");

    let err = issue(&s.b, &s.b, gbp(10)).await.unwrap_err();
    assert_eq!(err.to_string(), "The payee and payer cannot have the same identity.");

    assert!(s.a.hub.vault.unconsumed_notes().is_empty());
    assert!(s.b.hub.vault.unconsumed_notes().is_empty());
}

#[tokio::test]
async fn test_notes_in_several_currencies() {
    let s = Scenario::new();
    let usd = iou_core::Amount::from_major(7, Currency::USD).unwrap();
    let gbp_note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    let usd_note = issue(&s.b, &s.a, usd.clone()).await.unwrap();
    self_issue(&s.b, gbp(10)).await.unwrap();
    self_issue(&s.b, usd.clone()).await.unwrap();

    // Pounds cannot pay a dollar note.
    let err = settle(&s.b, &usd_note.lifecycle_id, gbp(7)).await.unwrap_err();
    assert_eq!(err.to_string(), "token mismatch: GBP vs USD");

    settle(&s.b, &usd_note.lifecycle_id, usd).await.unwrap();
    settle(&s.b, &gbp_note.lifecycle_id, gbp(10)).await.unwrap();

    let balances = s.a.hub.vault.cash_balances().unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[&Currency::USD].value, 700);
    assert_eq!(balances[&Currency::GBP].value, 1000);
    assert!(s.a.hub.vault.unconsumed_notes().is_empty());
}
