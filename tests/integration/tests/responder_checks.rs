//! Integration test: counterparties re-verify what they are asked to sign.

use iou_core::{Amount, Currency, IouCommand, TransactionBuilder};
use iou_flows::{FlowError, FlowKind, SignatureRequest};
use iou_integration_tests::{current, gbp, issue, Scenario};

#[tokio::test]
async fn test_counterparty_rejects_transfer_that_changes_principal() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    let input = s.a.hub.vault.note_by_id(&note.lifecycle_id).unwrap();

    let mut inflated = input.state.with_new_payee(s.c.our_identity().clone());
    inflated.principal = gbp(100);

    let mut builder = TransactionBuilder::new(input.notary.clone());
    builder.add_input_state(input.clone().into_any());
    builder.add_output_state(inflated);
    builder.add_command(
        IouCommand::Transfer,
        vec![
            s.a.our_identity().owning_key,
            s.b.our_identity().owning_key,
            s.c.our_identity().owning_key,
        ],
    );
    let stx = s
        .a
        .hub
        .sign_initial_transaction(&builder, [&s.a.our_identity().owning_key])
        .unwrap();
    let dependencies = s.a.hub.dependencies(&stx.tx).unwrap();

    let session = s.a.initiate_flow(s.b.our_identity(), FlowKind::Transfer).unwrap();
    let err = session
        .request_signatures(SignatureRequest { stx, dependencies })
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Contract(_)));
    assert_eq!(err.to_string(), "Only the payee property may change.");

    assert_eq!(current(&s.b, &note.lifecycle_id).unwrap(), note);
}

#[tokio::test]
async fn test_counterparty_rejects_issue_without_note() {
    let s = Scenario::new();
    let me = s.b.our_identity().clone();

    // A bare cash issuance dressed up as an IOU proposal.
    let mut builder = TransactionBuilder::new(s.b.hub.notary().unwrap());
    builder.add_output_state(iou_core::CashHolding::new(
        Amount::new(100, Currency::GBP),
        iou_core::PartyAndReference::new(me.clone(), vec![0]),
        s.a.our_identity().owning_key,
    ));
    builder.add_command(iou_core::CashCommand::Issue, vec![me.owning_key, s.a.our_identity().owning_key]);
    let stx = s
        .b
        .hub
        .sign_initial_transaction(&builder, [&me.owning_key])
        .unwrap();

    let session = s.b.initiate_flow(s.a.our_identity(), FlowKind::Issue).unwrap();
    let err = session
        .request_signatures(SignatureRequest {
            stx,
            dependencies: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::CounterpartyRefused { .. }));
    assert!(err.to_string().ends_with("This must be an IOU transaction."));
}
