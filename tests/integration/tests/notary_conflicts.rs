//! Integration test: the notary serializes consumers of each note version.

use iou_core::{IouCommand, SignedTransaction, StateAndRef, DebtNote, TransactionBuilder};
use iou_flows::{FlowContext, Messaging};
use iou_ledger::LedgerError;
use iou_integration_tests::{current, gbp, issue, transfer, Scenario};

/// A transfer of `input` to `to`, signed by `signers` but not notarised.
fn replay_transfer(
    s: &Scenario,
    input: &StateAndRef<DebtNote>,
    to: &FlowContext,
    signers: &[&FlowContext],
) -> SignedTransaction {
    let mut builder = TransactionBuilder::new(input.notary.clone());
    builder.add_input_state(input.clone().into_any());
    builder.add_output_state(input.state.with_new_payee(to.our_identity().clone()));
    builder.add_command(
        IouCommand::Transfer,
        [&s.a, &s.b, &s.c]
            .iter()
            .map(|c| c.our_identity().owning_key)
            .collect(),
    );
    let wire = builder.to_wire_transaction();
    let id = wire.id();
    let mut sigs = Vec::new();
    for ctx in signers {
        sigs.extend(
            ctx.hub
                .keys
                .sign_all(&id, [&ctx.our_identity().owning_key])
                .unwrap(),
        );
    }
    SignedTransaction::new(wire, sigs)
}

#[tokio::test]
async fn test_consumed_version_cannot_be_spent_again() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    let original = s.a.hub.vault.note_by_id(&note.lifecycle_id).unwrap();

    let winner = transfer(&s.a, &note.lifecycle_id, &s.c).await.unwrap();

    let loser = replay_transfer(&s, &original, &s.c, &[&s.a, &s.b, &s.c]);
    let notary = s.network.notary_service(&original.notary).unwrap();
    match notary.notarise(&loser).await {
        Err(LedgerError::DoubleSpend { state, consumed_by }) => {
            assert_eq!(state, original.reference);
            assert_eq!(consumed_by, winner.id());
        }
        other => panic!("expected a double spend, got {:?}", other),
    }

    // The winner is unaffected and the current version can still move.
    assert_eq!(&current(&s.b, &note.lifecycle_id).unwrap().payee, s.c.our_identity());
    transfer(&s.c, &note.lifecycle_id, &s.a).await.unwrap();
    assert_eq!(&current(&s.a, &note.lifecycle_id).unwrap().payee, s.a.our_identity());
}

#[tokio::test]
async fn test_notary_requires_every_signature() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    let input = s.a.hub.vault.note_by_id(&note.lifecycle_id).unwrap();

    let unsigned_by_b = replay_transfer(&s, &input, &s.c, &[&s.a, &s.c]);
    let notary = s.network.notary_service(&input.notary).unwrap();
    assert!(matches!(
        notary.notarise(&unsigned_by_b).await,
        Err(LedgerError::Crypto(_))
    ));

    // Rejection does not commit the input.
    let signed = replay_transfer(&s, &input, &s.c, &[&s.a, &s.b, &s.c]);
    assert!(notary.notarise(&signed).await.is_ok());
}

#[tokio::test]
async fn test_notarising_twice_is_idempotent() {
    let s = Scenario::new();
    let note = issue(&s.b, &s.a, gbp(10)).await.unwrap();
    let input = s.a.hub.vault.note_by_id(&note.lifecycle_id).unwrap();
    let stx = replay_transfer(&s, &input, &s.c, &[&s.a, &s.b, &s.c]);

    let notary = s.network.notary_service(&input.notary).unwrap();
    let first = notary.notarise(&stx).await.unwrap();
    let second = notary.notarise(&stx).await.unwrap();
    assert_eq!(first.by, second.by);
}
