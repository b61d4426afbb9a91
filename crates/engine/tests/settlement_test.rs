//! Settlement idempotency and inventory integrity tests.
//!
//! Validates that duplicate confirmations are harmless, that concurrent
//! settlements of the last seat never oversell, and that mismatched
//! amounts are refused loudly. Skips when no database is reachable.

#![allow(clippy::uninlined_format_args)]

mod common;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tokio::sync::Barrier;
use uuid::Uuid;

use tixera_core::gateway::{webhook, GatewayTransaction, GatewayTransactionStatus};
use tixera_core::settlement::{PaymentConfirmation, SettlementError, SettlementOutcome, SkipReason};
use tixera_db::entities::{ledger_entries, payments, sea_orm_active_enums::PaymentStatus, tickets};

use common::{harness, seed_payment, seed_tier, TEST_WEBHOOK_SECRET};

fn confirmation(reference: &str, amount: Decimal) -> PaymentConfirmation {
    PaymentConfirmation {
        reference: reference.to_string(),
        external_ref: format!("PSK-{}", Uuid::new_v4().simple()),
        amount_paid: amount,
        paid_at: Utc::now(),
    }
}

async fn count_tickets(db: &sea_orm::DatabaseConnection, organizer_id: Uuid) -> u64 {
    tickets::Entity::find()
        .filter(tickets::Column::OrganizerId.eq(organizer_id))
        .count(db)
        .await
        .expect("count failed")
}

async fn count_entries(db: &sea_orm::DatabaseConnection, organizer_id: Uuid) -> u64 {
    ledger_entries::Entity::find()
        .filter(ledger_entries::Column::OrganizerId.eq(organizer_id))
        .count(db)
        .await
        .expect("count failed")
}

#[tokio::test]
async fn test_settling_twice_produces_one_ticket_and_one_entry() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(10000)).await;

    let first = h
        .engine
        .settlements
        .settle(confirmation(&reference, dec!(10000)))
        .await
        .expect("first settle failed");
    assert!(first.is_settled());

    let second = h
        .engine
        .settlements
        .settle(confirmation(&reference, dec!(10000)))
        .await
        .expect("second settle errored");
    assert_eq!(
        second,
        SettlementOutcome::Skipped(SkipReason::AlreadyFinal)
    );

    assert_eq!(count_tickets(&h.db, organizer_id).await, 1);
    assert_eq!(count_entries(&h.db, organizer_id).await, 1);

    // 5% platform fee: the organizer nets 9,500 into pending.
    let balance = h
        .engine
        .get_balance(tixera_shared::types::OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.pending, dec!(9500));
    assert_eq!(balance.available, dec!(0));
}

#[tokio::test]
async fn test_concurrent_settlements_of_same_payment_settle_once() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(5000), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(5000)).await;

    const ATTEMPTS: usize = 8;
    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let mut handles = Vec::with_capacity(ATTEMPTS);

    for _ in 0..ATTEMPTS {
        let engine = h.engine.clone();
        let barrier = Arc::clone(&barrier);
        let conf = confirmation(&reference, dec!(5000));
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.settlements.settle(conf).await
        }));
    }

    let results = join_all(handles).await;
    let settled = results
        .iter()
        .filter(|r| matches!(r, Ok(Ok(outcome)) if outcome.is_settled()))
        .count();

    assert_eq!(settled, 1, "exactly one settle must win");
    assert_eq!(count_tickets(&h.db, organizer_id).await, 1);
    assert_eq!(count_entries(&h.db, organizer_id).await, 1);
}

#[tokio::test]
async fn test_last_seat_is_never_oversold() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(2000), 1, false).await;

    const BUYERS: usize = 6;
    let mut references = Vec::with_capacity(BUYERS);
    for _ in 0..BUYERS {
        references.push(seed_payment(&h.db, &tier, dec!(2000)).await);
    }

    let barrier = Arc::new(Barrier::new(BUYERS));
    let mut handles = Vec::with_capacity(BUYERS);
    for reference in &references {
        let engine = h.engine.clone();
        let barrier = Arc::clone(&barrier);
        let conf = confirmation(reference, dec!(2000));
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.settlements.settle(conf).await
        }));
    }

    let results = join_all(handles).await;
    let mut settled = 0;
    let mut sold_out = 0;
    for result in results {
        match result.expect("task panicked") {
            Ok(outcome) if outcome.is_settled() => settled += 1,
            Err(SettlementError::InventorySoldOut(_)) => sold_out += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(settled, 1);
    assert_eq!(sold_out, BUYERS - 1);
    assert_eq!(count_tickets(&h.db, organizer_id).await, 1);

    // The losing payments stay PENDING for manual reconciliation.
    let pending = payments::Entity::find()
        .filter(payments::Column::OrganizerId.eq(organizer_id))
        .filter(payments::Column::Status.eq(PaymentStatus::Pending))
        .count(&h.db)
        .await
        .expect("count failed");
    assert_eq!(pending, (BUYERS - 1) as u64);
}

#[tokio::test]
async fn test_amount_mismatch_fails_payment() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(10000)).await;

    // Paid 9,000 against an expected 10,000: beyond any rounding tolerance.
    let result = h
        .engine
        .settlements
        .settle(confirmation(&reference, dec!(9000)))
        .await;
    assert!(matches!(
        result,
        Err(SettlementError::AmountMismatch { .. })
    ));

    let payment = payments::Entity::find()
        .filter(payments::Column::Reference.eq(&reference))
        .one(&h.db)
        .await
        .expect("query failed")
        .expect("payment missing");
    assert_eq!(payment.status, PaymentStatus::Failed);

    // No money, no ticket.
    assert_eq!(count_tickets(&h.db, organizer_id).await, 0);
    assert_eq!(count_entries(&h.db, organizer_id).await, 0);

    // A retry of the same confirmation is now a terminal-status skip.
    let retry = h
        .engine
        .settlements
        .settle(confirmation(&reference, dec!(10000)))
        .await
        .expect("retry errored");
    assert_eq!(retry, SettlementOutcome::Skipped(SkipReason::AlreadyFinal));
}

#[tokio::test]
async fn test_one_minor_unit_gateway_rounding_is_tolerated() {
    let Some(h) = harness().await else { return };

    let (_, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(10000)).await;

    let outcome = h
        .engine
        .settlements
        .settle(confirmation(&reference, dec!(9999.99)))
        .await
        .expect("settle failed");
    assert!(outcome.is_settled());
}

#[tokio::test]
async fn test_unknown_reference_is_discarded() {
    let Some(h) = harness().await else { return };

    let outcome = h
        .engine
        .settlements
        .settle(confirmation("PAY-does-not-exist", dec!(100)))
        .await
        .expect("settle errored");
    assert_eq!(
        outcome,
        SettlementOutcome::Skipped(SkipReason::UnknownReference)
    );
}

#[tokio::test]
async fn test_free_ticket_settles_without_money() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(0), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(0)).await;

    let outcome = h
        .engine
        .settlements
        .settle(confirmation(&reference, dec!(0)))
        .await
        .expect("settle failed");
    assert!(outcome.is_settled());

    assert_eq!(count_tickets(&h.db, organizer_id).await, 1);
    // Nothing to credit: no ledger entry, no balance movement.
    assert_eq!(count_entries(&h.db, organizer_id).await, 0);
}

#[tokio::test]
async fn test_verify_pending_recovers_missed_confirmations() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(3000), 10, false).await;
    let paid_ref = seed_payment(&h.db, &tier, dec!(3000)).await;
    let abandoned_ref = seed_payment(&h.db, &tier, dec!(3000)).await;

    // The provider knows one charge went through and one was abandoned.
    h.gateway.script_verification(
        &paid_ref,
        GatewayTransaction {
            external_ref: format!("PSK-{}", Uuid::new_v4().simple()),
            status: GatewayTransactionStatus::Success,
            amount_paid: dec!(3000),
            paid_at: Some(Utc::now()),
        },
    );
    h.gateway.script_verification(
        &abandoned_ref,
        GatewayTransaction {
            external_ref: format!("PSK-{}", Uuid::new_v4().simple()),
            status: GatewayTransactionStatus::Failed,
            amount_paid: Decimal::ZERO,
            paid_at: None,
        },
    );

    let report = h
        .engine
        .settlements
        .verify_pending()
        .await
        .expect("verification sweep failed");
    assert!(report.settled >= 1);
    assert!(report.failed >= 1);

    assert_eq!(count_tickets(&h.db, organizer_id).await, 1);

    let abandoned = payments::Entity::find()
        .filter(payments::Column::Reference.eq(&abandoned_ref))
        .one(&h.db)
        .await
        .expect("query failed")
        .expect("payment missing");
    assert_eq!(abandoned.status, PaymentStatus::Failed);

    // Re-running the sweep converges: both payments are now terminal.
    let again = h
        .engine
        .settlements
        .verify_pending()
        .await
        .expect("second sweep failed");
    assert_eq!(again.settled, 0);
}

#[tokio::test]
async fn test_webhook_signature_is_a_hard_precondition() {
    let Some(h) = harness().await else { return };

    let (_, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(10000)).await;

    let event = serde_json::json!({
        "event": "charge.success",
        "reference": reference,
        "external_ref": format!("PSK-{}", Uuid::new_v4().simple()),
        "amount": "10000",
        "paid_at": Utc::now(),
    });
    let body = serde_json::to_vec(&event).expect("serialize failed");

    // Wrong signature: rejected before the body is parsed.
    let rejected = h
        .engine
        .settlements
        .handle_webhook("deadbeef", &body)
        .await;
    assert!(matches!(
        rejected,
        Err(SettlementError::WebhookRejected(_))
    ));

    // Correct signature settles.
    let signature = webhook::sign(TEST_WEBHOOK_SECRET, &body);
    let outcome = h
        .engine
        .settlements
        .handle_webhook(&signature, &body)
        .await
        .expect("webhook settle failed");
    assert!(outcome.is_settled());
}
