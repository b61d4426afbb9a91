//! Maturity sweep tests, including the worked end-to-end scenario:
//! a ₦10,000 sale at 5% fee matures to ₦9,500, a ₦500 refund shrinks it
//! to ₦9,000, and a ₦9,000 withdrawal drains it into `withdrawn`.

#![allow(clippy::uninlined_format_args)]

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use tixera_core::settlement::PaymentConfirmation;
use tixera_db::entities::{sea_orm_active_enums::WithdrawalStatus, tickets};
use tixera_engine::RefundOutcome;
use tixera_shared::types::{OrganizerId, WithdrawalId};

use common::{bank_details, harness, seed_payment, seed_tier, wait_for_withdrawal_status, Harness};

/// Settles a payment whose provider timestamp is `hours_ago` in the past,
/// returning the ticket reference.
async fn settle_aged_sale(
    h: &Harness,
    tier: &tixera_db::entities::tiers::Model,
    amount: Decimal,
    hours_ago: i64,
) -> String {
    let reference = seed_payment(&h.db, tier, amount).await;
    let outcome = h
        .engine
        .settlements
        .settle(PaymentConfirmation {
            reference: reference.clone(),
            external_ref: format!("PSK-{}", Uuid::new_v4().simple()),
            amount_paid: amount,
            paid_at: Utc::now() - Duration::hours(hours_ago),
        })
        .await
        .expect("settle failed");
    assert!(outcome.is_settled(), "sale did not settle: {outcome:?}");

    tickets::Entity::find()
        .filter(tickets::Column::PaymentReference.eq(&reference))
        .one(&h.db)
        .await
        .expect("query failed")
        .expect("ticket missing")
        .reference
}

#[tokio::test]
async fn test_funds_younger_than_24h_stay_pending() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    settle_aged_sale(&h, &tier, dec!(10000), 1).await;

    let released = h
        .engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");
    assert_eq!(released, dec!(0));

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.pending, dec!(9500));
    assert_eq!(balance.available, dec!(0));
}

#[tokio::test]
async fn test_matured_funds_are_released() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    settle_aged_sale(&h, &tier, dec!(10000), 25).await;

    let released = h
        .engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");
    assert_eq!(released, dec!(9500));

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.pending, dec!(0));
    assert_eq!(balance.available, dec!(9500));

    // A second sweep converges to zero.
    let again = h
        .engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");
    assert_eq!(again, dec!(0));
}

#[tokio::test]
async fn test_mixed_ages_release_only_the_matured_part() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    settle_aged_sale(&h, &tier, dec!(10000), 25).await;
    settle_aged_sale(&h, &tier, dec!(10000), 1).await;

    let released = h
        .engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");
    assert_eq!(released, dec!(9500));

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.pending, dec!(9500));
    assert_eq!(balance.available, dec!(9500));
}

#[tokio::test]
async fn test_refund_after_maturity_never_inflates_available() {
    let Some(h) = harness().await else { return };

    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    let ticket_ref = settle_aged_sale(&h, &tier, dec!(10000), 25).await;

    h.engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");

    // Refund against the already-matured sale.
    let outcome = h
        .engine
        .refunds
        .post_refund(&ticket_ref, dec!(500))
        .await
        .expect("refund failed");
    assert_eq!(outcome, RefundOutcome::Posted);

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.available, dec!(9000));

    // Sweeps after the refund must not release anything further.
    let released = h
        .engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");
    assert_eq!(released, dec!(0));

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.available, dec!(9000));
    assert_eq!(balance.pending, dec!(0));

    // Refunding the same ticket twice is a skip, not a second debit.
    let duplicate = h
        .engine
        .refunds
        .post_refund(&ticket_ref, dec!(500))
        .await
        .expect("duplicate refund errored");
    assert_eq!(duplicate, RefundOutcome::Skipped);
}

#[tokio::test]
async fn test_worked_scenario_end_to_end() {
    let Some(h) = harness().await else { return };

    // A ₦10,000 sale settles at 5% fee -> pending = 9,500.
    let (organizer_id, tier) = seed_tier(&h.db, dec!(10000), 10, false).await;
    let ticket_ref = settle_aged_sale(&h, &tier, dec!(10000), 25).await;

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.pending, dec!(9500));

    // 25 hours later a sweep runs -> available = 9,500, pending = 0.
    h.engine
        .sweep
        .run_for_organizer(organizer_id)
        .await
        .expect("sweep failed");
    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.available, dec!(9500));
    assert_eq!(balance.pending, dec!(0));

    // A ₦500 refund posts -> available = 9,000.
    h.engine
        .refunds
        .post_refund(&ticket_ref, dec!(500))
        .await
        .expect("refund failed");
    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.available, dec!(9000));

    // A ₦9,000 withdrawal: OTP verified, transfer succeeds immediately
    // -> available = 0, withdrawn = 9,000.
    let withdrawal = h
        .engine
        .withdrawals
        .request(OrganizerId::from_uuid(organizer_id), dec!(9000), bank_details())
        .await
        .expect("request failed");

    let (_, code) = h.notifier.last_otp().expect("no OTP sent");
    h.engine
        .withdrawals
        .verify_otp(WithdrawalId::from_uuid(withdrawal.id), &code)
        .await
        .expect("otp verification failed");

    wait_for_withdrawal_status(&h.db, withdrawal.id, WithdrawalStatus::Completed).await;

    let balance = h
        .engine
        .get_balance(OrganizerId::from_uuid(organizer_id))
        .await
        .expect("balance read failed");
    assert_eq!(balance.available, dec!(0));
    assert_eq!(balance.pending, dec!(0));
    assert_eq!(balance.withdrawn, dec!(9000));
}
