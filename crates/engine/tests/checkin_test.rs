//! Check-in guard tests: exactly one of N concurrent attempts succeeds,
//! and every loser sees the winner's identity, not its own.

#![allow(clippy::uninlined_format_args)]

mod common;

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use tokio::sync::Barrier;
use uuid::Uuid;

use tixera_core::settlement::PaymentConfirmation;
use tixera_core::ticket::{CheckInOutcome, TicketStatus};
use tixera_db::entities::tickets;
use tixera_shared::types::StaffId;

use common::{harness, seed_payment, seed_tier, Harness};

/// Settles one sale and returns the issued ticket's reference.
async fn issue_ticket(h: &Harness) -> String {
    let (_, tier) = seed_tier(&h.db, dec!(1000), 10, false).await;
    let reference = seed_payment(&h.db, &tier, dec!(1000)).await;
    let outcome = h
        .engine
        .settlements
        .settle(PaymentConfirmation {
            reference: reference.clone(),
            external_ref: format!("PSK-{}", Uuid::new_v4().simple()),
            amount_paid: dec!(1000),
            paid_at: Utc::now(),
        })
        .await
        .expect("settle failed");
    assert!(outcome.is_settled());

    tickets::Entity::find()
        .filter(tickets::Column::PaymentReference.eq(&reference))
        .one(&h.db)
        .await
        .expect("query failed")
        .expect("ticket missing")
        .reference
}

#[tokio::test]
async fn test_first_checkin_wins_second_reports_it() {
    let Some(h) = harness().await else { return };

    let ticket_ref = issue_ticket(&h).await;
    let winner = StaffId::new();
    let loser = StaffId::new();

    let first = h
        .engine
        .checkin
        .check_in(&ticket_ref, winner)
        .await
        .expect("check-in failed");
    let CheckInOutcome::Admitted { checked_in_at, .. } = first else {
        panic!("first attempt should admit, got {first:?}");
    };

    let second = h
        .engine
        .checkin
        .check_in(&ticket_ref, loser)
        .await
        .expect("check-in failed");
    match second {
        CheckInOutcome::AlreadyCheckedIn {
            checked_in_by,
            checked_in_at: reported_at,
            ..
        } => {
            // The response carries the winning attempt's identity.
            assert_eq!(checked_in_by, winner);
            assert_eq!(reported_at, checked_in_at);
        }
        other => panic!("expected AlreadyCheckedIn, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_checkins_admit_exactly_once() {
    let Some(h) = harness().await else { return };

    let ticket_ref = issue_ticket(&h).await;

    const ATTEMPTS: usize = 8;
    let barrier = Arc::new(Barrier::new(ATTEMPTS));
    let mut handles = Vec::with_capacity(ATTEMPTS);

    for _ in 0..ATTEMPTS {
        let engine = h.engine.clone();
        let barrier = Arc::clone(&barrier);
        let reference = ticket_ref.clone();
        let staff = StaffId::new();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            engine.checkin.check_in(&reference, staff).await
        }));
    }

    let results: Vec<CheckInOutcome> = join_all(handles)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked").expect("check-in errored"))
        .collect();

    let admitted: Vec<_> = results.iter().filter(|o| o.is_admitted()).collect();
    assert_eq!(admitted.len(), 1, "exactly one attempt must win");

    // Every loser reports the same winner and timestamp.
    let CheckInOutcome::Admitted {
        checked_in_by: winner,
        checked_in_at: winning_time,
        ..
    } = admitted[0]
    else {
        unreachable!()
    };

    for outcome in &results {
        if let CheckInOutcome::AlreadyCheckedIn {
            checked_in_by,
            checked_in_at,
            ..
        } = outcome
        {
            assert_eq!(checked_in_by, winner);
            assert_eq!(checked_in_at, winning_time);
        }
    }
}

#[tokio::test]
async fn test_unknown_ticket_is_not_found() {
    let Some(h) = harness().await else { return };

    let outcome = h
        .engine
        .checkin
        .check_in("TIX-DOESNOTEXIST", StaffId::new())
        .await
        .expect("check-in errored");
    assert_eq!(outcome, CheckInOutcome::NotFound);
}

#[tokio::test]
async fn test_refunded_ticket_is_not_redeemable() {
    let Some(h) = harness().await else { return };

    let ticket_ref = issue_ticket(&h).await;
    h.engine
        .refunds
        .post_refund(&ticket_ref, dec!(950))
        .await
        .expect("refund failed");

    let outcome = h
        .engine
        .checkin
        .check_in(&ticket_ref, StaffId::new())
        .await
        .expect("check-in errored");
    match outcome {
        CheckInOutcome::NotRedeemable { status, .. } => {
            assert_eq!(status, TicketStatus::Refunded);
        }
        other => panic!("expected NotRedeemable, got {other:?}"),
    }
}
