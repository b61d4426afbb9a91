//! The settlement engine.
//!
//! Turns verified payment confirmations into tickets and balance credits,
//! exactly once per external transaction. Duplicate delivery is treated
//! as the normal case: webhook retries, manual verification calls, and
//! overlapping verify-all sweeps all converge on the payment status guard
//! or the ledger dedup key.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

use tixera_core::gateway::{webhook, GatewayTransactionStatus, PaymentGateway};
use tixera_core::notify::{NotificationService, TicketConfirmation};
use tixera_core::settlement::{
    FeePolicy, PaymentConfirmation, SettlementError, SettlementOutcome, SkipReason,
};
use tixera_shared::types::money::{within_tolerance, Currency};
use tixera_shared::types::{TicketId, TierId};

use tixera_db::entities::sea_orm_active_enums::PaymentStatus;
use tixera_db::repositories::settlement::{SettleSaleError, SettleSaleInput};
use tixera_db::{PaymentRepository, SettlementRepository, TierRepository};

use crate::maturity::MaturitySweep;

/// Report from a verify-all-pending sweep.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerifyReport {
    /// Payments examined.
    pub examined: usize,
    /// Payments settled by this sweep.
    pub settled: usize,
    /// Payments marked failed by this sweep.
    pub failed: usize,
    /// Payments skipped as duplicates or still pending.
    pub skipped: usize,
    /// Gateway or database errors (the payment stays pending).
    pub errors: usize,
}

/// The settlement engine.
#[derive(Clone)]
pub struct SettlementEngine {
    payments: PaymentRepository,
    tiers: TierRepository,
    settlements: SettlementRepository,
    sweep: MaturitySweep,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationService>,
    fees: FeePolicy,
    webhook_secret: String,
}

impl SettlementEngine {
    /// Creates a settlement engine.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationService>,
        fees: FeePolicy,
        webhook_secret: String,
    ) -> Self {
        Self {
            payments: PaymentRepository::new(db.clone()),
            tiers: TierRepository::new(db.clone()),
            settlements: SettlementRepository::new(db.clone()),
            sweep: MaturitySweep::new(db),
            gateway,
            notifier,
            fees,
            webhook_secret,
        }
    }

    /// Settles one verified payment confirmation.
    ///
    /// # Errors
    ///
    /// Returns `AmountMismatch` (payment marked FAILED),
    /// `InventorySoldOut` (payment left PENDING for manual
    /// reconciliation), or `Database` errors. Duplicates and unknown
    /// references are `Ok(Skipped(..))`, not errors.
    pub async fn settle(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<SettlementOutcome, SettlementError> {
        let payment = self
            .payments
            .find_by_reference(&confirmation.reference)
            .await
            .map_err(db_err)?;

        let Some(payment) = payment else {
            // Corrupted input or another system's payment. Never create
            // money for an unknown reference.
            warn!(
                reference = %confirmation.reference,
                external_ref = %confirmation.external_ref,
                "Discarding confirmation for unknown payment reference"
            );
            return Ok(SettlementOutcome::Skipped(SkipReason::UnknownReference));
        };

        if payment.status != PaymentStatus::Pending {
            debug!(
                reference = %confirmation.reference,
                "Payment already settled or failed, skipping"
            );
            return Ok(SettlementOutcome::Skipped(SkipReason::AlreadyFinal));
        }

        let tier = self
            .tiers
            .find_by_id(payment.tier_id)
            .await
            .map_err(db_err)?
            .ok_or(SettlementError::TierNotFound(TierId::from_uuid(
                payment.tier_id,
            )))?;

        let currency: Currency = tier.currency.parse().map_err(|e: String| {
            SettlementError::Database(format!("tier {} has invalid currency: {e}", tier.id))
        })?;

        let expected = self
            .fees
            .expected_charge(tier.price, tier.buyer_pays_fee, currency);

        if !within_tolerance(confirmation.amount_paid, expected, currency) {
            // Never silently accept a mismatched amount.
            self.payments
                .mark_failed(&confirmation.reference, "amount mismatch")
                .await
                .map_err(db_err)?;
            warn!(
                reference = %confirmation.reference,
                %expected,
                paid = %confirmation.amount_paid,
                "Payment amount mismatch, marked failed"
            );
            return Err(SettlementError::AmountMismatch {
                reference: confirmation.reference,
                expected,
                paid: confirmation.amount_paid,
            });
        }

        let net = self
            .fees
            .organizer_net(tier.price, tier.buyer_pays_fee, currency);

        let settled = match self
            .settlements
            .settle_sale(SettleSaleInput {
                payment_reference: confirmation.reference.clone(),
                external_ref: confirmation.external_ref.clone(),
                paid_at: confirmation.paid_at,
                tier_id: tier.id,
                organizer_id: payment.organizer_id,
                net_amount: net,
            })
            .await
        {
            Ok(settled) => settled,
            Err(SettleSaleError::PaymentNotPending) => {
                return Ok(SettlementOutcome::Skipped(SkipReason::AlreadyFinal));
            }
            Err(SettleSaleError::DuplicateEntry) => {
                return Ok(SettlementOutcome::Skipped(SkipReason::DuplicateLedgerEntry));
            }
            Err(SettleSaleError::SoldOut) => {
                warn!(
                    reference = %confirmation.reference,
                    tier_id = %tier.id,
                    "Settlement aborted: tier sold out, payment left pending for review"
                );
                return Err(SettlementError::InventorySoldOut(TierId::from_uuid(tier.id)));
            }
            Err(SettleSaleError::Ledger(e)) => {
                return Err(SettlementError::Database(e.to_string()));
            }
            Err(SettleSaleError::Db(e)) => return Err(db_err(e)),
        };

        info!(
            reference = %confirmation.reference,
            ticket = %settled.ticket.reference,
            organizer_id = %payment.organizer_id,
            %net,
            "Payment settled"
        );

        // Best-effort from here: the settlement is already durable and
        // these failures must never roll it back.
        if let Err(e) = self.sweep.run_for_organizer(payment.organizer_id).await {
            warn!(organizer_id = %payment.organizer_id, error = %e, "Post-settlement sweep failed");
        }

        let note = TicketConfirmation {
            ticket_id: TicketId::from_uuid(settled.ticket.id),
            ticket_reference: settled.ticket.reference.clone(),
            buyer_email: payment.buyer_email.clone(),
        };
        if let Err(e) = self.notifier.ticket_confirmed(&note).await {
            warn!(reference = %confirmation.reference, error = %e, "Ticket confirmation notification failed");
        }

        Ok(SettlementOutcome::Settled {
            ticket_id: TicketId::from_uuid(settled.ticket.id),
            net_credited: net,
        })
    }

    /// Verifies and settles a signed webhook payload.
    ///
    /// Signature verification is a hard precondition: the body is not
    /// even parsed until the HMAC matches.
    ///
    /// # Errors
    ///
    /// Returns `WebhookRejected` for bad signatures, `MalformedWebhook`
    /// for unparseable bodies, and the usual settlement errors after
    /// that.
    pub async fn handle_webhook(
        &self,
        signature: &str,
        body: &[u8],
    ) -> Result<SettlementOutcome, SettlementError> {
        webhook::verify_signature(&self.webhook_secret, body, signature)?;

        let event: webhook::WebhookEvent = serde_json::from_slice(body)
            .map_err(|e| SettlementError::MalformedWebhook(e.to_string()))?;

        if !event.is_charge_success() {
            debug!(event = %event.event, "Ignoring non-charge webhook event");
            return Ok(SettlementOutcome::Skipped(SkipReason::IgnoredEvent));
        }

        self.settle(PaymentConfirmation {
            reference: event.reference,
            external_ref: event.external_ref,
            amount_paid: event.amount,
            paid_at: event.paid_at,
        })
        .await
    }

    /// Re-verifies every pending payment through the gateway.
    ///
    /// Each payment is an independent unit: failures are logged and the
    /// sweep moves on, so interrupting it part-way loses nothing. Safe to
    /// run concurrently with webhooks — both paths converge on the same
    /// idempotency guards.
    ///
    /// # Errors
    ///
    /// Returns an error only if the pending list itself cannot be read.
    pub async fn verify_pending(&self) -> Result<VerifyReport, SettlementError> {
        let pending = self.payments.list_pending().await.map_err(db_err)?;

        let mut report = VerifyReport {
            examined: pending.len(),
            ..VerifyReport::default()
        };

        for payment in pending {
            match self.gateway.verify_transaction(&payment.reference).await {
                Ok(tx) => match tx.status {
                    GatewayTransactionStatus::Success => {
                        let confirmation = PaymentConfirmation {
                            reference: payment.reference.clone(),
                            external_ref: tx.external_ref,
                            amount_paid: tx.amount_paid,
                            paid_at: tx.paid_at.unwrap_or_else(Utc::now),
                        };
                        match self.settle(confirmation).await {
                            Ok(SettlementOutcome::Settled { .. }) => report.settled += 1,
                            Ok(SettlementOutcome::Skipped(_)) => report.skipped += 1,
                            Err(e) => {
                                warn!(reference = %payment.reference, error = %e, "Verification settle failed");
                                report.errors += 1;
                            }
                        }
                    }
                    GatewayTransactionStatus::Failed => {
                        if self
                            .payments
                            .mark_failed(&payment.reference, "provider reports failure")
                            .await
                            .map_err(db_err)?
                        {
                            report.failed += 1;
                        }
                    }
                    GatewayTransactionStatus::Pending => report.skipped += 1,
                },
                Err(e) => {
                    warn!(reference = %payment.reference, error = %e, "Gateway verification failed");
                    report.errors += 1;
                }
            }
        }

        info!(
            examined = report.examined,
            settled = report.settled,
            failed = report.failed,
            "Pending payment verification sweep finished"
        );

        Ok(report)
    }
}

fn db_err(e: sea_orm::DbErr) -> SettlementError {
    SettlementError::Database(e.to_string())
}
