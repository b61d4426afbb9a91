//! The Tixera settlement engine.
//!
//! This crate exposes the operations the CRUD layer and admin tooling
//! consume: settle a payment confirmation, handle a webhook, re-verify
//! pending payments, run the maturity sweep, request and confirm
//! withdrawals, post refunds and chargebacks, and check tickets in.
//!
//! Everything is wired through explicit constructor injection so the
//! recovery and replay paths use exactly the same ports and logic as the
//! primary settlement path.

pub mod checkin;
pub mod maturity;
pub mod refunds;
pub mod settlement;
pub mod withdrawal;

use std::sync::Arc;

use chrono::Duration;
use sea_orm::DatabaseConnection;
use tixera_core::gateway::PaymentGateway;
use tixera_core::ledger::BalanceSnapshot;
use tixera_core::notify::NotificationService;
use tixera_core::settlement::FeePolicy;
use tixera_core::withdrawal::WithdrawalPolicy;
use tixera_db::BalanceRepository;
use tixera_shared::types::OrganizerId;
use tixera_shared::{AppConfig, AppError};

pub use checkin::CheckInGuard;
pub use maturity::{MaturitySweep, SweepReport};
pub use refunds::{RefundOutcome, RefundService};
pub use settlement::{SettlementEngine, VerifyReport};
pub use withdrawal::WithdrawalService;

/// The fully wired settlement core.
#[derive(Clone)]
pub struct Engine {
    /// Settlement of payment confirmations and webhooks.
    pub settlements: SettlementEngine,
    /// The OTP-gated withdrawal workflow.
    pub withdrawals: WithdrawalService,
    /// The atomic check-in guard.
    pub checkin: CheckInGuard,
    /// The maturity sweep.
    pub sweep: MaturitySweep,
    /// Refund and chargeback posting.
    pub refunds: RefundService,
    balances: BalanceRepository,
}

impl Engine {
    /// Wires the engine from a database connection, the external ports,
    /// and configuration.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationService>,
        config: &AppConfig,
    ) -> Self {
        let fees = FeePolicy::new(config.fees.platform_fee_percent);
        let policy = WithdrawalPolicy {
            minimum_amount: config.withdrawal.minimum_amount,
            otp_ttl: Duration::seconds(i64::try_from(config.withdrawal.otp_ttl_secs).unwrap_or(600)),
            max_otp_attempts: config.withdrawal.max_otp_attempts,
        };

        let sweep = MaturitySweep::new(db.clone());

        Self {
            settlements: SettlementEngine::new(
                db.clone(),
                Arc::clone(&gateway),
                Arc::clone(&notifier),
                fees,
                config.gateway.webhook_secret.clone(),
            ),
            withdrawals: WithdrawalService::new(
                db.clone(),
                gateway,
                notifier,
                policy,
                config.currency,
            ),
            checkin: CheckInGuard::new(db.clone()),
            refunds: RefundService::new(db.clone()),
            sweep,
            balances: BalanceRepository::new(db),
        }
    }

    /// Reads an organizer's balance buckets.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_balance(&self, organizer_id: OrganizerId) -> Result<BalanceSnapshot, AppError> {
        self.balances
            .snapshot(organizer_id.into_inner())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
