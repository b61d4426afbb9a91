//! The withdrawal workflow.
//!
//! Ordering is the whole point here: the transfer port must accept the
//! transfer before `available` is debited (a rejected transfer must not
//! destroy funds), and a failure after the debit must restore the funds
//! before the withdrawal is marked FAILED. The OTP step decouples the
//! transfer from the verification request — fire-and-continue.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use tixera_core::gateway::{PaymentGateway, TransferStatus};
use tixera_core::notify::{NotificationService, WithdrawalUpdate};
use tixera_core::withdrawal::{
    BankDetails, WithdrawalError, WithdrawalPolicy, WithdrawalStatus,
};
use tixera_db::entities::withdrawals;
use tixera_db::WithdrawalRepository;
use tixera_shared::types::money::Currency;
use tixera_shared::types::{OrganizerId, WithdrawalId};

/// The OTP-gated withdrawal workflow.
#[derive(Clone)]
pub struct WithdrawalService {
    withdrawals: WithdrawalRepository,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn NotificationService>,
    policy: WithdrawalPolicy,
    currency: Currency,
}

impl WithdrawalService {
    /// Creates a withdrawal service.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn NotificationService>,
        policy: WithdrawalPolicy,
        currency: Currency,
    ) -> Self {
        Self {
            withdrawals: WithdrawalRepository::new(db),
            gateway,
            notifier,
            policy,
            currency,
        }
    }

    /// Requests a withdrawal: validates, debits nothing yet, issues an
    /// OTP, and sends it through the notification port.
    ///
    /// # Errors
    ///
    /// Returns the first `WithdrawalError` rule the request violates.
    pub async fn request(
        &self,
        organizer_id: OrganizerId,
        amount: Decimal,
        bank: BankDetails,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        let (model, code) = self
            .withdrawals
            .create_request(
                organizer_id.into_inner(),
                amount,
                &bank,
                &self.policy,
                Utc::now(),
            )
            .await?;

        info!(%organizer_id, withdrawal_id = %model.id, %amount, "Withdrawal requested, OTP issued");

        if let Err(e) = self
            .notifier
            .withdrawal_otp(organizer_id, WithdrawalId::from_uuid(model.id), &code.code)
            .await
        {
            // The organizer can re-request; the code expires on its own.
            warn!(withdrawal_id = %model.id, error = %e, "OTP notification failed");
        }

        Ok(model)
    }

    /// Verifies an OTP submission. On success the withdrawal moves to
    /// PROCESSING and the transfer step runs on a spawned task, decoupled
    /// from the caller's request.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOtp` (retryable) or a terminal cancellation error.
    pub async fn verify_otp(
        &self,
        withdrawal_id: WithdrawalId,
        code: &str,
    ) -> Result<(), WithdrawalError> {
        let model = self
            .withdrawals
            .verify_otp(withdrawal_id.into_inner(), code, &self.policy, Utc::now())
            .await?;

        info!(%withdrawal_id, "OTP verified, dispatching transfer");

        let service = self.clone();
        tokio::spawn(async move {
            service.execute_transfer(model).await;
        });

        Ok(())
    }

    /// Applies an asynchronous transfer confirmation from the provider.
    ///
    /// Success completes the withdrawal and moves the amount into
    /// `withdrawn`; failure compensates the debit and marks FAILED. Both
    /// directions are idempotent under duplicate delivery.
    ///
    /// # Errors
    ///
    /// Returns an error if the database transaction fails.
    pub async fn confirm_transfer(
        &self,
        transfer_ref: &str,
        succeeded: bool,
        reason: Option<&str>,
    ) -> Result<bool, WithdrawalError> {
        let Some(withdrawal) = self.withdrawals.find_by_transfer_ref(transfer_ref).await? else {
            warn!(%transfer_ref, "Transfer confirmation for unknown withdrawal");
            return Ok(false);
        };

        if succeeded {
            let completed = self
                .withdrawals
                .complete_transfer(&withdrawal, Utc::now())
                .await?;
            if completed {
                info!(withdrawal_id = %withdrawal.id, "Withdrawal completed");
                self.notify_status(&withdrawal, WithdrawalStatus::Completed)
                    .await;
            }
            Ok(completed)
        } else {
            let reason = reason.unwrap_or("transfer failed");
            self.withdrawals
                .compensate_failure(&withdrawal, transfer_ref, reason, Utc::now())
                .await?;
            warn!(withdrawal_id = %withdrawal.id, %reason, "Withdrawal failed after debit, funds restored");
            self.notify_status(&withdrawal, WithdrawalStatus::Failed)
                .await;
            Ok(true)
        }
    }

    /// The transfer step: port call first, debit only after acceptance.
    async fn execute_transfer(&self, withdrawal: withdrawals::Model) {
        let bank = BankDetails {
            account_number: withdrawal.account_number.clone(),
            bank_code: withdrawal.bank_code.clone(),
            account_name: withdrawal.account_name.clone(),
        };

        let receipt = match self
            .gateway
            .initiate_transfer(withdrawal.amount, self.currency, &bank)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                // Nothing was debited; the withdrawal just fails.
                warn!(withdrawal_id = %withdrawal.id, error = %e, "Transfer rejected before debit");
                if let Err(mark_err) = self
                    .withdrawals
                    .mark_failed(withdrawal.id, &format!("transfer rejected: {e}"))
                    .await
                {
                    error!(withdrawal_id = %withdrawal.id, error = %mark_err, "Failed to mark withdrawal failed");
                }
                self.notify_status(&withdrawal, WithdrawalStatus::Failed)
                    .await;
                return;
            }
        };

        // The port accepted; debit and record the ledger entry.
        if let Err(e) = self
            .withdrawals
            .debit_for_transfer(&withdrawal, &receipt.reference, Utc::now())
            .await
        {
            // The transfer is in flight at the provider but our debit was
            // refused (e.g. a refund shrank available in between). Leave
            // PROCESSING with the reason visible for manual review.
            error!(
                withdrawal_id = %withdrawal.id,
                transfer_ref = %receipt.reference,
                error = %e,
                "Debit after accepted transfer failed, needs manual review"
            );
            return;
        }

        match receipt.status {
            TransferStatus::Success => {
                match self
                    .withdrawals
                    .complete_transfer(&withdrawal, Utc::now())
                    .await
                {
                    Ok(true) => {
                        info!(withdrawal_id = %withdrawal.id, "Withdrawal completed immediately");
                        self.notify_status(&withdrawal, WithdrawalStatus::Completed)
                            .await;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        error!(withdrawal_id = %withdrawal.id, error = %e, "Completion failed, awaiting confirmation retry");
                    }
                }
            }
            TransferStatus::Pending => {
                info!(
                    withdrawal_id = %withdrawal.id,
                    transfer_ref = %receipt.reference,
                    "Transfer accepted, awaiting asynchronous confirmation"
                );
            }
        }
    }

    /// Best-effort status notification.
    async fn notify_status(&self, withdrawal: &withdrawals::Model, status: WithdrawalStatus) {
        let update = WithdrawalUpdate {
            organizer_id: OrganizerId::from_uuid(withdrawal.organizer_id),
            withdrawal_id: WithdrawalId::from_uuid(withdrawal.id),
            amount: withdrawal.amount,
            status,
        };
        if let Err(e) = self.notifier.withdrawal_update(&update).await {
            warn!(withdrawal_id = %withdrawal.id, error = %e, "Withdrawal notification failed");
        }
    }
}
