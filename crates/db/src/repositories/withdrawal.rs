//! Withdrawal repository.
//!
//! Owns every withdrawal transaction: the OTP-gated request, the guarded
//! status transitions, the post-acceptance debit, and the compensating
//! restoration when a transfer fails after the debit. The transfer call
//! itself happens in the engine between these units — it is the one piece
//! of the workflow that cannot share a database transaction.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};
use rust_decimal::Decimal;
use tixera_core::ledger::{LedgerError, NewLedgerEntry};
use tixera_core::withdrawal::{otp, BankDetails, OtpCode, WithdrawalError, WithdrawalPolicy};
use tixera_shared::types::{OrganizerId, WithdrawalId};
use uuid::Uuid;

use super::balance::{to_snapshot, BalanceRepository};
use super::ledger::LedgerRepository;
use crate::entities::{sea_orm_active_enums::WithdrawalStatus, withdrawals};

/// Withdrawal repository.
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    db: DatabaseConnection,
    ledger: LedgerRepository,
    balances: BalanceRepository,
}

impl WithdrawalRepository {
    /// Creates a new withdrawal repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            ledger: LedgerRepository::new(db.clone()),
            balances: BalanceRepository::new(db.clone()),
            db,
        }
    }

    /// Finds a withdrawal by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no withdrawal matches.
    pub async fn find_by_id(&self, id: Uuid) -> Result<withdrawals::Model, WithdrawalError> {
        withdrawals::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WithdrawalError::NotFound(WithdrawalId::from_uuid(id)))
    }

    /// Finds a withdrawal by its provider transfer reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_transfer_ref(
        &self,
        transfer_ref: &str,
    ) -> Result<Option<withdrawals::Model>, WithdrawalError> {
        withdrawals::Entity::find()
            .filter(withdrawals::Column::ExternalTransferRef.eq(transfer_ref))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Creates an OTP-gated withdrawal request.
    ///
    /// All checks run against rows read inside the same transaction that
    /// inserts the request: the balance row is locked, so two concurrent
    /// requests cannot both pass the insufficient-funds check, and the
    /// partial unique index backs the single-flight rule if they race
    /// past the status query anyway.
    ///
    /// # Errors
    ///
    /// Returns the first `WithdrawalError` rule the request violates.
    pub async fn create_request(
        &self,
        organizer_id: Uuid,
        amount: Decimal,
        bank: &BankDetails,
        policy: &WithdrawalPolicy,
        now: DateTime<Utc>,
    ) -> Result<(withdrawals::Model, OtpCode), WithdrawalError> {
        bank.validate()?;

        let txn = self.db.begin().await.map_err(db_err)?;

        let account = self
            .balances
            .lock_or_create(&txn, organizer_id)
            .await
            .map_err(db_err)?;

        let active_count = withdrawals::Entity::find()
            .filter(withdrawals::Column::OrganizerId.eq(organizer_id))
            .filter(
                withdrawals::Column::Status
                    .is_in([WithdrawalStatus::Pending, WithdrawalStatus::Processing]),
            )
            .count(&txn)
            .await
            .map_err(db_err)?;

        let first_paid_sale = self
            .ledger
            .first_paid_sale(&txn, organizer_id)
            .await
            .map_err(db_err)?;

        policy.validate_request(
            amount,
            to_snapshot(&account).available,
            active_count > 0,
            first_paid_sale,
            now,
        )?;

        let code = OtpCode::generate();
        let expires_at = now + policy.otp_ttl;

        let model = withdrawals::ActiveModel {
            id: Set(Uuid::now_v7()),
            organizer_id: Set(organizer_id),
            amount: Set(amount),
            status: Set(WithdrawalStatus::Pending),
            otp_hash: Set(code.digest.clone()),
            otp_expires_at: Set(expires_at.into()),
            otp_attempts: Set(0),
            account_number: Set(bank.account_number.clone()),
            bank_code: Set(bank.bank_code.clone()),
            account_name: Set(bank.account_name.clone()),
            external_transfer_ref: Set(None),
            failure_reason: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let inserted = model.insert(&txn).await.map_err(|e| {
            let message = e.to_string();
            if message.contains("uq_withdrawals_active") {
                WithdrawalError::WithdrawalInFlight
            } else {
                WithdrawalError::Database(message)
            }
        })?;

        txn.commit().await.map_err(db_err)?;

        Ok((inserted, code))
    }

    /// Verifies an OTP submission and flips the request to PROCESSING.
    ///
    /// The row is locked for the duration, so concurrent submissions are
    /// serialized: attempts are counted exactly once each, and only one
    /// submission can win the transition. Expired codes and exhausted
    /// attempt budgets cancel the request terminally.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOtp` (retryable), or `OtpExpired` /
    /// `OtpAttemptsExceeded` once the request has been cancelled.
    pub async fn verify_otp(
        &self,
        id: Uuid,
        code: &str,
        policy: &WithdrawalPolicy,
        now: DateTime<Utc>,
    ) -> Result<withdrawals::Model, WithdrawalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let withdrawal = withdrawals::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WithdrawalError::NotFound(WithdrawalId::from_uuid(id)))?;

        if withdrawal.status != WithdrawalStatus::Pending {
            return Err(WithdrawalError::InvalidState {
                expected: "pending",
                found: core_status(&withdrawal.status).to_string(),
            });
        }

        if now > withdrawal.otp_expires_at.with_timezone(&Utc) {
            let mut active: withdrawals::ActiveModel = withdrawal.into();
            active.status = Set(WithdrawalStatus::Failed);
            active.failure_reason = Set(Some("OTP expired".to_string()));
            active.updated_at = Set(now.into());
            active.update(&txn).await.map_err(db_err)?;
            txn.commit().await.map_err(db_err)?;
            return Err(WithdrawalError::OtpExpired);
        }

        let attempts = withdrawal.otp_attempts + 1;
        let otp_hash = withdrawal.otp_hash.clone();

        if otp::verify_code(code, &otp_hash) {
            let mut active: withdrawals::ActiveModel = withdrawal.into();
            active.otp_attempts = Set(attempts);
            active.status = Set(WithdrawalStatus::Processing);
            active.updated_at = Set(now.into());
            let updated = active.update(&txn).await.map_err(db_err)?;
            txn.commit().await.map_err(db_err)?;
            return Ok(updated);
        }

        let exhausted = attempts >= policy.max_otp_attempts;
        let mut active: withdrawals::ActiveModel = withdrawal.into();
        active.otp_attempts = Set(attempts);
        if exhausted {
            active.status = Set(WithdrawalStatus::Failed);
            active.failure_reason = Set(Some("OTP attempts exceeded".to_string()));
        }
        active.updated_at = Set(now.into());
        active.update(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        if exhausted {
            Err(WithdrawalError::OtpAttemptsExceeded)
        } else {
            Err(WithdrawalError::InvalidOtp)
        }
    }

    /// Marks a withdrawal FAILED before any debit happened.
    ///
    /// Returns true if this call performed the transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<bool, WithdrawalError> {
        let result = withdrawals::Entity::update_many()
            .col_expr(
                withdrawals::Column::Status,
                WithdrawalStatus::Failed.as_enum(),
            )
            .col_expr(withdrawals::Column::FailureReason, Expr::value(reason))
            .col_expr(withdrawals::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(withdrawals::Column::Id.eq(id))
            .filter(
                withdrawals::Column::Status
                    .is_in([WithdrawalStatus::Pending, WithdrawalStatus::Processing]),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected == 1)
    }

    /// Debits `available` after the transfer port accepted the transfer.
    ///
    /// One transaction: balance lock, insufficient-funds check against
    /// the locked row, WITHDRAWAL ledger append, bucket write, and the
    /// transfer reference stamp. Re-running for the same transfer
    /// reference is a no-op thanks to the ledger dedup key.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if available shrank since the request
    /// (e.g. a refund posted in between).
    pub async fn debit_for_transfer(
        &self,
        withdrawal: &withdrawals::Model,
        transfer_ref: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WithdrawalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let account = self
            .balances
            .lock_or_create(&txn, withdrawal.organizer_id)
            .await
            .map_err(db_err)?;

        let after = to_snapshot(&account)
            .debit_available(withdrawal.amount)
            .map_err(ledger_err)?;

        let entry = NewLedgerEntry::withdrawal(
            OrganizerId::from_uuid(withdrawal.organizer_id),
            withdrawal.amount,
            WithdrawalId::from_uuid(withdrawal.id),
            transfer_ref.to_string(),
            now,
        );

        match self.ledger.append(&txn, &entry, after).await {
            Ok(_) => {}
            // The debit already happened on an earlier attempt.
            Err(LedgerError::Duplicate(_)) => return Ok(()),
            Err(e) => return Err(ledger_err(e)),
        }

        self.balances
            .write_snapshot(&txn, withdrawal.organizer_id, after)
            .await
            .map_err(db_err)?;

        withdrawals::Entity::update_many()
            .col_expr(
                withdrawals::Column::ExternalTransferRef,
                Expr::value(transfer_ref),
            )
            .col_expr(withdrawals::Column::UpdatedAt, Expr::value(now))
            .filter(withdrawals::Column::Id.eq(withdrawal.id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    /// Completes a withdrawal: PROCESSING -> COMPLETED plus the withdrawn
    /// bucket increment, in one transaction.
    ///
    /// Returns true if this call performed the transition; false means a
    /// duplicate confirmation already did, and nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub async fn complete_transfer(
        &self,
        withdrawal: &withdrawals::Model,
        now: DateTime<Utc>,
    ) -> Result<bool, WithdrawalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let result = withdrawals::Entity::update_many()
            .col_expr(
                withdrawals::Column::Status,
                WithdrawalStatus::Completed.as_enum(),
            )
            .col_expr(withdrawals::Column::UpdatedAt, Expr::value(now))
            .filter(withdrawals::Column::Id.eq(withdrawal.id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Processing))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 1 {
            let account = self
                .balances
                .lock_or_create(&txn, withdrawal.organizer_id)
                .await
                .map_err(db_err)?;
            let after = to_snapshot(&account).complete_withdrawal(withdrawal.amount);
            self.balances
                .write_snapshot(&txn, withdrawal.organizer_id, after)
                .await
                .map_err(db_err)?;
        }

        txn.commit().await.map_err(db_err)?;
        Ok(result.rows_affected == 1)
    }

    /// Compensates a transfer that failed after the debit: restore
    /// `available`, append the reversing WITHDRAWAL credit, and mark the
    /// withdrawal FAILED — all in one transaction. This is a required
    /// rollback, not best-effort.
    ///
    /// Only call this once `debit_for_transfer` has succeeded; failures
    /// before the debit use `mark_failed` instead.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails.
    pub async fn compensate_failure(
        &self,
        withdrawal: &withdrawals::Model,
        transfer_ref: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WithdrawalError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let result = withdrawals::Entity::update_many()
            .col_expr(
                withdrawals::Column::Status,
                WithdrawalStatus::Failed.as_enum(),
            )
            .col_expr(withdrawals::Column::FailureReason, Expr::value(reason))
            .col_expr(withdrawals::Column::UpdatedAt, Expr::value(now))
            .filter(withdrawals::Column::Id.eq(withdrawal.id))
            .filter(withdrawals::Column::Status.eq(WithdrawalStatus::Processing))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 1 {
            let account = self
                .balances
                .lock_or_create(&txn, withdrawal.organizer_id)
                .await
                .map_err(db_err)?;
            let after = to_snapshot(&account).restore_available(withdrawal.amount);

            let entry = NewLedgerEntry::withdrawal_reversal(
                OrganizerId::from_uuid(withdrawal.organizer_id),
                withdrawal.amount,
                WithdrawalId::from_uuid(withdrawal.id),
                transfer_ref,
                now,
            );

            match self.ledger.append(&txn, &entry, after).await {
                Ok(_) => {
                    self.balances
                        .write_snapshot(&txn, withdrawal.organizer_id, after)
                        .await
                        .map_err(db_err)?;
                }
                // An earlier compensation already restored the funds.
                Err(LedgerError::Duplicate(_)) => {}
                Err(e) => return Err(ledger_err(e)),
            }
        }

        txn.commit().await.map_err(db_err)?;
        Ok(())
    }
}

fn db_err(e: DbErr) -> WithdrawalError {
    WithdrawalError::Database(e.to_string())
}

fn ledger_err(e: LedgerError) -> WithdrawalError {
    match e {
        LedgerError::InsufficientFunds {
            requested,
            available,
        } => WithdrawalError::InsufficientFunds {
            requested,
            available,
        },
        other => WithdrawalError::Database(other.to_string()),
    }
}

fn core_status(status: &WithdrawalStatus) -> tixera_core::withdrawal::WithdrawalStatus {
    status.clone().into()
}
