//! Ledger entry repository.
//!
//! Entries are append-only. `append` runs inside the caller's transaction
//! so no entry can exist without the balance change it justifies, and
//! vice versa. Duplicate appends are skips, not failures: webhook retries
//! and overlapping verification sweeps are the normal case here.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tixera_core::ledger::{BalanceSnapshot, DedupKey, LedgerError, NewLedgerEntry};
use uuid::Uuid;

use crate::entities::{ledger_entries, sea_orm_active_enums::LedgerEntryType};

/// Ledger entry repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry inside the caller's transaction.
    ///
    /// `balances_after` is the snapshot the same transaction is about to
    /// persist; it is denormalized onto the entry for auditability.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Duplicate` when the dedup key matches an
    /// existing entry — callers treat this as a no-op skip.
    pub async fn append(
        &self,
        txn: &DatabaseTransaction,
        entry: &NewLedgerEntry,
        balances_after: BalanceSnapshot,
    ) -> Result<ledger_entries::Model, LedgerError> {
        entry.validate()?;

        if let Some(key) = entry.dedup_key() {
            if self
                .dedup_exists(txn, entry.organizer_id.into_inner(), &key)
                .await
                .map_err(db_err)?
            {
                return Err(LedgerError::Duplicate(describe_key(&key)));
            }
        }

        let model = ledger_entries::ActiveModel {
            id: Set(Uuid::now_v7()),
            organizer_id: Set(entry.organizer_id.into_inner()),
            entry_type: Set(entry.entry_type.into()),
            credit: Set(entry.credit),
            debit: Set(entry.debit),
            net_amount: Set(entry.net_amount()),
            ticket_id: Set(entry.ticket_id.map(tixera_shared::types::TicketId::into_inner)),
            withdrawal_id: Set(entry
                .withdrawal_id
                .map(tixera_shared::types::WithdrawalId::into_inner)),
            external_ref: Set(entry.external_ref.clone()),
            value_date: Set(entry.value_date.into()),
            pending_balance_after: Set(balances_after.pending),
            available_balance_after: Set(balances_after.available),
            created_at: Set(Utc::now().into()),
        };

        model.insert(txn).await.map_err(|e| {
            // A racing append lost to the partial unique index.
            let message = e.to_string();
            if message.contains("uq_ledger") {
                LedgerError::Duplicate(message)
            } else {
                LedgerError::Database(message)
            }
        })
    }

    /// Checks whether an entry with the given dedup key already exists.
    async fn dedup_exists(
        &self,
        txn: &DatabaseTransaction,
        organizer_id: Uuid,
        key: &DedupKey,
    ) -> Result<bool, DbErr> {
        let query = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::OrganizerId.eq(organizer_id));

        let query = match key {
            DedupKey::ExternalRef(external_ref) => {
                query.filter(ledger_entries::Column::ExternalRef.eq(external_ref))
            }
            DedupKey::TicketAction {
                ticket_id,
                entry_type,
            } => query
                .filter(ledger_entries::Column::TicketId.eq(ticket_id.into_inner()))
                .filter(
                    ledger_entries::Column::EntryType.eq(LedgerEntryType::from(*entry_type)),
                )
                .filter(ledger_entries::Column::ExternalRef.is_null()),
        };

        Ok(query.count(txn).await? > 0)
    }

    /// Finds the value date of the organizer's earliest paid sale.
    ///
    /// Free tickets never produce entries, so any SALE row here has a
    /// positive net amount; the filter keeps the intent explicit anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn first_paid_sale<C: ConnectionTrait>(
        &self,
        conn: &C,
        organizer_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>, DbErr> {
        let entry = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::OrganizerId.eq(organizer_id))
            .filter(ledger_entries::Column::EntryType.eq(LedgerEntryType::Sale))
            .filter(ledger_entries::Column::NetAmount.gt(Decimal::ZERO))
            .order_by_asc(ledger_entries::Column::ValueDate)
            .one(conn)
            .await?;

        Ok(entry.map(|e| e.value_date.into()))
    }

    /// Sums SALE credits valued at or before the maturity cutoff.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn matured_sale_credits<C: ConnectionTrait>(
        &self,
        conn: &C,
        organizer_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<Decimal, DbErr> {
        let total: Option<Option<Decimal>> = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::OrganizerId.eq(organizer_id))
            .filter(ledger_entries::Column::EntryType.eq(LedgerEntryType::Sale))
            .filter(ledger_entries::Column::ValueDate.lte(cutoff))
            .select_only()
            .column_as(ledger_entries::Column::Credit.sum(), "total")
            .into_tuple()
            .one(conn)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Sums REFUND and CHARGEBACK debits for an organizer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn compensating_debits<C: ConnectionTrait>(
        &self,
        conn: &C,
        organizer_id: Uuid,
    ) -> Result<Decimal, DbErr> {
        let total: Option<Option<Decimal>> = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::OrganizerId.eq(organizer_id))
            .filter(
                ledger_entries::Column::EntryType
                    .is_in([LedgerEntryType::Refund, LedgerEntryType::Chargeback]),
            )
            .select_only()
            .column_as(ledger_entries::Column::Debit.sum(), "total")
            .into_tuple()
            .one(conn)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    /// Lists an organizer's entries in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn entries_for(
        &self,
        organizer_id: Uuid,
    ) -> Result<Vec<ledger_entries::Model>, DbErr> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::OrganizerId.eq(organizer_id))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await
    }
}

fn describe_key(key: &DedupKey) -> String {
    match key {
        DedupKey::ExternalRef(external_ref) => format!("external ref {external_ref}"),
        DedupKey::TicketAction {
            ticket_id,
            entry_type,
        } => format!("{entry_type} for ticket {ticket_id}"),
    }
}

fn db_err(e: DbErr) -> LedgerError {
    LedgerError::Database(e.to_string())
}
