//! `SeaORM` Entity for the ledger_entries table.
//!
//! Append-only: rows are inserted once and never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::LedgerEntryType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub credit: Decimal,
    pub debit: Decimal,
    pub net_amount: Decimal,
    pub ticket_id: Option<Uuid>,
    pub withdrawal_id: Option<Uuid>,
    pub external_ref: Option<String>,
    pub value_date: DateTimeWithTimeZone,
    pub pending_balance_after: Decimal,
    pub available_balance_after: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tickets::Entity",
        from = "Column::TicketId",
        to = "super::tickets::Column::Id"
    )]
    Tickets,
    #[sea_orm(
        belongs_to = "super::withdrawals::Entity",
        from = "Column::WithdrawalId",
        to = "super::withdrawals::Column::Id"
    )]
    Withdrawals,
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tickets.def()
    }
}

impl Related<super::withdrawals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Withdrawals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
