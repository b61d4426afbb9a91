//! `SeaORM` Entity for the withdrawals table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::WithdrawalStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "withdrawals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub amount: Decimal,
    pub status: WithdrawalStatus,
    pub otp_hash: String,
    pub otp_expires_at: DateTimeWithTimeZone,
    pub otp_attempts: i32,
    pub account_number: String,
    pub bank_code: String,
    pub account_name: String,
    pub external_transfer_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
