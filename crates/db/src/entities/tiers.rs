//! `SeaORM` Entity for the tiers table.
//!
//! Tier CRUD belongs to the marketplace layer; settlement only reads the
//! price/fee columns and performs the guarded seat decrement.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "tiers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub buyer_pays_fee: bool,
    pub capacity: i32,
    pub sold: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
