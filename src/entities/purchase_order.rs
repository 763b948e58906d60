use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub supplier_name: String,
    pub status: String,
    pub notes: Option<String>,
    /// Provider-side id, set at most once from the first successful inbound
    /// transmission (or backfilled by a status notice). Join key for all
    /// inbound correlation.
    pub logistics_center_id: Option<String>,
    pub logistics_center_status: Option<String>,
    pub sent_to_logistics_center_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchase_order_line::Entity")]
    Lines,
    #[sea_orm(has_many = "super::inbound_receipt::Entity")]
    Receipts,
}

impl Related<super::purchase_order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::inbound_receipt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receipts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseOrderStatus {
    Pending,
    SentToSupplier,
    Approved,
    Cancelled,
}
