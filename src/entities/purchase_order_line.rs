use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub purchase_order_id: i64,
    pub product_sku: String,
    pub quantity_ordered: i32,
    /// Monotonic counter, appended on each successful transmission.
    pub quantity_sent_to_logistics_center: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id"
    )]
    PurchaseOrder,
    #[sea_orm(has_many = "super::inbound_receipt_line::Entity")]
    ReceiptLines,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::inbound_receipt_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReceiptLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
