use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub sku: String,
    pub name: String,
    /// Manufacturer reference (barcode), forwarded as MANUFACTURERSKU.
    pub reference: Option<String>,
    pub kind: String,
    /// Latest known warehouse stock for this SKU; only ever advanced to a
    /// line from an equally-new or newer snapshot.
    pub stock_snapshot_line_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_bundle_item::Entity")]
    BundleItems,
}

impl Related<super::product_bundle_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BundleItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    Physical,
    Money,
    Bundle,
    SentBySupplier,
}

impl Model {
    pub fn is_bundle(&self) -> bool {
        self.kind == ProductKind::Bundle.to_string()
    }

    /// Money and sent-by-supplier products are fulfilled outside the
    /// warehouse and never appear on outbound payload lines.
    pub fn is_warehouse_fulfilled(&self) -> bool {
        self.kind != ProductKind::Money.to_string()
            && self.kind != ProductKind::SentBySupplier.to_string()
    }
}
