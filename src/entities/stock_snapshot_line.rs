use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-SKU quantity within one stock snapshot. Duplicate SKU entries in a
/// message are summed before rows are written, so (snapshot, sku) is unique.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_snapshot_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub stock_snapshot_id: i64,
    pub sku: String,
    pub quantity: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_snapshot::Entity",
        from = "Column::StockSnapshotId",
        to = "super::stock_snapshot::Column::Id"
    )]
    Snapshot,
}

impl Related<super::stock_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
