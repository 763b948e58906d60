use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Point-in-time stock report from the provider. Every snapshot message
/// persists its own row; rows are never merged, even at equal times.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub snapshot_at: DateTime<Utc>,
    pub processed_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_snapshot_line::Entity")]
    Lines,
}

impl Related<super::stock_snapshot_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
