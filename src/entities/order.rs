use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Customer (employee) order. Checkout details are snapshotted onto the row
/// at placement so dispatch does not depend on mutable profile data.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub order_number: String,
    pub employee_group_id: i64,
    pub status: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub additional_phone_number: Option<String>,
    pub email: Option<String>,
    pub delivery_street: Option<String>,
    pub delivery_street_number: Option<String>,
    pub delivery_apartment_number: Option<String>,
    pub delivery_city: Option<String>,
    pub delivery_additional_details: Option<String>,
    /// Provider-side id, set once from the first successful outbound
    /// transmission. Join key for inbound order correlation.
    pub logistics_center_id: Option<String>,
    pub logistics_center_status: Option<String>,
    pub logistics_center_shipping_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_line::Entity")]
    Lines,
    #[sea_orm(
        belongs_to = "super::employee_group::Entity",
        from = "Column::EmployeeGroupId",
        to = "super::employee_group::Column::Id"
    )]
    EmployeeGroup,
}

impl Related<super::order_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl Related<super::employee_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmployeeGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Incomplete,
    Pending,
    Cancelled,
    SentToLogisticCenter,
    Complete,
}
