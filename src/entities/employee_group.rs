use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Delivery-side snapshot of the campaign employee group an order belongs
/// to. Office-delivery groups route shipments to the organization's office
/// with the organization manager as the secondary contact.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "employee_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub delivery_location: String,
    pub office_street: Option<String>,
    pub office_street_number: Option<String>,
    pub office_apartment_number: Option<String>,
    pub office_city: Option<String>,
    pub organization_name: Option<String>,
    pub manager_full_name: Option<String>,
    pub manager_phone_number: Option<String>,
    pub manager_email: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryLocation {
    ToHome,
    ToOffice,
}
