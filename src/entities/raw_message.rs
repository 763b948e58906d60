use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Immutable record of a single inbound provider delivery. Created once per
/// webhook call or queue push; reconciliation re-reads it on every attempt.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "raw_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub center: String,
    pub message_type: String,
    #[sea_orm(column_type = "Text")]
    pub raw_body: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Message types the provider delivers, stored by name on the raw message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    InboundReceipt,
    InboundStatusChange,
    OrderStatusChange,
    ShipOrder,
    Snapshot,
}

impl MessageType {
    /// Maps the `type` field of a webhook payload to a message type.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw {
            "inboundReceipt" => Some(Self::InboundReceipt),
            "inboundStatusChange" => Some(Self::InboundStatusChange),
            "orderStatusChange" => Some(Self::OrderStatusChange),
            "shipOrder" | "orderShippingStatusChange" => Some(Self::ShipOrder),
            "snapshot" => Some(Self::Snapshot),
            _ => None,
        }
    }
}
