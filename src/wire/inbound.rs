use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::entities::raw_message::MessageType;
use crate::errors::ServiceError;

const PROVIDER_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// A decoded inbound message, one variant per provider message type.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundNotice {
    Receipt(ReceiptNotice),
    PurchaseOrderStatus(PurchaseOrderStatusNotice),
    OrderStatus(OrderStatusNotice),
    ShipOrder(ShipOrderNotice),
    Snapshot(SnapshotNotice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptNotice {
    pub receipt_code: String,
    /// Provider-side purchase-order id (the logistics-center join key).
    pub provider_po_id: String,
    pub start_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub lines: Vec<ReceiptNoticeLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptNoticeLine {
    pub line_number: i32,
    pub sku: String,
    pub quantity_received: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOrderStatusNotice {
    pub provider_po_id: String,
    /// The ORDERID we originally transmitted, when echoed back. Used to
    /// locate purchase orders whose transmission ack was lost.
    pub reference_id: Option<String>,
    pub status: String,
    pub event_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatusNotice {
    pub provider_order_id: String,
    pub status: String,
    pub event_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShipOrderNotice {
    pub provider_order_id: String,
    pub shipping_number: String,
    /// Ship notices may arrive without a status; the shipping number still
    /// applies.
    pub status: Option<String>,
    pub event_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotNotice {
    pub snapshot_time: DateTime<Utc>,
    pub lines: Vec<SnapshotNoticeLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotNoticeLine {
    pub sku: String,
    pub quantity: i32,
}

/// Decodes raw message bodies into typed notices. Status-change and
/// ship-order notices are reported by the provider at send time, so their
/// event time is the moment we received the message; receipts and snapshots
/// carry explicit provider-local timestamps.
#[derive(Debug, Clone)]
pub struct WireCodec {
    timezone: Tz,
}

impl WireCodec {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn decode_inbound(
        &self,
        message_type: MessageType,
        raw_body: &str,
        received_at: DateTime<Utc>,
    ) -> Result<InboundNotice, ServiceError> {
        let body: Value = serde_json::from_str(raw_body)
            .map_err(|e| ServiceError::MalformedMessage(format!("body is not JSON: {e}")))?;
        let data = body
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| ServiceError::MalformedMessage("missing 'data' object".into()))?;

        match message_type {
            MessageType::InboundReceipt => {
                let lines_raw = data
                    .get("LINES")
                    .and_then(|l| l.get("LINE"))
                    .ok_or_else(|| ServiceError::MalformedMessage("missing LINES.LINE".into()))?;
                // a single-line receipt arrives as a bare object, not an array
                let line_values: Vec<&Value> = match lines_raw {
                    Value::Array(items) => items.iter().collect(),
                    single => vec![single],
                };
                let mut lines = Vec::with_capacity(line_values.len());
                for line in line_values {
                    lines.push(ReceiptNoticeLine {
                        line_number: int_field(line, "RECEIPTLINE")?,
                        sku: str_field(line, "SKU")?,
                        quantity_received: int_field(line, "QTYRECEIVED")?,
                    });
                }

                Ok(InboundNotice::Receipt(ReceiptNotice {
                    receipt_code: str_field_obj(data, "RECEIPT")?,
                    provider_po_id: str_field_obj(data, "PRIORITYPOID")?,
                    start_time: self.parse_datetime(&str_field_obj(data, "STARTRECEIPTDATE")?)?,
                    close_time: match opt_str_field(data, "CLOSERECEIPTDATE") {
                        Some(raw) => Some(self.parse_datetime(&raw)?),
                        None => None,
                    },
                    lines,
                }))
            }
            MessageType::InboundStatusChange => {
                Ok(InboundNotice::PurchaseOrderStatus(PurchaseOrderStatusNotice {
                    provider_po_id: str_field_obj(data, "PRIORITYPOID")?,
                    reference_id: opt_str_field(data, "ORDERID"),
                    status: str_field_obj(data, "STATUS")?,
                    event_time: received_at,
                }))
            }
            MessageType::OrderStatusChange => Ok(InboundNotice::OrderStatus(OrderStatusNotice {
                provider_order_id: str_field_obj(data, "ORDERID")?,
                status: str_field_obj(data, "STATUS")?,
                event_time: received_at,
            })),
            MessageType::ShipOrder => Ok(InboundNotice::ShipOrder(ShipOrderNotice {
                provider_order_id: str_field_obj(data, "ORDERID")?,
                shipping_number: str_field_obj(data, "SHIPNU")?,
                status: opt_str_field(data, "SHIPPING_STATUS"),
                event_time: received_at,
            })),
            MessageType::Snapshot => {
                let lines_raw = data
                    .get("lines")
                    .and_then(Value::as_array)
                    .ok_or_else(|| ServiceError::MalformedMessage("missing 'lines' array".into()))?;
                let mut lines = Vec::with_capacity(lines_raw.len());
                for line in lines_raw {
                    lines.push(SnapshotNoticeLine {
                        sku: str_field(line, "sku")?,
                        quantity: int_field(line, "quantity")?,
                    });
                }

                Ok(InboundNotice::Snapshot(SnapshotNotice {
                    snapshot_time: self
                        .parse_datetime(&str_field_obj(data, "snapshotDateTime")?)?,
                    lines,
                }))
            }
        }
    }

    /// Parses the provider's `%m/%d/%Y %H:%M:%S` timestamps. An explicit
    /// trailing offset is honored; otherwise the value is localized in the
    /// configured provider zone.
    fn parse_datetime(&self, raw: &str) -> Result<DateTime<Utc>, ServiceError> {
        if let Ok(with_offset) =
            DateTime::parse_from_str(raw, &format!("{PROVIDER_DATETIME_FORMAT} %z"))
        {
            return Ok(with_offset.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(raw, PROVIDER_DATETIME_FORMAT)
            .map_err(|e| ServiceError::MalformedMessage(format!("bad datetime '{raw}': {e}")))?;
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                ServiceError::MalformedMessage(format!("datetime '{raw}' has no local meaning"))
            })
    }
}

fn str_field(value: &Value, key: &str) -> Result<String, ServiceError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ServiceError::MalformedMessage(format!("missing key '{key}'")))
}

fn str_field_obj(
    data: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<String, ServiceError> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ServiceError::MalformedMessage(format!("missing key '{key}'")))
}

fn opt_str_field(data: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Integer fields arrive as numbers or numeric strings ("3", "3.0");
/// fractional parts are truncated.
fn int_field(value: &Value, key: &str) -> Result<i32, ServiceError> {
    let field = value
        .get(key)
        .ok_or_else(|| ServiceError::MalformedMessage(format!("missing key '{key}'")))?;
    let parsed = match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(|f| f.trunc() as i32)
        .ok_or_else(|| ServiceError::MalformedMessage(format!("non-numeric value for '{key}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> WireCodec {
        WireCodec::new("Asia/Jerusalem".parse().unwrap())
    }

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn decodes_receipt_with_line_array() {
        let body = serde_json::json!({
            "type": "inboundReceipt",
            "data": {
                "RECEIPT": "RCP-77",
                "PRIORITYPOID": "PO-900",
                "STARTRECEIPTDATE": "08/05/2026 10:15:00 +0300",
                "LINES": {"LINE": [
                    {"RECEIPTLINE": 1, "SKU": "1", "QTYRECEIVED": "2.0"},
                    {"RECEIPTLINE": "2", "SKU": "5", "QTYRECEIVED": 4},
                ]},
            },
        });

        let notice = codec()
            .decode_inbound(MessageType::InboundReceipt, &body.to_string(), received())
            .unwrap();
        let InboundNotice::Receipt(receipt) = notice else {
            panic!("expected receipt notice");
        };
        assert_eq!(receipt.receipt_code, "RCP-77");
        assert_eq!(receipt.provider_po_id, "PO-900");
        assert_eq!(
            receipt.start_time,
            Utc.with_ymd_and_hms(2026, 8, 5, 7, 15, 0).unwrap()
        );
        assert_eq!(receipt.close_time, None);
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].quantity_received, 2);
        assert_eq!(receipt.lines[1].line_number, 2);
    }

    #[test]
    fn single_receipt_line_object_is_accepted() {
        let body = serde_json::json!({
            "data": {
                "RECEIPT": "RCP-1",
                "PRIORITYPOID": "PO-1",
                "STARTRECEIPTDATE": "08/05/2026 10:15:00",
                "LINES": {"LINE": {"RECEIPTLINE": 1, "SKU": "1", "QTYRECEIVED": 1}},
            },
        });

        let notice = codec()
            .decode_inbound(MessageType::InboundReceipt, &body.to_string(), received())
            .unwrap();
        let InboundNotice::Receipt(receipt) = notice else {
            panic!("expected receipt notice");
        };
        assert_eq!(receipt.lines.len(), 1);
        // zone-less timestamp localized as provider-local (UTC+3 in summer)
        assert_eq!(
            receipt.start_time,
            Utc.with_ymd_and_hms(2026, 8, 5, 7, 15, 0).unwrap()
        );
    }

    #[test]
    fn missing_key_is_a_malformed_message() {
        let body = serde_json::json!({"data": {"STATUS": "DELIVERED"}});
        let err = codec()
            .decode_inbound(MessageType::OrderStatusChange, &body.to_string(), received())
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedMessage(_)));
    }

    #[test]
    fn missing_data_object_is_a_malformed_message() {
        let err = codec()
            .decode_inbound(MessageType::Snapshot, "{\"type\":\"snapshot\"}", received())
            .unwrap_err();
        assert!(matches!(err, ServiceError::MalformedMessage(_)));
    }

    #[test]
    fn ship_order_status_is_optional() {
        let body = serde_json::json!({
            "data": {"ORDERID": "LC-5", "SHIPNU": "SHIP-123"},
        });
        let notice = codec()
            .decode_inbound(MessageType::ShipOrder, &body.to_string(), received())
            .unwrap();
        let InboundNotice::ShipOrder(ship) = notice else {
            panic!("expected ship notice");
        };
        assert_eq!(ship.shipping_number, "SHIP-123");
        assert_eq!(ship.status, None);
        assert_eq!(ship.event_time, received());
    }

    #[test]
    fn snapshot_lines_decode_with_string_quantities() {
        let body = serde_json::json!({
            "data": {
                "snapshotDateTime": "08/05/2026 06:00:00",
                "lines": [
                    {"sku": "1", "quantity": "3.0"},
                    {"sku": "1", "quantity": 2},
                ],
            },
        });
        let notice = codec()
            .decode_inbound(MessageType::Snapshot, &body.to_string(), received())
            .unwrap();
        let InboundNotice::Snapshot(snapshot) = notice else {
            panic!("expected snapshot notice");
        };
        // duplicates are preserved here; aggregation is the reconciler's job
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines[0].quantity, 3);
    }
}
