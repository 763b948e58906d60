use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;

use crate::errors::ServiceError;

pub const ORDER_TYPE_PURCHASE_ORDER: &str = "PO";
pub const ORDER_TYPE_CUSTOMER: &str = "CUSTOMER";
pub const COMPANY_TYPE_VENDOR: &str = "VENDOR";
pub const COMPANY_TYPE_CUSTOMER: &str = "CUSTOMER";
pub const INVENTORY_STATUS_AVAILABLE: &str = "AVAILABLE";
/// Office (grouped) deliveries are routed by the customer organization.
pub const ROUTE_CUSTOMER: &str = "CUSTOMER";
/// Home deliveries go out with the provider's carrier.
pub const ROUTE_CARRIER: &str = "CARRIER";

/// Dates on the wire are provider-local calendar days.
pub fn wire_date(as_of: &DateTime<Tz>) -> String {
    as_of.format("%d-%m-%Y").to_string()
}

/// Outer envelope shared by every payload the provider accepts.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T: Serialize> {
    #[serde(rename = "DATACOLLECTION")]
    pub datacollection: DataCollection<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataCollection<T: Serialize> {
    #[serde(rename = "DATA")]
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            datacollection: DataCollection { data },
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ServiceError> {
        serde_json::to_vec(self)
            .map_err(|e| ServiceError::InternalError(format!("failed to encode payload: {e}")))
    }
}

/// Purchase-order (inbound shipment expectation) payload.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderData {
    #[serde(rename = "CONSIGNEE")]
    pub consignee: String,
    #[serde(rename = "ORDERID")]
    pub order_id: String,
    #[serde(rename = "ORDERTYPE")]
    pub order_type: String,
    #[serde(rename = "SOURCECOMPANY")]
    pub source_company: String,
    #[serde(rename = "COMPANYTYPE")]
    pub company_type: String,
    #[serde(rename = "CREATEDATE")]
    pub create_date: String,
    #[serde(rename = "LINES")]
    pub lines: Lines<PurchaseOrderLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderLine {
    #[serde(rename = "ORDERLINE")]
    pub order_line: usize,
    #[serde(rename = "REFERENCEORDLINE")]
    pub reference_ord_line: usize,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "QTYORDERED")]
    pub qty_ordered: i32,
    #[serde(rename = "INVENTORYSTATUS")]
    pub inventory_status: String,
    #[serde(rename = "SKUDESCRIPTION")]
    pub sku_description: String,
    #[serde(rename = "MANUFACTURERSKU")]
    pub manufacturer_sku: String,
}

/// Customer-order (outbound shipment) payload.
#[derive(Debug, Clone, Serialize)]
pub struct OrderData {
    #[serde(rename = "CONSIGNEE")]
    pub consignee: String,
    #[serde(rename = "ORDERID")]
    pub order_id: String,
    #[serde(rename = "ORDERTYPE")]
    pub order_type: String,
    #[serde(rename = "REFERENCEORD")]
    pub reference_ord: String,
    #[serde(rename = "COMPANYNAME")]
    pub company_name: String,
    #[serde(rename = "COMPANYTYPE")]
    pub company_type: String,
    #[serde(rename = "REQUESTEDDATE")]
    pub requested_date: String,
    #[serde(rename = "CREATEDATE")]
    pub create_date: String,
    #[serde(rename = "ROUTE")]
    pub route: String,
    #[serde(rename = "NOTES")]
    pub notes: String,
    #[serde(rename = "SHIPPINGDETAIL")]
    pub shipping_detail: ShippingDetail,
    #[serde(rename = "CONTACT")]
    pub contact: Contact,
    #[serde(rename = "BUNDLE")]
    pub bundle: String,
    #[serde(rename = "LINES")]
    pub lines: Lines<OrderLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShippingDetail {
    #[serde(rename = "DELIVERYCOMMENTS")]
    pub delivery_comments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    #[serde(rename = "STREET1")]
    pub street1: String,
    #[serde(rename = "STREET2")]
    pub street2: String,
    #[serde(rename = "CITY")]
    pub city: String,
    #[serde(rename = "CONTACT1NAME")]
    pub contact1_name: String,
    #[serde(rename = "CONTACT2NAME")]
    pub contact2_name: String,
    #[serde(rename = "CONTACT1PHONE")]
    pub contact1_phone: String,
    #[serde(rename = "CONTACT2PHONE")]
    pub contact2_phone: String,
    #[serde(rename = "CONTACT1EMAIL")]
    pub contact1_email: String,
    #[serde(rename = "CONTACT2EMAIL")]
    pub contact2_email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    #[serde(rename = "ORDERLINE")]
    pub order_line: usize,
    #[serde(rename = "REFERENCEORDLINE")]
    pub reference_ord_line: usize,
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "QTYORIGINAL")]
    pub qty_original: i32,
    #[serde(rename = "INVENTORYSTATUS")]
    pub inventory_status: String,
    #[serde(rename = "SKUDESCRIPTION")]
    pub sku_description: String,
    #[serde(rename = "MANUFACTURERSKU")]
    pub manufacturer_sku: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lines<L: Serialize> {
    #[serde(rename = "LINE")]
    pub line: Vec<L>,
}
