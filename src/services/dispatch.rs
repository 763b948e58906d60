use std::time::Duration;

use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, instrument};

use crate::bundles;
use crate::config::ProviderConfig;
use crate::entities::{
    employee_group::{self, DeliveryLocation},
    order, product, purchase_order, purchase_order_line,
};
use crate::errors::ServiceError;
use crate::external_id::ExternalIdMapper;
use crate::wire::outbound::{
    Contact, Envelope, Lines, OrderData, OrderLine, PurchaseOrderData,
    PurchaseOrderLine as WirePurchaseOrderLine, ShippingDetail, wire_date, COMPANY_TYPE_CUSTOMER,
    COMPANY_TYPE_VENDOR, INVENTORY_STATUS_AVAILABLE, ORDER_TYPE_CUSTOMER,
    ORDER_TYPE_PURCHASE_ORDER, ROUTE_CARRIER, ROUTE_CUSTOMER,
};
use crate::wire::{strip_quotes, strip_quotes_opt};

/// Provider acknowledgement of an inbound (purchase-order) transmission.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderAck {
    #[serde(rename = "PRIORITYPOID")]
    pub priority_po_id: Option<String>,
    #[serde(rename = "STATUS")]
    pub status: Option<String>,
}

/// Provider acknowledgement of an outbound (customer-order) transmission.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderAck {
    #[serde(rename = "PRIORITY_ORDER_ID")]
    pub priority_order_id: Option<String>,
}

/// An order line joined with its product and, for bundle products, the
/// constituents in declared item order with their per-unit quantities.
#[derive(Debug, Clone)]
pub struct OrderedLine {
    pub quantity: i32,
    pub product: product::Model,
    pub constituents: Vec<(product::Model, i32)>,
}

/// One line of the payload actually shipped to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchLine {
    pub sku: String,
    pub quantity: i32,
    pub description: String,
    pub manufacturer_sku: String,
}

/// Expands bundles and drops products the warehouse does not fulfill
/// (money and sent-by-supplier kinds).
pub fn expand_dispatch_lines(ordered: &[OrderedLine]) -> Vec<DispatchLine> {
    let mut lines = Vec::new();
    for entry in ordered {
        if entry.product.is_bundle() {
            let expanded = bundles::expand_line(
                &entry
                    .constituents
                    .iter()
                    .map(|(p, qty)| bundles::ExpandedLine {
                        product_id: p.id,
                        quantity: *qty,
                    })
                    .collect::<Vec<_>>(),
                entry.quantity,
            );
            for (line, (constituent, _)) in expanded.iter().zip(entry.constituents.iter()) {
                if constituent.is_warehouse_fulfilled() {
                    lines.push(DispatchLine {
                        sku: constituent.sku.clone(),
                        quantity: line.quantity,
                        description: strip_quotes(&constituent.name),
                        manufacturer_sku: strip_quotes_opt(constituent.reference.as_deref()),
                    });
                }
            }
        } else if entry.product.is_warehouse_fulfilled() {
            lines.push(DispatchLine {
                sku: entry.product.sku.clone(),
                quantity: entry.quantity,
                description: strip_quotes(&entry.product.name),
                manufacturer_sku: strip_quotes_opt(entry.product.reference.as_deref()),
            });
        }
    }
    lines
}

/// Bundle description entries for the BUNDLE field, one per ordered bundle
/// unit, in order-line order.
pub fn bundle_entries(ordered: &[OrderedLine]) -> Vec<String> {
    let mut entries = Vec::new();
    for entry in ordered {
        if !entry.product.is_bundle() {
            continue;
        }
        let description = bundles::bundle_entry(
            entry
                .constituents
                .iter()
                .map(|(p, qty)| (p.sku.as_str(), *qty)),
        );
        for _ in 0..entry.quantity {
            entries.push(description.clone());
        }
    }
    entries
}

/// Builds and transmits provider payloads. Transmission failures are results
/// (`None`), never errors: a rejected request is an expected outcome the
/// caller turns into its own retry decision, and no state is mutated here.
#[derive(Debug, Clone)]
pub struct OutboundDispatcher {
    http: Client,
    provider: ProviderConfig,
    mapper: ExternalIdMapper,
}

impl OutboundDispatcher {
    pub fn new(provider: ProviderConfig, mapper: ExternalIdMapper) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(provider.http_timeout_secs))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("failed to build client: {e}")))?;
        Ok(Self {
            http,
            provider,
            mapper,
        })
    }

    pub fn external_id(&self, internal_id: i64) -> String {
        self.mapper.to_external(internal_id)
    }

    /// Sends a purchase order as an inbound shipment expectation. Returns
    /// the provider's acknowledgement on 2xx, `None` otherwise.
    #[instrument(skip(self, purchase_order, lines), fields(purchase_order_id = purchase_order.id))]
    pub async fn send_purchase_order(
        &self,
        purchase_order: &purchase_order::Model,
        lines: &[(purchase_order_line::Model, Option<product::Model>)],
        as_of: DateTime<Tz>,
    ) -> Result<Option<PurchaseOrderAck>, ServiceError> {
        let payload = Envelope::new(PurchaseOrderData {
            consignee: self.provider.consignee.clone(),
            order_id: self.mapper.to_external(purchase_order.id),
            order_type: ORDER_TYPE_PURCHASE_ORDER.to_string(),
            source_company: strip_quotes(&purchase_order.supplier_name),
            company_type: COMPANY_TYPE_VENDOR.to_string(),
            create_date: wire_date(&as_of),
            lines: Lines {
                line: lines
                    .iter()
                    .enumerate()
                    .map(|(i, (line, product))| WirePurchaseOrderLine {
                        order_line: i,
                        reference_ord_line: i,
                        sku: line.product_sku.clone(),
                        qty_ordered: line.quantity_ordered,
                        inventory_status: INVENTORY_STATUS_AVAILABLE.to_string(),
                        sku_description: strip_quotes_opt(
                            product.as_ref().map(|p| p.name.as_str()),
                        ),
                        manufacturer_sku: strip_quotes_opt(
                            product.as_ref().and_then(|p| p.reference.as_deref()),
                        ),
                    })
                    .collect(),
            },
        });

        self.post(&self.provider.inbound_url, &payload, "inbound").await
    }

    /// Sends a customer order as an outbound shipment. Office-delivery
    /// groups ship to the organization's office with the manager as the
    /// secondary contact; everyone else ships to the checkout address.
    #[instrument(skip(self, order, group, ordered), fields(order_id = order.id))]
    pub async fn send_order(
        &self,
        order: &order::Model,
        group: &employee_group::Model,
        ordered: &[OrderedLine],
        as_of: DateTime<Tz>,
    ) -> Result<Option<OrderAck>, ServiceError> {
        let to_office = group.delivery_location == DeliveryLocation::ToOffice.to_string();

        let (contact, delivery_comments, company_name, reference_ord, route) = if to_office {
            (
                Contact {
                    street1: format!(
                        "{} {}",
                        strip_quotes_opt(group.office_street.as_deref()),
                        strip_quotes_opt(group.office_street_number.as_deref()),
                    ),
                    street2: group
                        .office_apartment_number
                        .as_deref()
                        .filter(|s| !s.is_empty())
                        .map(|apartment| format!("Apt {}", strip_quotes(apartment)))
                        .unwrap_or_default(),
                    city: strip_quotes_opt(group.office_city.as_deref()),
                    contact1_name: strip_quotes(&order.full_name),
                    contact2_name: strip_quotes_opt(group.manager_full_name.as_deref()),
                    contact1_phone: strip_quotes_opt(order.phone_number.as_deref()),
                    contact2_phone: strip_quotes_opt(group.manager_phone_number.as_deref()),
                    contact1_email: strip_quotes_opt(order.email.as_deref()),
                    contact2_email: strip_quotes_opt(group.manager_email.as_deref()),
                },
                String::new(),
                strip_quotes_opt(group.organization_name.as_deref()),
                // grouping id so office orders ship together
                self.mapper.to_external(group.id),
                ROUTE_CUSTOMER.to_string(),
            )
        } else {
            (
                Contact {
                    street1: format!(
                        "{} {}",
                        strip_quotes_opt(order.delivery_street.as_deref()),
                        strip_quotes_opt(order.delivery_street_number.as_deref()),
                    ),
                    street2: order
                        .delivery_apartment_number
                        .as_deref()
                        .filter(|s| !s.is_empty())
                        .map(|apartment| format!("Apt {}", strip_quotes(apartment)))
                        .unwrap_or_default(),
                    city: strip_quotes_opt(order.delivery_city.as_deref()),
                    contact1_name: strip_quotes(&order.full_name),
                    contact2_name: strip_quotes(&order.full_name),
                    contact1_phone: strip_quotes_opt(order.phone_number.as_deref()),
                    contact2_phone: strip_quotes_opt(order.additional_phone_number.as_deref()),
                    contact1_email: strip_quotes_opt(order.email.as_deref()),
                    contact2_email: String::new(),
                },
                strip_quotes_opt(order.delivery_additional_details.as_deref()),
                String::new(),
                String::new(),
                ROUTE_CARRIER.to_string(),
            )
        };

        let payload = Envelope::new(OrderData {
            consignee: self.provider.consignee.clone(),
            order_id: order.order_number.clone(),
            order_type: ORDER_TYPE_CUSTOMER.to_string(),
            reference_ord,
            company_name,
            company_type: COMPANY_TYPE_CUSTOMER.to_string(),
            requested_date: wire_date(&as_of),
            create_date: wire_date(&as_of),
            route,
            notes: String::new(),
            shipping_detail: ShippingDetail { delivery_comments },
            contact,
            bundle: bundles::bundle_field(&bundle_entries(ordered)),
            lines: Lines {
                line: expand_dispatch_lines(ordered)
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| OrderLine {
                        order_line: i,
                        reference_ord_line: i,
                        sku: line.sku,
                        qty_original: line.quantity,
                        inventory_status: INVENTORY_STATUS_AVAILABLE.to_string(),
                        sku_description: line.description,
                        manufacturer_sku: line.manufacturer_sku,
                    })
                    .collect(),
            },
        });

        self.post(&self.provider.outbound_url, &payload, "outbound").await
    }

    async fn post<T, A>(
        &self,
        url: &str,
        payload: &Envelope<T>,
        kind: &str,
    ) -> Result<Option<A>, ServiceError>
    where
        T: serde::Serialize,
        A: for<'de> Deserialize<'de>,
    {
        let body = payload.to_bytes()?;

        if self.provider.verbose {
            info!(
                "sending {kind} payload: {}",
                String::from_utf8_lossy(&body)
            );
        }

        let response = match self
            .http
            .post(url)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("failed to send {kind} request: {e}");
                return Ok(None);
            }
        };

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(
                "failed to add or update {kind} with status {status} and response {text}"
            );
            return Ok(None);
        }

        match serde_json::from_str::<A>(&text) {
            Ok(ack) => {
                info!("{kind} added or updated with: {text}");
                Ok(Some(ack))
            }
            Err(_) => {
                error!("failed to add or update {kind} with non-json response: \"{text}\"");
                Ok(None)
            }
        }
    }
}
