use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::{info, instrument, warn};

use crate::entities::{
    inbound_receipt_line::{self, Entity as InboundReceiptLineEntity},
    product::{self, Entity as ProductEntity},
    purchase_order::{self, Entity as PurchaseOrderEntity, PurchaseOrderStatus},
    purchase_order_line::{self, Entity as PurchaseOrderLineEntity},
    purchase_order_sent_log,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::message_queue::{enqueue_job, Job, MessageQueue};
use crate::services::dispatch::OutboundDispatcher;

/// The provider's SKU and MANUFACTURERSKU columns are 22 characters wide.
const PROVIDER_SKU_LIMIT: usize = 22;

/// Purchase-order lifecycle: the one-way approval transition and the
/// worker-side transmission to the logistics center.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db: Arc<DatabaseConnection>,
    dispatcher: Arc<OutboundDispatcher>,
    queue: Arc<dyn MessageQueue>,
    events: EventSender,
    timezone: Tz,
}

impl PurchaseOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        dispatcher: Arc<OutboundDispatcher>,
        queue: Arc<dyn MessageQueue>,
        events: EventSender,
        timezone: Tz,
    ) -> Self {
        Self {
            db,
            dispatcher,
            queue,
            events,
            timezone,
        }
    }

    /// Approves a purchase order and schedules exactly one transmission.
    /// Approval is one-way: re-approving is a validation error, not a no-op,
    /// so double-submission bugs surface instead of silently re-sending.
    #[instrument(skip(self))]
    pub async fn approve(&self, purchase_order_id: i64) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let purchase_order = PurchaseOrderEntity::find_by_id(purchase_order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("purchase order {purchase_order_id} not found"))
            })?;

        if purchase_order.status == PurchaseOrderStatus::Approved.to_string() {
            return Err(ServiceError::InvalidOperation(format!(
                "purchase order {purchase_order_id} is already approved"
            )));
        }

        let lines = PurchaseOrderLineEntity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order_id))
            .all(&txn)
            .await?;

        let mut errors = Vec::new();
        for line in &lines {
            if line.product_sku.len() > PROVIDER_SKU_LIMIT {
                errors.push(format!(
                    "product sku '{}' is too long for the provider",
                    line.product_sku
                ));
            }
            let product = ProductEntity::find()
                .filter(product::Column::Sku.eq(line.product_sku.clone()))
                .one(&txn)
                .await?;
            if let Some(reference) = product.and_then(|p| p.reference) {
                if reference.len() > PROVIDER_SKU_LIMIT {
                    errors.push(format!(
                        "product reference '{reference}' is too long for the provider"
                    ));
                }
            }
        }
        if !errors.is_empty() {
            return Err(ServiceError::ValidationError(errors.join(", ")));
        }

        let mut active: purchase_order::ActiveModel = purchase_order.into();
        active.status = Set(PurchaseOrderStatus::Approved.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        enqueue_job(
            self.queue.as_ref(),
            &Job::SendPurchaseOrder { purchase_order_id },
        )
        .await?;

        let _ = self
            .events
            .send(Event::PurchaseOrderApproved(purchase_order_id))
            .await;

        info!("purchase order {purchase_order_id} approved and queued for transmission");
        Ok(())
    }

    /// Worker-side transmission. A provider rejection raises a retryable
    /// error with no state mutated, so the queue redelivers; on success the
    /// logistics fields and monotonic sent counters advance in one short
    /// transaction.
    #[instrument(skip(self))]
    pub async fn transmit(&self, purchase_order_id: i64) -> Result<(), ServiceError> {
        let purchase_order = PurchaseOrderEntity::find_by_id(purchase_order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("purchase order {purchase_order_id} not found"))
            })?;

        let lines = PurchaseOrderLineEntity::find()
            .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order_id))
            .all(&*self.db)
            .await?;
        if lines.is_empty() {
            warn!("purchase order {purchase_order_id} has no lines, not sending");
            return Ok(());
        }

        let skus: Vec<String> = lines.iter().map(|l| l.product_sku.clone()).collect();
        let products: HashMap<String, product::Model> = ProductEntity::find()
            .filter(product::Column::Sku.is_in(skus))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|p| (p.sku.clone(), p))
            .collect();

        let line_pairs: Vec<(purchase_order_line::Model, Option<product::Model>)> = lines
            .iter()
            .map(|line| (line.clone(), products.get(&line.product_sku).cloned()))
            .collect();

        let as_of = Utc::now();
        let ack = self
            .dispatcher
            .send_purchase_order(&purchase_order, &line_pairs, as_of.with_timezone(&self.timezone))
            .await?;

        let Some(ack) = ack else {
            return Err(ServiceError::ExternalServiceError(format!(
                "provider rejected purchase order {purchase_order_id}"
            )));
        };

        let txn = self.db.begin().await?;

        let had_center_id = purchase_order.logistics_center_id.is_some();
        let mut active: purchase_order::ActiveModel = purchase_order.into();
        active.sent_to_logistics_center_at = Set(Some(as_of));
        if !had_center_id {
            active.logistics_center_id = Set(ack.priority_po_id.clone());
        }
        active.logistics_center_status = Set(ack.status.clone());
        active.updated_at = Set(as_of);
        active.update(&txn).await?;

        for line in lines {
            let quantity_ordered = line.quantity_ordered;
            let quantity_sent = line.quantity_sent_to_logistics_center;
            let mut line_active: purchase_order_line::ActiveModel = line.into();
            line_active.quantity_sent_to_logistics_center =
                Set(quantity_sent + quantity_ordered);
            line_active.update(&txn).await?;
        }

        purchase_order_sent_log::ActiveModel {
            purchase_order_id: Set(purchase_order_id),
            sent_at: Set(as_of),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        let _ = self
            .events
            .send(Event::PurchaseOrderSubmitted {
                purchase_order_id,
                logistics_center_id: ack.priority_po_id,
            })
            .await;

        info!("successfully sent purchase order {purchase_order_id} to logistics center");
        Ok(())
    }

    /// Total quantity the warehouse has confirmed received against one
    /// purchase-order line, derived from receipt lines.
    pub async fn quantity_arrived(
        &self,
        purchase_order_line_id: i64,
    ) -> Result<i64, ServiceError> {
        let receipt_lines = InboundReceiptLineEntity::find()
            .filter(inbound_receipt_line::Column::PurchaseOrderLineId.eq(purchase_order_line_id))
            .all(&*self.db)
            .await?;
        Ok(receipt_lines
            .iter()
            .map(|line| i64::from(line.quantity_received))
            .sum())
    }
}
