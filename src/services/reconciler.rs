use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use tracing::{info, instrument};

use crate::config::ProviderConfig;
use crate::entities::{
    inbound_receipt::{self, Entity as InboundReceiptEntity},
    inbound_receipt_line::{self, Entity as InboundReceiptLineEntity},
    inbound_status_event::{self, Entity as InboundStatusEventEntity, StatusSubject},
    order::{self, Entity as OrderEntity},
    product::Entity as ProductEntity,
    purchase_order::{self, Entity as PurchaseOrderEntity},
    purchase_order_line::{self, Entity as PurchaseOrderLineEntity},
    raw_message::{Entity as RawMessageEntity, MessageType},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::external_id::ExternalIdMapper;
use crate::services::snapshots::SnapshotStore;
use crate::wire::inbound::{
    OrderStatusNotice, PurchaseOrderStatusNotice, ReceiptNotice, ShipOrderNotice, SnapshotNotice,
};
use crate::wire::{InboundNotice, WireCodec};

/// The inbound state machine: consumes one persisted raw message and applies
/// it to purchase orders, orders, receipts, and stock.
///
/// Every handler is idempotent against its raw message id. The queue
/// delivers at least once with no cross-message ordering, so correctness
/// rests on business-key upserts, event-time last-write-wins for statuses,
/// and snapshot-time monotonic pointers rather than on arrival order.
/// Unresolvable references and malformed bodies propagate as retryable
/// errors; swallowing them would permanently desynchronize fulfillment
/// state.
#[derive(Clone)]
pub struct MessageReconciler {
    db: Arc<DatabaseConnection>,
    codec: WireCodec,
    mapper: ExternalIdMapper,
    snapshots: SnapshotStore,
    events: EventSender,
}

impl MessageReconciler {
    pub fn new(
        db: Arc<DatabaseConnection>,
        provider: &ProviderConfig,
        events: EventSender,
    ) -> Self {
        Self {
            codec: WireCodec::new(provider.timezone()),
            mapper: ExternalIdMapper::new(provider.id_prefix.clone()),
            snapshots: SnapshotStore::new(db.clone()),
            db,
            events,
        }
    }

    /// Single entry point; runs one message to completion or raises for the
    /// queue's retry machinery.
    #[instrument(skip(self))]
    pub async fn process(&self, raw_message_id: i64) -> Result<(), ServiceError> {
        let message = RawMessageEntity::find_by_id(raw_message_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ReferenceNotFound(format!("raw message {raw_message_id} not found"))
            })?;

        let message_type = MessageType::from_str(&message.message_type).map_err(|_| {
            ServiceError::MalformedMessage(format!(
                "unknown message type '{}'",
                message.message_type
            ))
        })?;

        let notice =
            self.codec
                .decode_inbound(message_type, &message.raw_body, message.received_at)?;

        match notice {
            InboundNotice::Receipt(receipt) => self.handle_receipt(&message, receipt).await?,
            InboundNotice::PurchaseOrderStatus(status) => {
                self.handle_purchase_order_status(&message, status).await?
            }
            InboundNotice::OrderStatus(status) => {
                self.handle_order_status(&message, status).await?
            }
            InboundNotice::ShipOrder(ship) => self.handle_ship_order(&message, ship).await?,
            InboundNotice::Snapshot(snapshot) => self.handle_snapshot(&message, snapshot).await?,
        }

        info!("successfully processed logistics center message {raw_message_id}");
        Ok(())
    }

    /// Receipt headers are upserted by receipt code and committed before
    /// lines, so a line-level failure leaves the header in place and a retry
    /// converges on the same end state.
    async fn handle_receipt(
        &self,
        message: &crate::entities::raw_message::Model,
        notice: ReceiptNotice,
    ) -> Result<(), ServiceError> {
        let purchase_order = PurchaseOrderEntity::find()
            .filter(purchase_order::Column::LogisticsCenterId.eq(notice.provider_po_id.clone()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ReferenceNotFound(format!(
                    "no purchase order with logistics center id {}",
                    notice.provider_po_id
                ))
            })?;

        let existing = InboundReceiptEntity::find()
            .filter(inbound_receipt::Column::ReceiptCode.eq(notice.receipt_code.clone()))
            .one(&*self.db)
            .await?;

        let (receipt, receipt_created) = match existing {
            Some(model) => {
                let mut active: inbound_receipt::ActiveModel = model.into();
                active.purchase_order_id = Set(purchase_order.id);
                active.receipt_start_at = Set(notice.start_time);
                active.receipt_close_at = Set(notice.close_time);
                active.updated_at = Set(Utc::now());
                (active.update(&*self.db).await?, false)
            }
            None => {
                let now = Utc::now();
                let active = inbound_receipt::ActiveModel {
                    receipt_code: Set(notice.receipt_code.clone()),
                    purchase_order_id: Set(purchase_order.id),
                    receipt_start_at: Set(notice.start_time),
                    receipt_close_at: Set(notice.close_time),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                };
                (active.insert(&*self.db).await?, true)
            }
        };

        let mut created_lines = 0usize;
        let mut updated_lines = 0usize;

        for line in &notice.lines {
            let purchase_order_line = PurchaseOrderLineEntity::find()
                .filter(purchase_order_line::Column::PurchaseOrderId.eq(purchase_order.id))
                .filter(purchase_order_line::Column::ProductSku.eq(line.sku.clone()))
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ReferenceNotFound(format!(
                        "purchase order {} has no line for sku {}",
                        purchase_order.id, line.sku
                    ))
                })?;

            let existing_line = InboundReceiptLineEntity::find()
                .filter(inbound_receipt_line::Column::ReceiptId.eq(receipt.id))
                .filter(inbound_receipt_line::Column::LineNumber.eq(line.line_number))
                .one(&*self.db)
                .await?;

            match existing_line {
                Some(model) => {
                    let mut active: inbound_receipt_line::ActiveModel = model.into();
                    active.purchase_order_line_id = Set(purchase_order_line.id);
                    active.quantity_received = Set(line.quantity_received);
                    active.source_message_id = Set(message.id);
                    active.update(&*self.db).await?;
                    updated_lines += 1;
                }
                None => {
                    inbound_receipt_line::ActiveModel {
                        receipt_id: Set(receipt.id),
                        line_number: Set(line.line_number),
                        purchase_order_line_id: Set(purchase_order_line.id),
                        quantity_received: Set(line.quantity_received),
                        source_message_id: Set(message.id),
                        ..Default::default()
                    }
                    .insert(&*self.db)
                    .await?;
                    created_lines += 1;
                }
            }
        }

        let _ = self
            .events
            .send(Event::ReceiptRecorded {
                receipt_id: receipt.id,
                created_lines,
                updated_lines,
            })
            .await;

        info!(
            "successfully processed inbound receipt message with {} receipt, \
             {created_lines} created and {updated_lines} updated receipt lines",
            if receipt_created { "created" } else { "updated" },
        );
        Ok(())
    }

    async fn handle_purchase_order_status(
        &self,
        message: &crate::entities::raw_message::Model,
        notice: PurchaseOrderStatusNotice,
    ) -> Result<(), ServiceError> {
        let mut purchase_order = PurchaseOrderEntity::find()
            .filter(purchase_order::Column::LogisticsCenterId.eq(notice.provider_po_id.clone()))
            .one(&*self.db)
            .await?;

        // the transmission ack may have been lost; fall back to the echoed
        // ORDERID and backfill the provider id below
        if purchase_order.is_none() {
            if let Some(internal_id) = notice
                .reference_id
                .as_deref()
                .and_then(|reference| self.mapper.from_external(reference))
            {
                purchase_order = PurchaseOrderEntity::find_by_id(internal_id)
                    .one(&*self.db)
                    .await?;
            }
        }

        let purchase_order = purchase_order.ok_or_else(|| {
            ServiceError::ReferenceNotFound(format!(
                "no purchase order for provider id {}",
                notice.provider_po_id
            ))
        })?;

        let txn = self.db.begin().await?;
        let (_created, reflected) = self
            .record_status_event(
                &txn,
                StatusSubject::PurchaseOrder,
                purchase_order.id,
                &notice.status,
                notice.event_time,
                message.id,
            )
            .await?;

        let purchase_order_id = purchase_order.id;
        let had_center_id = purchase_order.logistics_center_id.is_some();
        let mut active: purchase_order::ActiveModel = purchase_order.into();
        active.logistics_center_status = Set(Some(reflected.status.clone()));
        if !had_center_id {
            active.logistics_center_id = Set(Some(notice.provider_po_id.clone()));
        }
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        let _ = self
            .events
            .send(Event::StatusReconciled {
                subject_type: StatusSubject::PurchaseOrder.to_string(),
                subject_id: purchase_order_id,
                status: reflected.status,
            })
            .await;

        info!("successfully processed purchase order status change message");
        Ok(())
    }

    async fn handle_order_status(
        &self,
        message: &crate::entities::raw_message::Model,
        notice: OrderStatusNotice,
    ) -> Result<(), ServiceError> {
        let order = self.find_order(&notice.provider_order_id).await?;

        let txn = self.db.begin().await?;
        let (_created, reflected) = self
            .record_status_event(
                &txn,
                StatusSubject::Order,
                order.id,
                &notice.status,
                notice.event_time,
                message.id,
            )
            .await?;

        let order_id = order.id;
        let mut active: order::ActiveModel = order.into();
        active.logistics_center_status = Set(Some(reflected.status.clone()));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        let _ = self
            .events
            .send(Event::StatusReconciled {
                subject_type: StatusSubject::Order.to_string(),
                subject_id: order_id,
                status: reflected.status,
            })
            .await;

        info!("successfully processed order status change message");
        Ok(())
    }

    /// The shipping number applies unconditionally, independent of the
    /// status-time ordering rule: a stale notice can still carry the only
    /// copy of the shipping number we will ever see.
    async fn handle_ship_order(
        &self,
        message: &crate::entities::raw_message::Model,
        notice: ShipOrderNotice,
    ) -> Result<(), ServiceError> {
        let order = self.find_order(&notice.provider_order_id).await?;

        let txn = self.db.begin().await?;
        let reflected = match &notice.status {
            Some(status) => Some(
                self.record_status_event(
                    &txn,
                    StatusSubject::Order,
                    order.id,
                    status,
                    notice.event_time,
                    message.id,
                )
                .await?
                .1,
            ),
            None => self.latest_status_event(&txn, StatusSubject::Order, order.id).await?,
        };

        let order_id = order.id;
        let mut active: order::ActiveModel = order.into();
        if let Some(reflected) = &reflected {
            active.logistics_center_status = Set(Some(reflected.status.clone()));
        }
        active.logistics_center_shipping_number = Set(Some(notice.shipping_number.clone()));
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        let _ = self
            .events
            .send(Event::ShippingNumberAssigned {
                order_id,
                shipping_number: notice.shipping_number,
            })
            .await;

        info!("successfully processed ship order message");
        Ok(())
    }

    /// Every snapshot message persists a fresh snapshot row. Duplicate SKUs
    /// within one message are summed first; products referenced by the lines
    /// have their latest-stock pointer advanced monotonically.
    async fn handle_snapshot(
        &self,
        _message: &crate::entities::raw_message::Model,
        notice: SnapshotNotice,
    ) -> Result<(), ServiceError> {
        let mut seen_order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, i32> = HashMap::new();
        for line in &notice.lines {
            match totals.get_mut(&line.sku) {
                Some(total) => *total += line.quantity,
                None => {
                    seen_order.push(line.sku.clone());
                    totals.insert(line.sku.clone(), line.quantity);
                }
            }
        }
        let aggregated: Vec<(String, i32)> = seen_order
            .into_iter()
            .map(|sku| {
                let quantity = totals[&sku];
                (sku, quantity)
            })
            .collect();

        let (snapshot, lines) = self.snapshots.append(notice.snapshot_time, &aggregated).await?;

        for line in &lines {
            let product = ProductEntity::find()
                .filter(crate::entities::product::Column::Sku.eq(line.sku.clone()))
                .one(&*self.db)
                .await?;
            // unknown SKUs are persisted for history but have no pointer to move
            if let Some(product) = product {
                self.snapshots
                    .advance_pointer(product, line.id, snapshot.snapshot_at)
                    .await?;
            }
        }

        let _ = self
            .events
            .send(Event::SnapshotRecorded {
                snapshot_id: snapshot.id,
                line_count: lines.len(),
            })
            .await;

        info!(
            "successfully processed snapshot message with {} stock lines",
            lines.len()
        );
        Ok(())
    }

    async fn find_order(&self, provider_order_id: &str) -> Result<order::Model, ServiceError> {
        OrderEntity::find()
            .filter(order::Column::LogisticsCenterId.eq(provider_order_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ReferenceNotFound(format!(
                    "no order with logistics center id {provider_order_id}"
                ))
            })
    }

    /// Appends a status event unless an identical (subject, status, time)
    /// row exists, then returns the event currently reflected for the
    /// subject: greatest event time, first-applied winning ties. Runs inside
    /// the caller's subject-scoped transaction so concurrent workers cannot
    /// lose the compare-and-reflect.
    async fn record_status_event(
        &self,
        txn: &DatabaseTransaction,
        subject_type: StatusSubject,
        subject_id: i64,
        status: &str,
        event_time: DateTime<Utc>,
        source_message_id: i64,
    ) -> Result<(bool, inbound_status_event::Model), ServiceError> {
        let existing = InboundStatusEventEntity::find()
            .filter(inbound_status_event::Column::SubjectType.eq(subject_type.to_string()))
            .filter(inbound_status_event::Column::SubjectId.eq(subject_id))
            .filter(inbound_status_event::Column::Status.eq(status))
            .filter(inbound_status_event::Column::StatusEventTime.eq(event_time))
            .one(txn)
            .await?;

        let created = if existing.is_none() {
            inbound_status_event::ActiveModel {
                subject_type: Set(subject_type.to_string()),
                subject_id: Set(subject_id),
                status: Set(status.to_string()),
                status_event_time: Set(event_time),
                source_message_id: Set(source_message_id),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            true
        } else {
            false
        };

        let reflected = self
            .latest_status_event(txn, subject_type, subject_id)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "no status events for {subject_type} {subject_id} after insert"
                ))
            })?;

        Ok((created, reflected))
    }

    async fn latest_status_event(
        &self,
        txn: &DatabaseTransaction,
        subject_type: StatusSubject,
        subject_id: i64,
    ) -> Result<Option<inbound_status_event::Model>, ServiceError> {
        Ok(InboundStatusEventEntity::find()
            .filter(inbound_status_event::Column::SubjectType.eq(subject_type.to_string()))
            .filter(inbound_status_event::Column::SubjectId.eq(subject_id))
            .order_by_desc(inbound_status_event::Column::StatusEventTime)
            .order_by_asc(inbound_status_event::Column::Id)
            .one(txn)
            .await?)
    }
}
