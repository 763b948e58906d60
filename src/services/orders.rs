use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use tracing::{info, instrument, warn};

use crate::entities::{
    employee_group::Entity as EmployeeGroupEntity,
    order::{self, Entity as OrderEntity, OrderStatus},
    order_line::{self, Entity as OrderLineEntity},
    product::Entity as ProductEntity,
    product_bundle_item::{self, Entity as ProductBundleItemEntity},
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::message_queue::{enqueue_job, Job, MessageQueue};
use crate::services::dispatch::{expand_dispatch_lines, OrderedLine, OutboundDispatcher};

/// Customer-order dispatch: the placement trigger and the worker-side
/// transmission to the logistics center.
#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    dispatcher: Arc<OutboundDispatcher>,
    queue: Arc<dyn MessageQueue>,
    events: EventSender,
    timezone: Tz,
}

impl OrderService {
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

    /// Schedules exactly one transmission for a pending order. Called once
    /// per qualifying placement; redelivery is the queue's business.
    #[instrument(skip(self))]
    pub async fn place(&self, order_id: i64) -> Result<(), ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;

        if order.status != OrderStatus::Pending.to_string() {
            return Err(ServiceError::InvalidOperation(format!(
                "order {order_id} is not pending"
            )));
        }

        enqueue_job(self.queue.as_ref(), &Job::SendOrder { order_id }).await?;
        info!("order {order_id} queued for transmission");
        Ok(())
    }

    /// Worker-side transmission. Orders that left the pending state or that
    /// contain nothing the warehouse fulfills are skipped successfully; a
    /// provider rejection raises a retryable error with no state mutated.
    #[instrument(skip(self))]
    pub async fn transmit(&self, order_id: i64) -> Result<(), ServiceError> {
        let order = OrderEntity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("order {order_id} not found")))?;

        if order.status != OrderStatus::Pending.to_string() {
            warn!("order {order_id} is no longer pending, not sending to logistics center");
            return Ok(());
        }

        let group = EmployeeGroupEntity::find_by_id(order.employee_group_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "employee group {} for order {order_id} not found",
                    order.employee_group_id
                ))
            })?;

        let ordered = self.load_ordered_lines(order_id).await?;
        if expand_dispatch_lines(&ordered).is_empty() {
            warn!(
                "order {order_id} only contains products fulfilled outside the warehouse, \
                 not sending to logistics center"
            );
            return Ok(());
        }

        let as_of = Utc::now();
        let ack = self
            .dispatcher
            .send_order(&order, &group, &ordered, as_of.with_timezone(&self.timezone))
            .await?;

        let Some(ack) = ack else {
            return Err(ServiceError::ExternalServiceError(format!(
                "provider rejected order {order_id}"
            )));
        };

        let txn = self.db.begin().await?;
        let had_center_id = order.logistics_center_id.is_some();
        let mut active: order::ActiveModel = order.into();
        active.status = Set(OrderStatus::SentToLogisticCenter.to_string());
        if !had_center_id {
            active.logistics_center_id = Set(ack.priority_order_id.clone());
        }
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        txn.commit().await?;

        let _ = self
            .events
            .send(Event::OrderDispatched {
                order_id,
                logistics_center_id: ack.priority_order_id,
            })
            .await;

        info!("successfully sent order {order_id} to logistics center");
        Ok(())
    }

    /// Loads order lines with their products and, for bundles, constituents
    /// in declared item order.
    async fn load_ordered_lines(&self, order_id: i64) -> Result<Vec<OrderedLine>, ServiceError> {
        let lines = OrderLineEntity::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .order_by_asc(order_line::Column::Id)
            .all(&*self.db)
            .await?;

        let mut ordered = Vec::with_capacity(lines.len());
        for line in lines {
            let product = ProductEntity::find_by_id(line.product_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "product {} on order {order_id} not found",
                        line.product_id
                    ))
                })?;

            let mut constituents = Vec::new();
            if product.is_bundle() {
                let items = ProductBundleItemEntity::find()
                    .filter(product_bundle_item::Column::BundleId.eq(product.id))
                    .order_by_asc(product_bundle_item::Column::Id)
                    .all(&*self.db)
                    .await?;
                for item in items {
                    let constituent = ProductEntity::find_by_id(item.product_id)
                        .one(&*self.db)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "bundle constituent {} not found",
                                item.product_id
                            ))
                        })?;
                    constituents.push((constituent, item.quantity));
                }
            }

            ordered.push(OrderedLine {
                quantity: line.quantity,
                product,
                constituents,
            });
        }
        Ok(ordered)
    }
}
