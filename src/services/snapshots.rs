use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::instrument;

use crate::entities::{
    product,
    stock_snapshot::{self, Entity as StockSnapshotEntity},
    stock_snapshot_line::{self, Entity as StockSnapshotLineEntity},
};
use crate::errors::ServiceError;

/// Durable append-only log of provider stock snapshots plus the per-product
/// "latest known stock" pointer. The pointer is monotonic by snapshot time;
/// everything else is plain persistence.
#[derive(Clone)]
pub struct SnapshotStore {
    db: Arc<DatabaseConnection>,
}

impl SnapshotStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persists a snapshot with its lines in one transaction. Every call
    /// creates a new snapshot row; history is never merged.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn append(
        &self,
        snapshot_at: DateTime<Utc>,
        lines: &[(String, i32)],
    ) -> Result<(stock_snapshot::Model, Vec<stock_snapshot_line::Model>), ServiceError> {
        let txn = self.db.begin().await?;

        let snapshot = stock_snapshot::ActiveModel {
            snapshot_at: Set(snapshot_at),
            processed_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut inserted = Vec::with_capacity(lines.len());
        for (sku, quantity) in lines {
            let line = stock_snapshot_line::ActiveModel {
                stock_snapshot_id: Set(snapshot.id),
                sku: Set(sku.clone()),
                quantity: Set(*quantity),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted.push(line);
        }

        txn.commit().await?;
        Ok((snapshot, inserted))
    }

    /// The snapshot line a product's pointer currently references, with the
    /// owning snapshot's time.
    pub async fn latest_pointer_for(
        &self,
        product: &product::Model,
    ) -> Result<Option<(stock_snapshot_line::Model, DateTime<Utc>)>, ServiceError> {
        let Some(line_id) = product.stock_snapshot_line_id else {
            return Ok(None);
        };
        let Some(line) = StockSnapshotLineEntity::find_by_id(line_id)
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };
        let snapshot = StockSnapshotEntity::find_by_id(line.stock_snapshot_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "snapshot line {} has no parent snapshot",
                    line.id
                ))
            })?;
        Ok(Some((line, snapshot.snapshot_at)))
    }

    /// Points the product at `candidate_line_id` when the candidate snapshot
    /// is at least as new as the one currently referenced. An older snapshot
    /// arriving late never moves the pointer backward.
    pub async fn advance_pointer(
        &self,
        product: product::Model,
        candidate_line_id: i64,
        candidate_snapshot_at: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        if let Some((_, current_snapshot_at)) = self.latest_pointer_for(&product).await? {
            if candidate_snapshot_at < current_snapshot_at {
                return Ok(false);
            }
        }

        let mut active: product::ActiveModel = product.into();
        active.stock_snapshot_line_id = Set(Some(candidate_line_id));
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;
        Ok(true)
    }

    /// All lines of one snapshot, for reporting and tests.
    pub async fn lines_of(
        &self,
        snapshot_id: i64,
    ) -> Result<Vec<stock_snapshot_line::Model>, ServiceError> {
        Ok(StockSnapshotLineEntity::find()
            .filter(stock_snapshot_line::Column::StockSnapshotId.eq(snapshot_id))
            .all(&*self.db)
            .await?)
    }
}
