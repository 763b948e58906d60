pub mod dispatch;
pub mod orders;
pub mod purchase_orders;
pub mod reconciler;
pub mod snapshots;
