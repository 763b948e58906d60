pub mod employee_group;
pub mod inbound_receipt;
pub mod inbound_receipt_line;
pub mod inbound_status_event;
pub mod order;
pub mod order_line;
pub mod product;
pub mod product_bundle_item;
pub mod purchase_order;
pub mod purchase_order_line;
pub mod purchase_order_sent_log;
pub mod raw_message;
pub mod stock_snapshot;
pub mod stock_snapshot_line;
