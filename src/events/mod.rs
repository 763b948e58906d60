use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

/// Domain events emitted by the logistics services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    PurchaseOrderApproved(i64),
    PurchaseOrderSubmitted {
        purchase_order_id: i64,
        logistics_center_id: Option<String>,
    },
    OrderDispatched {
        order_id: i64,
        logistics_center_id: Option<String>,
    },
    ReceiptRecorded {
        receipt_id: i64,
        created_lines: usize,
        updated_lines: usize,
    },
    StatusReconciled {
        subject_type: String,
        subject_id: i64,
        status: String,
    },
    ShippingNumberAssigned {
        order_id: i64,
        shipping_number: String,
    },
    SnapshotRecorded {
        snapshot_id: i64,
        line_count: usize,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel. Events are observability signals; processing
/// them must never block or fail the emitting service.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        info!(?event, "domain event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        sender
            .send(Event::PurchaseOrderApproved(7))
            .await
            .expect("send should succeed");
        assert!(matches!(
            rx.recv().await,
            Some(Event::PurchaseOrderApproved(7))
        ));
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::PurchaseOrderApproved(1)).await.is_err());
    }
}
