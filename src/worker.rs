use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::ServiceError;
use crate::message_queue::{Job, Message, MessageQueue, LOGISTICS_TOPIC};
use crate::services::{
    orders::OrderService, purchase_orders::PurchaseOrderService, reconciler::MessageReconciler,
};

const IDLE_POLL: Duration = Duration::from_millis(250);

/// Executes one queue job against the owning service.
#[derive(Clone)]
pub struct JobRunner {
    pub reconciler: Arc<MessageReconciler>,
    pub purchase_orders: Arc<PurchaseOrderService>,
    pub orders: Arc<OrderService>,
}

impl JobRunner {
    pub async fn run(&self, job: &Job) -> Result<(), ServiceError> {
        match job {
            Job::ProcessMessage { raw_message_id } => {
                self.reconciler.process(*raw_message_id).await
            }
            Job::SendPurchaseOrder { purchase_order_id } => {
                self.purchase_orders.transmit(*purchase_order_id).await
            }
            Job::SendOrder { order_id } => self.orders.transmit(*order_id).await,
        }
    }
}

/// Spawns the worker pool. Each worker drains jobs to completion; retryable
/// failures are re-published with exponential backoff until the attempt
/// budget runs out, then dead-lettered with an error log.
pub fn spawn_workers(
    queue: Arc<dyn MessageQueue>,
    runner: JobRunner,
    count: usize,
    max_retries: u32,
    base_backoff: Duration,
) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|worker_id| {
            let queue = queue.clone();
            let runner = runner.clone();
            tokio::spawn(async move {
                info!("logistics worker {worker_id} started");
                loop {
                    let message = match queue.subscribe(LOGISTICS_TOPIC).await {
                        Ok(Some(message)) => message,
                        Ok(None) => {
                            tokio::time::sleep(IDLE_POLL).await;
                            continue;
                        }
                        Err(e) => {
                            error!("worker {worker_id} failed to poll queue: {e}");
                            tokio::time::sleep(IDLE_POLL).await;
                            continue;
                        }
                    };
                    handle_message(&queue, &runner, message, max_retries, base_backoff).await;
                }
            })
        })
        .collect()
}

/// Runs a single dequeued message through the job runner and applies the
/// retry policy. Exposed for tests.
pub async fn handle_message(
    queue: &Arc<dyn MessageQueue>,
    runner: &JobRunner,
    message: Message,
    max_retries: u32,
    base_backoff: Duration,
) {
    let job: Job = match serde_json::from_value(message.payload.clone()) {
        Ok(job) => job,
        Err(e) => {
            error!("dead-lettering undecodable job payload: {e}");
            let _ = queue.ack(&message.id).await;
            return;
        }
    };

    match runner.run(&job).await {
        Ok(()) => {
            let _ = queue.ack(&message.id).await;
        }
        Err(err) if err.is_retryable() && message.retry_count < max_retries => {
            let _ = queue.nack(&message.id).await;
            let delay = backoff_delay(base_backoff, message.retry_count);
            warn!(
                "job {job:?} failed on attempt {}, retrying in {delay:?}: {err}",
                message.retry_count + 1
            );
            let queue = queue.clone();
            let mut retry = message;
            retry.retry_count += 1;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = queue.publish(retry).await {
                    error!("failed to re-publish job for retry: {e}");
                }
            });
        }
        Err(err) => {
            error!(
                "dead-lettering job {job:?} after {} attempts: {err}",
                message.retry_count + 1
            );
            let _ = queue.ack(&message.id).await;
        }
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let base = Duration::from_secs(30);
        assert_eq!(backoff_delay(base, 0), Duration::from_secs(30));
        assert_eq!(backoff_delay(base, 1), Duration::from_secs(60));
        assert_eq!(backoff_delay(base, 3), Duration::from_secs(240));
    }
}
