//! Delivery reports and the task that drains them.
//!
//! The producer connection owns the sending half of the report channel.
//! Once the connection is closed the channel closes, the drain loop ends and
//! the task resolves to the final [`DeliveryStats`].

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub type ReportTx = mpsc::UnboundedSender<DeliveryReport>;
pub type ReportRx = mpsc::UnboundedReceiver<DeliveryReport>;

/// Outcome of one previously enqueued message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    /// The broker committed the message.
    Delivered {
        topic: String,
        partition: i32,
        offset: i64,
        key: Option<String>,
    },
    /// The broker (or client, after exhausting retries) gave up on it.
    Failed {
        topic: String,
        partition: i32,
        key: Option<String>,
        error: String,
    },
}

/// Running totals kept by the drain task
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryStats {
    pub fn record(&mut self, report: &DeliveryReport) {
        match report {
            DeliveryReport::Delivered { .. } => self.delivered += 1,
            DeliveryReport::Failed { .. } => self.failed += 1,
        }
    }
}

pub fn report_channel() -> (ReportTx, ReportRx) {
    mpsc::unbounded_channel()
}

/// Log every report until all senders are gone.
///
/// A failed delivery is logged and counted; it never stops the loop.
pub async fn drain_reports(mut rx: ReportRx) -> DeliveryStats {
    let mut stats = DeliveryStats::default();
    while let Some(report) = rx.recv().await {
        match &report {
            DeliveryReport::Delivered {
                topic,
                partition,
                offset,
                ..
            } => {
                info!(
                    "Successfully produced record to topic {} partition [{}] @ offset {}",
                    topic, partition, offset
                );
            }
            DeliveryReport::Failed {
                topic,
                partition,
                key,
                error,
            } => {
                error!(
                    "Failed to deliver message {:?} to {} [{}]: {}",
                    key, topic, partition, error
                );
            }
        }
        stats.record(&report);
    }
    stats
}

/// Start the drain task. Await the handle after closing the producer.
pub fn spawn_drain(rx: ReportRx) -> JoinHandle<DeliveryStats> {
    tokio::spawn(drain_reports(rx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivered(offset: i64) -> DeliveryReport {
        DeliveryReport::Delivered {
            topic: "carpark-availability".into(),
            partition: 0,
            offset,
            key: Some(format!("k{offset}")),
        }
    }

    #[tokio::test]
    async fn failed_report_does_not_stop_the_drain() {
        let (tx, rx) = report_channel();
        let handle = spawn_drain(rx);

        tx.send(delivered(0)).unwrap();
        tx.send(DeliveryReport::Failed {
            topic: "carpark-availability".into(),
            partition: -1,
            key: Some("k1".into()),
            error: "Message timed out".into(),
        })
        .unwrap();
        tx.send(delivered(1)).unwrap();
        tx.send(delivered(2)).unwrap();
        drop(tx);

        let stats = handle.await.unwrap();
        assert_eq!(
            stats,
            DeliveryStats {
                delivered: 3,
                failed: 1
            }
        );
    }

    #[tokio::test]
    async fn drain_ends_when_every_sender_is_dropped() {
        let (tx, rx) = report_channel();
        let other = tx.clone();
        let handle = spawn_drain(rx);

        other.send(delivered(7)).unwrap();
        drop(other);
        assert!(!handle.is_finished());

        drop(tx);
        let stats = handle.await.unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed, 0);
    }
}
