use chrono::{DateTime, Local};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::Snapshot;
use crate::RecordSink;

/// What one publish pass did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishSummary {
    /// Messages handed to the sink
    pub enqueued: usize,
    /// Records dropped under `continue_on_error`
    pub skipped: usize,
}

/// Publishes every carpark record of a snapshot as one message
///
/// Records are enqueued in snapshot order. Enqueue does not wait for the
/// broker; outcomes arrive later as delivery reports.
pub struct Publisher<S> {
    sink: S,
    topic: String,
    continue_on_error: bool,
}

impl<S: RecordSink> Publisher<S> {
    pub fn new(sink: S, topic: impl Into<String>) -> Self {
        Self {
            sink,
            topic: topic.into(),
            continue_on_error: false,
        }
    }

    /// Skip records that fail to serialize or enqueue instead of aborting.
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Enqueue the snapshot, keying each record by the local wall clock.
    pub fn publish(&self, snapshot: &Snapshot) -> Result<PublishSummary> {
        self.publish_with_clock(snapshot, Local::now)
    }

    /// Enqueue the snapshot, reading `clock` once per record for its key.
    pub fn publish_with_clock<F>(&self, snapshot: &Snapshot, clock: F) -> Result<PublishSummary>
    where
        F: Fn() -> DateTime<Local>,
    {
        let mut summary = PublishSummary::default();

        for record in &snapshot.carpark_data {
            let key = record.message_key(&clock());
            let sent = record
                .to_json()
                .and_then(|payload| self.sink.enqueue(&self.topic, &key, &payload));

            match sent {
                Ok(()) => {
                    debug!("Enqueued {} for topic {}", key, self.topic);
                    summary.enqueued += 1;
                }
                Err(e) if self.continue_on_error => {
                    warn!("Skipping carpark {}: {}", record.carpark_number, e);
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Enqueued {} records for topic {} ({} skipped)",
            summary.enqueued, self.topic, summary.skipped
        );
        Ok(summary)
    }

    /// Block until every queued message is resolved or `timeout` elapses.
    pub fn flush(&self, timeout: Duration) -> Result<()> {
        self.sink.flush(timeout)
    }

    /// Hand the sink back so the caller can close it.
    pub fn into_sink(self) -> S {
        self.sink
    }
}
