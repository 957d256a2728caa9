//! # Carpark Core - availability model and publishing pipeline
//!
//! This crate holds everything about a carpark ingestion run that does not
//! touch the network directly: the decoded response model, the message key,
//! the error taxonomy, the publisher loop and the delivery-report drain.
//!
//! ## Key Components
//!
//! - **Model**: `ResultSet` → `Snapshot` → `CarparkRecord` → `LotInfo`
//! - **Seams**: [`Fetcher`] for the HTTP side, [`RecordSink`] for the broker side
//! - **Publisher**: one message per carpark record of the first snapshot
//! - **Delivery**: report channel plus a drain task joined at shutdown
//! - **Configuration**: [`IngestSpec`] layered from defaults, file and env
//!
//! ## Example Usage
//!
//! ```rust
//! use carpark_core::{report_channel, spawn_drain, ResultSet};
//!
//! # async fn example() -> Result<(), carpark_core::IngestError> {
//! let body = br#"{"items":[{"timestamp":"t1","carpark_data":[]}]}"#;
//! let result = ResultSet::decode(body)?;
//! let snapshot = result.first_snapshot()?;
//!
//! let (tx, rx) = report_channel();
//! let drain = spawn_drain(rx);
//! // a RecordSink owning `tx` would be built and published to here
//! drop(tx);
//! let stats = drain.await.expect("drain task panicked");
//! assert_eq!(stats.delivered, snapshot.carpark_data.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::time::Duration;

pub mod delivery;
pub mod error;
pub mod model;
pub mod publish;
pub mod spec;

pub use delivery::{
    drain_reports, report_channel, spawn_drain, DeliveryReport, DeliveryStats, ReportRx, ReportTx,
};
pub use error::{BoxError, IngestError, Result};
pub use model::{CarparkRecord, LotInfo, ResultSet, Snapshot, KEY_TIME_FORMAT};
pub use publish::{PublishSummary, Publisher};
pub use spec::IngestSpec;

/// Source of the raw availability response
///
/// ## Examples
/// - HTTP GET against the public endpoint
/// - A canned body in tests
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the full response body.
    async fn fetch(&self) -> Result<Vec<u8>>;
}

/// Destination for keyed messages
///
/// `enqueue` hands a message to the client and returns without waiting for
/// the broker. Delivery outcomes are reported out of band through the
/// connection's [`ReportTx`]; dropping the sink closes that channel.
pub trait RecordSink {
    /// Queue one message for `topic`.
    fn enqueue(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()>;

    /// Wait until every queued message is resolved or `timeout` elapses.
    fn flush(&self, timeout: Duration) -> Result<()>;
}
