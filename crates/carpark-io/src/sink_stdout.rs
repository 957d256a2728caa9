use carpark_core::{RecordSink, Result};
use std::time::Duration;
use tracing::info;

/// Dry-run sink: prints `key<TAB>payload` instead of producing.
///
/// No broker connection and no delivery reports.
#[derive(Debug, Default)]
pub struct StdoutRecordSink;

impl StdoutRecordSink {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSink for StdoutRecordSink {
    fn enqueue(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        info!("DRY RUN: would send {} to topic '{}'", key, topic);
        println!("{}\t{}", key, String::from_utf8_lossy(payload));
        Ok(())
    }

    fn flush(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }
}
