//! # Carpark Ingest - one-shot availability to Kafka bridge
//!
//! Fetches the current carpark availability snapshot, decodes it and sends
//! one Kafka message per carpark of the first snapshot, then flushes, closes
//! the producer and exits.
//!
//! ## Usage Examples
//!
//! ```bash
//! # Stock run: public endpoint, localhost:9092, topic carpark-availability
//! carpark-ingest
//!
//! # Different cluster and topic
//! carpark-ingest -b broker1:9092,broker2:9092 -t carparks
//!
//! # Settings from a file, CARPARK_* env vars layered on top
//! carpark-ingest --config ingest.yaml
//!
//! # Print the messages instead of producing them
//! carpark-ingest --dry-run
//! ```

use anyhow::{Context, Result};
use carpark_core::{
    report_channel, spawn_drain, DeliveryStats, Fetcher, IngestSpec, Publisher, ResultSet,
};
use carpark_io::fetch_http::HttpFetcher;
use carpark_io::sink_kafka::KafkaRecordSink;
use carpark_io::sink_stdout::StdoutRecordSink;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(
    name = "carpark-ingest",
    about = "Send carpark availability to a Kafka topic"
)]
struct Args {
    /// Config file (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Availability endpoint
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Kafka brokers (comma-separated)
    #[arg(short, long)]
    brokers: Option<String>,

    /// Kafka topic to send messages to
    #[arg(short, long)]
    topic: Option<String>,

    /// Producer client ID
    #[arg(long)]
    client_id: Option<String>,

    /// Seconds to wait for outstanding deliveries before closing
    #[arg(long)]
    flush_timeout_secs: Option<u64>,

    /// Continue on error (skip records that fail to serialize or enqueue)
    #[arg(long)]
    continue_on_error: bool,

    /// Dry run (print messages, don't connect to Kafka)
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn into_spec(self) -> Result<(IngestSpec, bool)> {
        let spec = IngestSpec::load(self.config.as_deref())
            .context("Failed to load configuration")?;
        Ok(self.apply(spec))
    }

    /// Flags win over the loaded spec; `--continue-on-error` can only turn
    /// skipping on.
    fn apply(self, mut spec: IngestSpec) -> (IngestSpec, bool) {
        if let Some(endpoint) = self.endpoint {
            spec.endpoint = endpoint;
        }
        if let Some(brokers) = self.brokers {
            spec.brokers = brokers;
        }
        if let Some(topic) = self.topic {
            spec.topic = topic;
        }
        if let Some(client_id) = self.client_id {
            spec.client_id = client_id;
        }
        if let Some(secs) = self.flush_timeout_secs {
            spec.flush_timeout_secs = secs;
        }
        spec.continue_on_error |= self.continue_on_error;

        (spec, self.dry_run)
    }
}

/// Summary label for the final flush.
fn flush_outcome(flushed: carpark_core::Result<()>) -> &'static str {
    match flushed {
        Ok(()) => "complete",
        Err(e) => {
            warn!("Error flushing producer: {}", e);
            "timed out"
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (spec, dry_run) = Args::parse().into_spec()?;
    info!("Starting carpark ingest with {:?}", spec);

    let fetcher = HttpFetcher::new(spec.endpoint.clone(), spec.request_timeout())
        .context("Failed to create HTTP client")?;
    let body = fetcher
        .fetch()
        .await
        .context("Failed to fetch carpark availability")?;

    let result = ResultSet::decode(&body).context("Failed to decode availability response")?;
    let snapshot = result.first_snapshot()?;
    info!(
        "Snapshot {} has {} carparks",
        snapshot.timestamp,
        snapshot.carpark_data.len()
    );

    if dry_run {
        let publisher = Publisher::new(StdoutRecordSink::new(), spec.topic.clone())
            .continue_on_error(spec.continue_on_error);
        let summary = publisher.publish(snapshot)?;
        info!("DRY RUN: {} messages, {} skipped", summary.enqueued, summary.skipped);
        info!("done (dry run)");
        return Ok(());
    }

    let (reports, rx) = report_channel();
    let drain = spawn_drain(rx);

    let sink = KafkaRecordSink::connect(&spec, reports).context("Failed to create Kafka producer")?;
    let publisher =
        Publisher::new(sink, spec.topic.clone()).continue_on_error(spec.continue_on_error);

    let published = publisher.publish(snapshot);
    let flushed = flush_outcome(publisher.flush(spec.flush_timeout()));
    publisher.into_sink().close();

    let stats: DeliveryStats = drain.await.context("Delivery report task failed")?;
    let summary = published?;

    info!("Producer Summary:");
    info!("  Enqueued: {}", summary.enqueued);
    info!("  Skipped: {}", summary.skipped);
    info!("  Delivered: {}", stats.delivered);
    info!("  Failed: {}", stats.failed);
    info!("  Flush: {}", flushed);
    info!("done sending to kafka");

    Ok(())
}
