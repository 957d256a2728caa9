//! # Carpark I/O - fetcher and sink implementations
//!
//! Concrete adapters behind the `carpark-core` seams.
//!
//! ## Features
//!
//! - **HTTP**: [`fetch_http::HttpFetcher`] issues the single availability GET
//! - **Kafka**: [`sink_kafka::KafkaRecordSink`] produces with acks=all and
//!   forwards delivery callbacks to the report channel
//! - **Stdout**: [`sink_stdout::StdoutRecordSink`] for dry runs
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use carpark_core::{report_channel, IngestSpec};
//! use carpark_io::sink_kafka::KafkaRecordSink;
//!
//! let spec = IngestSpec::default();
//! let (tx, _rx) = report_channel();
//! let sink = KafkaRecordSink::connect(&spec, tx)?;
//! sink.close();
//! # Ok::<(), carpark_core::IngestError>(())
//! ```

/// HTTP availability fetcher
pub mod fetch_http;

/// Kafka producer sink
pub mod sink_kafka;

/// Standard output sink for dry runs
pub mod sink_stdout;
