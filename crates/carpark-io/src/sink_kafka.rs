use rdkafka::config::ClientConfig;
use rdkafka::message::Message as KafkaMessage;
use rdkafka::producer::{BaseRecord, DeliveryResult, Producer, ProducerContext, ThreadedProducer};
use rdkafka::ClientContext;

use carpark_core::{DeliveryReport, IngestError, IngestSpec, RecordSink, ReportTx, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Producer context that forwards every delivery callback to the report
/// channel. The sender lives as long as the producer does.
pub struct ReportingContext {
    reports: ReportTx,
}

impl ClientContext for ReportingContext {}

impl ProducerContext for ReportingContext {
    type DeliveryOpaque = ();

    fn delivery(&self, result: &DeliveryResult<'_>, _opaque: Self::DeliveryOpaque) {
        let report = match result {
            Ok(m) => DeliveryReport::Delivered {
                topic: m.topic().to_string(),
                partition: m.partition(),
                offset: m.offset(),
                key: key_string(m.key()),
            },
            Err((e, m)) => DeliveryReport::Failed {
                topic: m.topic().to_string(),
                partition: m.partition(),
                key: key_string(m.key()),
                error: e.to_string(),
            },
        };
        // the drain task is gone only after the producer is dropped
        let _ = self.reports.send(report);
    }
}

fn key_string(key: Option<&[u8]>) -> Option<String> {
    key.map(|k| String::from_utf8_lossy(k).into_owned())
}

/// Kafka connection used as a [`RecordSink`]
///
/// librdkafka's background thread polls the producer and runs delivery
/// callbacks; reports leave through the channel handed to [`connect`].
///
/// [`connect`]: KafkaRecordSink::connect
pub struct KafkaRecordSink {
    producer: ThreadedProducer<ReportingContext>,
    brokers: String,
}

impl KafkaRecordSink {
    pub fn connect(spec: &IngestSpec, reports: ReportTx) -> Result<Self> {
        let producer: ThreadedProducer<ReportingContext> = ClientConfig::new()
            .set("bootstrap.servers", &spec.brokers)
            .set("client.id", &spec.client_id)
            .set("acks", &spec.acks)
            .create_with_context(ReportingContext { reports })
            .map_err(|e| IngestError::Connection {
                brokers: spec.brokers.clone(),
                source: Box::new(e),
            })?;

        info!(
            "Created Kafka producer for {} (client.id={}, acks={})",
            spec.brokers, spec.client_id, spec.acks
        );
        Ok(Self {
            producer,
            brokers: spec.brokers.clone(),
        })
    }

    /// Release the connection. Dropping the producer drops its context and
    /// with it the report sender, which lets the drain task finish.
    pub fn close(self) {
        let in_flight = self.producer.in_flight_count();
        if in_flight > 0 {
            warn!(
                "Closing producer for {} with {} messages in flight",
                self.brokers, in_flight
            );
        }
        drop(self.producer);
    }
}

impl RecordSink for KafkaRecordSink {
    fn enqueue(&self, topic: &str, key: &str, payload: &[u8]) -> Result<()> {
        let record = BaseRecord::to(topic).key(key).payload(payload);

        self.producer
            .send(record)
            .map_err(|(e, _)| IngestError::Enqueue {
                key: key.to_string(),
                source: Box::new(e),
            })
    }

    fn flush(&self, timeout: Duration) -> Result<()> {
        self.producer
            .flush(timeout)
            .map_err(|e| IngestError::Flush(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpark_core::{report_channel, spawn_drain, DeliveryStats};

    #[tokio::test]
    async fn closing_the_producer_ends_the_drain() {
        // creating a producer does not contact the brokers
        let spec = IngestSpec {
            brokers: "127.0.0.1:1".into(),
            ..IngestSpec::default()
        };
        let (tx, rx) = report_channel();
        let drain = spawn_drain(rx);

        let sink = KafkaRecordSink::connect(&spec, tx).unwrap();
        sink.flush(Duration::from_millis(100)).unwrap();
        sink.close();

        assert_eq!(drain.await.unwrap(), DeliveryStats::default());
    }

    #[tokio::test]
    async fn unflushed_message_times_out_and_fails_on_close() {
        let spec = IngestSpec {
            brokers: "127.0.0.1:1".into(),
            ..IngestSpec::default()
        };
        let (tx, rx) = report_channel();
        let drain = spawn_drain(rx);

        let sink = KafkaRecordSink::connect(&spec, tx).unwrap();
        sink.enqueue(&spec.topic, "2024-01-01 00:00-A1", br#"{"carpark_number":"A1"}"#)
            .unwrap();

        let flushed = sink.flush(Duration::from_millis(200));
        assert!(matches!(flushed, Err(IngestError::Flush(_))));

        sink.close();
        assert_eq!(
            drain.await.unwrap(),
            DeliveryStats {
                delivered: 0,
                failed: 1
            }
        );
    }

    #[test]
    fn invalid_acks_is_a_connection_error() {
        let spec = IngestSpec {
            acks: "sometimes".into(),
            ..IngestSpec::default()
        };
        let (tx, _rx) = report_channel();

        assert!(matches!(
            KafkaRecordSink::connect(&spec, tx),
            Err(IngestError::Connection { .. })
        ));
    }
}
