use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{IngestError, Result};

pub const DEFAULT_ENDPOINT: &str = "https://api.data.gov.sg/v1/transport/carpark-availability";
pub const DEFAULT_TOPIC: &str = "carpark-availability";

/// Settings for one ingest run
///
/// Every field has a default, so an empty file (or none at all) reproduces
/// the stock job: the public endpoint, a local broker and acks=all.
///
/// # Example YAML Configuration
///
/// ```yaml
/// brokers: "broker1:9092,broker2:9092"
/// topic: "carpark-availability"
/// flush_timeout_secs: 30
/// request_timeout_secs: 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSpec {
    /// Availability endpoint queried with a single GET
    pub endpoint: String,

    /// Comma-separated list of Kafka broker addresses
    pub brokers: String,

    /// Producer `client.id`
    pub client_id: String,

    /// Producer `acks`; "all" waits for every in-sync replica
    pub acks: String,

    /// Topic every carpark record is published to
    pub topic: String,

    /// Upper bound on the final flush
    pub flush_timeout_secs: u64,

    /// HTTP client timeout; unset means the request may wait indefinitely
    pub request_timeout_secs: Option<u64>,

    /// Skip records that fail to serialize or enqueue
    pub continue_on_error: bool,
}

impl Default for IngestSpec {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            brokers: "localhost:9092".to_string(),
            client_id: "1".to_string(),
            acks: "all".to_string(),
            topic: DEFAULT_TOPIC.to_string(),
            flush_timeout_secs: 15,
            request_timeout_secs: None,
            continue_on_error: false,
        }
    }
}

impl IngestSpec {
    /// Load settings: defaults, then the optional file, then `CARPARK_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, env_source())
    }

    /// Same layering as [`IngestSpec::load`] with an explicit environment
    /// source on top.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| IngestError::Config(Box::new(e)))
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// `CARPARK_*` variables, with numbers and booleans parsed.
pub fn env_source() -> Environment {
    Environment::with_prefix("CARPARK").try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn yaml(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn defaults_match_stock_job() {
        let spec = IngestSpec::default();

        assert_eq!(spec.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(spec.brokers, "localhost:9092");
        assert_eq!(spec.client_id, "1");
        assert_eq!(spec.acks, "all");
        assert_eq!(spec.topic, "carpark-availability");
        assert_eq!(spec.flush_timeout(), Duration::from_secs(15));
        assert_eq!(spec.request_timeout(), None);
        assert!(!spec.continue_on_error);
    }

    #[test]
    fn file_overrides_only_what_it_names() {
        let file = yaml(&[
            "brokers: \"kafka-1:9092,kafka-2:9092\"",
            "flush_timeout_secs: 30",
            "request_timeout_secs: 5",
        ]);

        let spec = IngestSpec::load_with_env(Some(file.path()), env(&[])).unwrap();

        assert_eq!(spec.brokers, "kafka-1:9092,kafka-2:9092");
        assert_eq!(spec.flush_timeout(), Duration::from_secs(30));
        assert_eq!(spec.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(spec.topic, DEFAULT_TOPIC);
        assert_eq!(spec.acks, "all");
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = IngestSpec::load_with_env(Some(&dir.path().join("absent.yaml")), env(&[]))
            .unwrap_err();

        assert!(matches!(err, IngestError::Config(_)));
    }

    #[test]
    fn empty_layers_give_defaults() {
        let spec = IngestSpec::load_with_env(None, env(&[])).unwrap();

        assert_eq!(spec, IngestSpec::default());
    }

    #[test]
    fn env_overrides_file() {
        let file = yaml(&["topic: \"from-file\"", "brokers: \"kafka-1:9092\"", "flush_timeout_secs: 30"]);
        let vars = env(&[
            ("CARPARK_TOPIC", "from-env"),
            ("CARPARK_CLIENT_ID", "7"),
            ("CARPARK_FLUSH_TIMEOUT_SECS", "3"),
            ("CARPARK_CONTINUE_ON_ERROR", "true"),
            ("OTHER_TOPIC", "ignored"),
        ]);

        let spec = IngestSpec::load_with_env(Some(file.path()), vars).unwrap();

        assert_eq!(spec.topic, "from-env");
        assert_eq!(spec.client_id, "7");
        assert_eq!(spec.flush_timeout(), Duration::from_secs(3));
        assert!(spec.continue_on_error);
        assert_eq!(spec.brokers, "kafka-1:9092");
        assert_eq!(spec.acks, "all");
    }
}
