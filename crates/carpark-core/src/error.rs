/// Boxed source error carried by variants whose cause lives in an adapter
/// crate (reqwest, rdkafka, config).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for a carpark ingestion run
///
/// Every stage of the pipeline returns one of these instead of terminating
/// the process, so the binary decides how a failure ends the run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The HTTP request could not be built (bad URL, bad header).
    #[error("failed to build request for {endpoint}: {source}")]
    RequestConstruction {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// Network, DNS or timeout failure while talking to the endpoint.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: BoxError,
    },

    /// The endpoint answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    /// The response body is not a well-formed availability result.
    #[error("failed to decode availability response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response carried no snapshot to publish.
    #[error("availability response contains no snapshots")]
    EmptyResult,

    /// A carpark record could not be serialized to JSON.
    #[error("failed to serialize carpark {carpark}: {source}")]
    Serialization {
        carpark: String,
        #[source]
        source: serde_json::Error,
    },

    /// The producer refused to queue a message.
    #[error("failed to enqueue message {key}: {source}")]
    Enqueue {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The producer connection could not be created.
    #[error("failed to create producer for {brokers}: {source}")]
    Connection {
        brokers: String,
        #[source]
        source: BoxError,
    },

    /// Flush returned before every queued message was resolved.
    #[error("flush did not complete: {0}")]
    Flush(#[source] BoxError),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(#[source] BoxError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
