use async_trait::async_trait;
use carpark_core::{Fetcher, IngestError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

/// Single GET against the availability endpoint
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
}

impl HttpFetcher {
    /// Create a fetcher. `timeout` bounds the whole request when set.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let endpoint = endpoint.into();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| IngestError::RequestConstruction {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        info!("Fetching carpark availability from {}", self.endpoint);

        let request = self
            .client
            .get(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .build()
            .map_err(|e| IngestError::RequestConstruction {
                endpoint: self.endpoint.clone(),
                source: Box::new(e),
            })?;

        let transport = |e: reqwest::Error| IngestError::Transport {
            endpoint: self.endpoint.clone(),
            source: Box::new(e),
        };

        let response = self.client.execute(request).await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        info!("Received {} bytes", body.len());
        Ok(body.to_vec())
    }
}
