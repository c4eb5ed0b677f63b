use std::time::Duration;

use reqwest::Client;

use super::error::ClientError;

const METADATA_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Ambient metadata of the Compute Engine instance the process runs on.
pub trait MetadataApi {
    async fn project_id(&self) -> Result<String, ClientError>;
    /// Zone name only, e.g. `us-central1-a`.
    async fn zone(&self) -> Result<String, ClientError>;
}

/// Client for the instance metadata server.
pub struct MetadataClient {
    client: Client,
    base_url: String,
}

impl MetadataClient {
    pub fn new() -> Result<Self, ClientError> {
        Self::with_base_url(METADATA_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(base_url: String) -> Result<Self, ClientError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body.trim().to_string())
    }
}

impl MetadataApi for MetadataClient {
    async fn project_id(&self) -> Result<String, ClientError> {
        self.get("project/project-id").await
    }

    async fn zone(&self) -> Result<String, ClientError> {
        // The server answers with `projects/<number>/zones/<zone>`.
        let full = self.get("instance/zone").await?;
        Ok(full.rsplit('/').next().unwrap_or_default().to_string())
    }
}
