use std::path::Path;

use super::client::{ApiClient, Service};
use super::error::ClientError;
use super::types::Bucket;

/// The Cloud Storage calls the parameter resolver depends on.
pub trait StorageApi {
    /// Location of `bucket` as reported by the API (e.g. `US-WEST1`, `US`).
    async fn bucket_location(&self, bucket: &str) -> Result<String, ClientError>;

    /// Creates `bucket` in `location`. An already existing bucket is not an error.
    async fn create_bucket(&self, project: &str, bucket: &str, location: &str) -> Result<(), ClientError>;
}

/// Cloud Storage JSON API client.
#[derive(Debug, Clone)]
pub struct StorageClient {
    api: ApiClient,
}

impl StorageClient {
    pub fn new(endpoint: Option<&str>, credentials: Option<&Path>) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(Service::Storage, endpoint, credentials)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.api.base_url()
    }
}

impl StorageApi for StorageClient {
    async fn bucket_location(&self, bucket: &str) -> Result<String, ClientError> {
        let found: Bucket = self.api.get_json(&format!("b/{bucket}")).await?;
        Ok(found.location)
    }

    async fn create_bucket(&self, project: &str, bucket: &str, location: &str) -> Result<(), ClientError> {
        let body = Bucket {
            name: bucket.to_string(),
            location: location.to_string(),
        };
        match self
            .api
            .post_json_with_query("b", &[("project", project)], &body)
            .await {
            Ok(_) => Ok(()),
            Err(ClientError::Api { status: 409, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Cloud Logging client bound to the project whose logs the workflow writes.
#[derive(Debug, Clone)]
pub struct LoggingClient {
    api: ApiClient,
    project: String,
}

impl LoggingClient {
    pub fn new(project: &str, endpoint: Option<&str>, credentials: Option<&Path>) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(Service::Logging, endpoint, credentials)?,
            project: project.to_string(),
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn endpoint(&self) -> &str {
        self.api.base_url()
    }
}
