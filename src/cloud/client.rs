use std::fmt;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::ClientError;
use super::types::ErrorEnvelope;

/// The cloud services a workflow talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Compute,
    Storage,
    Logging,
}

impl Service {
    /// Public endpoint used when no override is configured.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Service::Compute => "https://compute.googleapis.com/compute/v1/",
            Service::Storage => "https://storage.googleapis.com/storage/v1/",
            Service::Logging => "https://logging.googleapis.com/v2/",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Compute => write!(f, "compute"),
            Service::Storage => write!(f, "storage"),
            Service::Logging => write!(f, "logging"),
        }
    }
}

#[derive(Deserialize)]
struct CredentialsFile {
    access_token: Option<String>,
}

/// HTTP client bound to one service endpoint and, optionally, a bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    service: Service,
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    /// Builds a client for `service`.
    ///
    /// `endpoint` overrides the service's public endpoint. `credentials` points
    /// at a JSON file holding an `access_token`; a missing or unreadable file
    /// fails construction.
    pub fn new(
        service: Service,
        endpoint: Option<&str>,
        credentials: Option<&Path>,
    ) -> Result<Self, ClientError> {
        let endpoint = endpoint.unwrap_or_else(|| service.default_endpoint());
        let url = Url::parse(endpoint).map_err(|e| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                message: format!("unsupported scheme {}", url.scheme()),
            });
        }

        let token = credentials.map(read_access_token).transpose()?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            service,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_json_with_query(path, &[]).await
    }

    /// GET with query parameters encoded by reqwest.
    pub(crate) async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let req = self.authorize(self.client.get(self.url(path)).query(query));
        send(req).await?.json::<T>().await.map_err(ClientError::from)
    }

    pub(crate) async fn post_json<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, ClientError> {
        self.post_json_with_query(path, &[], body).await
    }

    pub(crate) async fn post_json_with_query<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<serde_json::Value, ClientError> {
        let req = self.authorize(self.client.post(self.url(path)).query(query).json(body));
        send(req).await?.json().await.map_err(ClientError::from)
    }
}

async fn send(req: RequestBuilder) -> Result<reqwest::Response, ClientError> {
    let response = req.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

fn read_access_token(path: &Path) -> Result<String, ClientError> {
    let credentials_error = |message: String| ClientError::Credentials {
        path: path.to_path_buf(),
        message,
    };
    let contents = std::fs::read_to_string(path).map_err(|e| credentials_error(e.to_string()))?;
    let parsed: CredentialsFile =
        serde_json::from_str(&contents).map_err(|e| credentials_error(e.to_string()))?;
    parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| credentials_error("missing access_token".to_string()))
}
