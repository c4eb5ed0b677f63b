//! Error type for the cloud API clients.

use std::path::PathBuf;

use thiserror::Error;

/// Failures when building or calling a cloud API client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The API answered with a non-success HTTP status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure (DNS, refused connection, timeout, undecodable body).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("invalid credentials file {}: {message}", path.display())]
    Credentials { path: PathBuf, message: String },
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
