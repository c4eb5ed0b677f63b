//! Narrow clients for the cloud APIs the runner and resolver consume.

pub mod client;
pub mod compute;
pub mod error;
pub mod metadata;
pub mod storage;
pub mod types;

pub use client::{ApiClient, Service};
pub use compute::{ComputeApi, ComputeClient};
pub use error::ClientError;
pub use metadata::{MetadataApi, MetadataClient};
pub use storage::{LoggingClient, StorageApi, StorageClient};
pub use types::{Bucket, EncryptionKey, Image, ImageSpec, MachineType, Snapshot, Subnetwork, Zone};
