//! In-memory cloud API doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::cloud::{
    ClientError, ComputeApi, Image, ImageSpec, MachineType, MetadataApi, Snapshot, StorageApi,
    Subnetwork, Zone,
};

fn not_found(what: &str) -> ClientError {
    ClientError::Api {
        status: 404,
        message: format!("{what} was not found"),
    }
}

#[derive(Default)]
pub(crate) struct FakeCompute {
    pub machine_types: Vec<String>,
    pub zones: Vec<Zone>,
    /// Subnetwork name to the URL of its network.
    pub subnetworks: HashMap<String, String>,
    pub images: HashMap<String, i64>,
    pub snapshots: HashMap<String, i64>,
    pub created: Mutex<Vec<(String, ImageSpec)>>,
    pub fail_create: bool,
}

impl FakeCompute {
    pub fn with_machine_types(names: &[&str]) -> Self {
        Self {
            machine_types: names.iter().map(|n| n.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_zones(zones: &[(&str, &str)]) -> Self {
        Self {
            zones: zones
                .iter()
                .map(|(name, status)| Zone {
                    name: name.to_string(),
                    status: status.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }
}

impl ComputeApi for FakeCompute {
    async fn list_machine_types(&self, _project: &str, _zone: &str) -> Result<Vec<MachineType>, ClientError> {
        Ok(self
            .machine_types
            .iter()
            .map(|name| MachineType { name: name.clone() })
            .collect())
    }

    async fn get_image(&self, _project: &str, name: &str) -> Result<Image, ClientError> {
        self.images
            .get(name)
            .map(|size| Image {
                name: name.to_string(),
                disk_size_gb: *size,
            })
            .ok_or_else(|| not_found(name))
    }

    async fn get_snapshot(&self, _project: &str, name: &str) -> Result<Snapshot, ClientError> {
        self.snapshots
            .get(name)
            .map(|size| Snapshot {
                name: name.to_string(),
                disk_size_gb: *size,
            })
            .ok_or_else(|| not_found(name))
    }

    async fn create_image(&self, project: &str, spec: &ImageSpec) -> Result<(), ClientError> {
        if self.fail_create {
            return Err(ClientError::Api {
                status: 403,
                message: "permission denied".into(),
            });
        }
        self.created
            .lock()
            .unwrap()
            .push((project.to_string(), spec.clone()));
        Ok(())
    }

    async fn list_zones(&self, _project: &str) -> Result<Vec<Zone>, ClientError> {
        Ok(self.zones.clone())
    }

    async fn get_subnetwork(&self, _project: &str, _region: &str, name: &str) -> Result<Subnetwork, ClientError> {
        self.subnetworks
            .get(name)
            .map(|network| Subnetwork {
                name: name.to_string(),
                network: network.clone(),
            })
            .ok_or_else(|| not_found(name))
    }
}

#[derive(Default)]
pub(crate) struct FakeStorage {
    /// Bucket name to location.
    pub buckets: Mutex<HashMap<String, String>>,
}

impl FakeStorage {
    pub fn with_bucket(name: &str, location: &str) -> Self {
        let storage = Self::default();
        storage
            .buckets
            .lock()
            .unwrap()
            .insert(name.to_string(), location.to_string());
        storage
    }

    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

impl StorageApi for FakeStorage {
    async fn bucket_location(&self, bucket: &str) -> Result<String, ClientError> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .cloned()
            .ok_or_else(|| not_found(bucket))
    }

    async fn create_bucket(&self, _project: &str, bucket: &str, location: &str) -> Result<(), ClientError> {
        self.buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string(), location.to_uppercase());
        Ok(())
    }
}

/// Metadata server double; `None` fields answer 404 like a machine outside
/// Compute Engine.
#[derive(Default)]
pub(crate) struct FakeMetadata {
    pub project: Option<String>,
    pub zone: Option<String>,
}

impl MetadataApi for FakeMetadata {
    async fn project_id(&self) -> Result<String, ClientError> {
        self.project.clone().ok_or_else(|| not_found("project-id"))
    }

    async fn zone(&self) -> Result<String, ClientError> {
        self.zone.clone().ok_or_else(|| not_found("zone"))
    }
}
