use std::path::Path;

use super::client::{ApiClient, Service};
use super::error::ClientError;
use super::types::{Image, ImageSpec, MachineType, MachineTypeList, Snapshot, Subnetwork, Zone, ZoneList};

/// The Compute Engine calls this crate depends on.
pub trait ComputeApi {
    async fn list_machine_types(&self, project: &str, zone: &str) -> Result<Vec<MachineType>, ClientError>;
    async fn get_image(&self, project: &str, name: &str) -> Result<Image, ClientError>;
    async fn get_snapshot(&self, project: &str, name: &str) -> Result<Snapshot, ClientError>;
    async fn create_image(&self, project: &str, spec: &ImageSpec) -> Result<(), ClientError>;
    async fn list_zones(&self, project: &str) -> Result<Vec<Zone>, ClientError>;
    async fn get_subnetwork(&self, project: &str, region: &str, name: &str) -> Result<Subnetwork, ClientError>;
}

/// Compute Engine REST client.
#[derive(Debug, Clone)]
pub struct ComputeClient {
    api: ApiClient,
}

impl ComputeClient {
    pub fn new(endpoint: Option<&str>, credentials: Option<&Path>) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(Service::Compute, endpoint, credentials)?,
        })
    }

    pub fn endpoint(&self) -> &str {
        self.api.base_url()
    }
}

fn page_query(token: &Option<String>) -> Vec<(&'static str, &str)> {
    token
        .as_deref()
        .map(|t| vec![("pageToken", t)])
        .unwrap_or_default()
}

impl ComputeApi for ComputeClient {
    async fn list_machine_types(&self, project: &str, zone: &str) -> Result<Vec<MachineType>, ClientError> {
        let mut machine_types = Vec::new();
        let mut page_token = None;
        loop {
            let page: MachineTypeList = self
                .api
                .get_json_with_query(
                    &format!("projects/{project}/zones/{zone}/machineTypes"),
                    &page_query(&page_token),
                )
                .await?;
            machine_types.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(machine_types),
            }
        }
    }

    async fn get_image(&self, project: &str, name: &str) -> Result<Image, ClientError> {
        self.api
            .get_json(&format!("projects/{project}/global/images/{name}"))
            .await
    }

    async fn get_snapshot(&self, project: &str, name: &str) -> Result<Snapshot, ClientError> {
        self.api
            .get_json(&format!("projects/{project}/global/snapshots/{name}"))
            .await
    }

    async fn create_image(&self, project: &str, spec: &ImageSpec) -> Result<(), ClientError> {
        self.api
            .post_json(&format!("projects/{project}/global/images"), spec)
            .await?;
        Ok(())
    }

    async fn list_zones(&self, project: &str) -> Result<Vec<Zone>, ClientError> {
        let mut zones = Vec::new();
        let mut page_token = None;
        loop {
            let page: ZoneList = self
                .api
                .get_json_with_query(&format!("projects/{project}/zones"), &page_query(&page_token))
                .await?;
            zones.extend(page.items);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => return Ok(zones),
            }
        }
    }

    async fn get_subnetwork(&self, project: &str, region: &str, name: &str) -> Result<Subnetwork, ClientError> {
        self.api
            .get_json(&format!("projects/{project}/regions/{region}/subnetworks/{name}"))
            .await
    }
}
