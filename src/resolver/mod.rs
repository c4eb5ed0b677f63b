//! Fills in parameters the user left blank before a run starts.
//!
//! Resolution is a fixed sequence and stops at the first error; later steps
//! consume earlier results:
//!
//! project → scratch path → storage location → zone → region →
//! network/subnet → machine series

pub mod location;
mod machine_series;
mod network;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

pub use location::{DEFAULT_REGION, largest_storage_location, region_from_zone, split_gcs_path};
pub use machine_series::{
    ComputeMachineSeriesDetector, MachineSeriesDetector, PREFERRED_SERIES, REQUIRED_SHAPES,
};
pub use network::{ComputeNetworkResolver, DEFAULT_NETWORK, NetworkResolver};

use crate::cloud::{ComputeApi, MetadataApi, StorageApi};
use crate::env::{EndpointsOverride, EnvironmentSettings, Tool};
use crate::error::ResolveError;

/// Everything a run needs that the user may or may not have supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    pub project: String,
    pub zone: String,
    pub region: String,
    pub scratch_bucket_gcs_path: String,
    /// `None` when the caller has no use for a storage location; `Some("")`
    /// asks for one to be derived.
    pub storage_location: Option<String>,
    pub network: String,
    pub subnet: String,
    pub worker_machine_series: Vec<String>,
    pub oauth: String,
    pub timeout: String,
    pub endpoints_override: EndpointsOverride,
    pub execution_id: String,
    pub labels: BTreeMap<String, String>,
    pub compute_service_account: String,
    pub nested_virtualization_enabled: bool,
    pub tool: Tool,
}

impl Parameters {
    /// The environment a run executes in once resolution is done.
    pub fn into_environment(self) -> EnvironmentSettings {
        EnvironmentSettings {
            project: self.project,
            zone: self.zone,
            gcs_path: self.scratch_bucket_gcs_path,
            oauth: self.oauth,
            timeout: self.timeout,
            endpoints_override: self.endpoints_override,
            execution_id: self.execution_id,
            worker_machine_series: self.worker_machine_series,
            nested_virtualization_enabled: self.nested_virtualization_enabled,
            labels: self.labels,
            network: self.network,
            subnet: self.subnet,
            compute_service_account: self.compute_service_account,
            tool: self.tool,
        }
    }
}

/// Resolves [`Parameters`] against the metadata server and cloud APIs.
pub struct ParameterResolver<M, S, C, N, D> {
    metadata: M,
    storage: S,
    compute: Arc<C>,
    network: N,
    machine_series: D,
}

impl<M, S, C> ParameterResolver<M, S, C, ComputeNetworkResolver<C>, ComputeMachineSeriesDetector<C>>
where
    M: MetadataApi,
    S: StorageApi,
    C: ComputeApi,
{
    /// Network and machine-series lookups go through `compute`.
    pub fn new(metadata: M, storage: S, compute: C) -> Self {
        let compute = Arc::new(compute);
        Self {
            network: ComputeNetworkResolver::new(Arc::clone(&compute)),
            machine_series: ComputeMachineSeriesDetector::new(Arc::clone(&compute)),
            metadata,
            storage,
            compute,
        }
    }
}

impl<M, S, C, N, D> ParameterResolver<M, S, C, N, D>
where
    M: MetadataApi,
    S: StorageApi,
    C: ComputeApi,
    N: NetworkResolver,
    D: MachineSeriesDetector,
{
    pub fn with_collaborators(
        metadata: M,
        storage: S,
        compute: Arc<C>,
        network: N,
        machine_series: D,
    ) -> Self {
        Self {
            metadata,
            storage,
            compute,
            network,
            machine_series,
        }
    }

    /// Fills every empty field of `params` in place.
    pub async fn resolve(&self, params: &mut Parameters) -> Result<(), ResolveError> {
        self.resolve_project(params).await?;
        let bucket_region = self.resolve_scratch_path(params).await?;

        if let Some(location) = params.storage_location.as_mut()
            && location.is_empty()
        {
            *location = largest_storage_location(&bucket_region);
        }

        if params.zone.is_empty() {
            params.zone =
                location::first_zone_in_region(self.compute.as_ref(), &bucket_region, &params.project)
                    .await?;
        }
        params.region = region_from_zone(&params.zone)?;

        let (network, subnet) = self
            .network
            .resolve(&params.network, &params.subnet, &params.region, &params.project)
            .await?;
        params.network = network;
        params.subnet = subnet;

        if params.worker_machine_series.is_empty() {
            params.worker_machine_series = self
                .machine_series
                .detect(&params.project, &params.zone)
                .await?;
        }

        info!(
            project = %params.project,
            zone = %params.zone,
            scratch = %params.scratch_bucket_gcs_path,
            series = ?params.worker_machine_series,
            "resolved parameters"
        );
        Ok(())
    }

    async fn resolve_project(&self, params: &mut Parameters) -> Result<(), ResolveError> {
        if !params.project.is_empty() {
            return Ok(());
        }
        match self.metadata.project_id().await {
            Ok(project) if !project.is_empty() => {
                debug!(%project, "project taken from metadata server");
                params.project = project;
                Ok(())
            }
            _ => Err(ResolveError::MissingProject),
        }
    }

    /// Ensures a scratch path exists and returns the region its bucket is in.
    async fn resolve_scratch_path(&self, params: &mut Parameters) -> Result<String, ResolveError> {
        if !params.scratch_bucket_gcs_path.is_empty() {
            let (bucket, _) = split_gcs_path(&params.scratch_bucket_gcs_path)?;
            let location = self.storage.bucket_location(&bucket).await?;
            return Ok(location.to_lowercase());
        }

        let region = self.default_bucket_region(&params.zone).await?;
        let bucket = scratch_bucket_name(&params.project, &region);
        self.storage
            .create_bucket(&params.project, &bucket, &region)
            .await?;
        info!(%bucket, %region, "using scratch bucket");
        params.scratch_bucket_gcs_path = format!("gs://{bucket}/");
        Ok(region)
    }

    async fn default_bucket_region(&self, zone: &str) -> Result<String, ResolveError> {
        if !zone.is_empty() {
            return region_from_zone(zone);
        }
        match self.metadata.zone().await {
            Ok(zone) if !zone.is_empty() => region_from_zone(&zone),
            _ => Ok(DEFAULT_REGION.to_string()),
        }
    }
}

/// Bucket names may not contain the `:` and `.` of domain-scoped project ids.
pub fn scratch_bucket_name(project: &str, region: &str) -> String {
    let project = project.replace([':', '.'], "-");
    format!("{project}-wfrunner-scratch-{region}").to_lowercase()
}
