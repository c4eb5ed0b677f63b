use std::sync::Arc;

use tracing::debug;

use crate::cloud::ComputeApi;
use crate::error::ResolveError;

pub const DEFAULT_NETWORK: &str = "default";

/// Turns the user's network and subnet into a usable pair.
pub trait NetworkResolver {
    /// Returns `(network, subnet)` as resource paths. Either input may be
    /// empty.
    async fn resolve(
        &self,
        network: &str,
        subnet: &str,
        region: &str,
        project: &str,
    ) -> Result<(String, String), ResolveError>;
}

/// Looks up a subnet's network through the Compute API when only the
/// subnet was given.
pub struct ComputeNetworkResolver<C> {
    compute: Arc<C>,
}

impl<C: ComputeApi> ComputeNetworkResolver<C> {
    pub fn new(compute: Arc<C>) -> Self {
        Self { compute }
    }
}

impl<C: ComputeApi> NetworkResolver for ComputeNetworkResolver<C> {
    async fn resolve(
        &self,
        network: &str,
        subnet: &str,
        region: &str,
        project: &str,
    ) -> Result<(String, String), ResolveError> {
        let network = match (network.is_empty(), subnet.is_empty()) {
            (true, true) => DEFAULT_NETWORK.to_string(),
            (true, false) => {
                let name = last_segment(subnet);
                let found = self.compute.get_subnetwork(project, region, name).await?;
                debug!(subnet = name, network = %found.network, "network taken from subnet");
                resource_path(&found.network)
            }
            _ => network.to_string(),
        };

        let network = expand(&network, || format!("projects/{project}/global/networks/{network}"));
        let subnet = if subnet.is_empty() {
            String::new()
        } else {
            expand(subnet, || format!("projects/{project}/regions/{region}/subnetworks/{subnet}"))
        };
        Ok((network, subnet))
    }
}

fn expand(value: &str, full: impl FnOnce() -> String) -> String {
    if value.contains('/') {
        value.to_string()
    } else {
        full()
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Strips the API host from a self link, keeping `projects/...`.
fn resource_path(url: &str) -> String {
    match url.find("projects/") {
        Some(start) => url[start..].to_string(),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCompute;

    fn resolver() -> ComputeNetworkResolver<FakeCompute> {
        let mut compute = FakeCompute::default();
        compute.subnetworks.insert(
            "sub-1".into(),
            "https://www.googleapis.com/compute/v1/projects/host/global/networks/shared".into(),
        );
        ComputeNetworkResolver::new(Arc::new(compute))
    }

    #[tokio::test]
    async fn both_empty_uses_default_network() {
        let (network, subnet) = resolver().resolve("", "", "us-central1", "p").await.unwrap();
        assert_eq!(network, "projects/p/global/networks/default");
        assert_eq!(subnet, "");
    }

    #[tokio::test]
    async fn subnet_only_looks_up_network() {
        let (network, subnet) = resolver()
            .resolve("", "sub-1", "us-central1", "p")
            .await
            .unwrap();
        assert_eq!(network, "projects/host/global/networks/shared");
        assert_eq!(subnet, "projects/p/regions/us-central1/subnetworks/sub-1");
    }

    #[tokio::test]
    async fn network_only_leaves_subnet_empty() {
        let (network, subnet) = resolver()
            .resolve("vpc", "", "us-central1", "p")
            .await
            .unwrap();
        assert_eq!(network, "projects/p/global/networks/vpc");
        assert_eq!(subnet, "");
    }

    #[tokio::test]
    async fn paths_are_kept() {
        let (network, subnet) = resolver()
            .resolve(
                "projects/host/global/networks/vpc",
                "projects/host/regions/us-central1/subnetworks/sub-1",
                "us-central1",
                "p",
            )
            .await
            .unwrap();
        assert_eq!(network, "projects/host/global/networks/vpc");
        assert_eq!(subnet, "projects/host/regions/us-central1/subnetworks/sub-1");
    }

    #[tokio::test]
    async fn unknown_subnet_is_an_error() {
        let err = resolver()
            .resolve("", "missing", "us-central1", "p")
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Client(_)));
    }
}
