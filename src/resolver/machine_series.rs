use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::cloud::ComputeApi;
use crate::error::ResolveError;

/// Series probed for, most preferred first.
pub const PREFERRED_SERIES: [&str; 3] = ["n2", "n1", "e2"];

/// Shapes a series must offer in the zone to run the worker instances.
pub const REQUIRED_SHAPES: [&str; 4] = ["-standard-2", "-standard-4", "-standard-8", "-highcpu-4"];

/// Finds the machine series a project can use in a zone.
pub trait MachineSeriesDetector {
    async fn detect(&self, project: &str, zone: &str) -> Result<Vec<String>, ResolveError>;
}

pub struct ComputeMachineSeriesDetector<C> {
    compute: Arc<C>,
}

impl<C: ComputeApi> ComputeMachineSeriesDetector<C> {
    pub fn new(compute: Arc<C>) -> Self {
        Self { compute }
    }
}

impl<C: ComputeApi> MachineSeriesDetector for ComputeMachineSeriesDetector<C> {
    async fn detect(&self, project: &str, zone: &str) -> Result<Vec<String>, ResolveError> {
        let available: HashSet<String> = self
            .compute
            .list_machine_types(project, zone)
            .await?
            .into_iter()
            .map(|mt| mt.name)
            .collect();

        let series: Vec<String> = PREFERRED_SERIES
            .iter()
            .filter(|series| {
                REQUIRED_SHAPES
                    .iter()
                    .all(|shape| available.contains(&format!("{series}{shape}")))
            })
            .map(|series| series.to_string())
            .collect();
        debug!(project, zone, ?series, "detected machine series");
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCompute;

    fn full_series(series: &str) -> Vec<String> {
        REQUIRED_SHAPES.iter().map(|s| format!("{series}{s}")).collect()
    }

    async fn detect(machine_types: Vec<String>) -> Vec<String> {
        let compute = FakeCompute {
            machine_types,
            ..Default::default()
        };
        ComputeMachineSeriesDetector::new(Arc::new(compute))
            .detect("p", "us-central1-a")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn all_series_available_in_preference_order() {
        let mut types = full_series("e2");
        types.extend(full_series("n1"));
        types.extend(full_series("n2"));
        assert_eq!(detect(types).await, vec!["n2", "n1", "e2"]);
    }

    #[tokio::test]
    async fn incomplete_series_is_skipped() {
        let mut types = full_series("n1");
        types.extend(["n2-standard-2".into(), "n2-standard-4".into(), "n2-standard-8".into()]);
        assert_eq!(detect(types).await, vec!["n1"]);
    }

    #[tokio::test]
    async fn nothing_available() {
        assert!(detect(vec!["c2-standard-4".into()]).await.is_empty());
    }
}
