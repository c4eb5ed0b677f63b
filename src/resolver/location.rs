//! Zone, region and storage-location arithmetic.

use tracing::debug;

use crate::cloud::ComputeApi;
use crate::error::ResolveError;

/// Region used when neither the caller nor the metadata server names one.
pub const DEFAULT_REGION: &str = "us-central1";

/// `us-central1-a` → `us-central1`.
pub fn region_from_zone(zone: &str) -> Result<String, ResolveError> {
    let invalid = || ResolveError::InvalidZone(zone.to_string());
    let (region, suffix) = zone.rsplit_once('-').ok_or_else(invalid)?;
    let valid_suffix = suffix.len() == 1 && suffix.chars().all(|c| c.is_ascii_lowercase());
    if !valid_suffix || !region.contains('-') {
        return Err(invalid());
    }
    Ok(region.to_string())
}

/// The broadest storage location containing `region`: the `us`, `eu` or
/// `asia` multi-region, or the region itself.
pub fn largest_storage_location(region: &str) -> String {
    let region = region.to_lowercase();
    let continent = region.split('-').next().unwrap_or_default();
    match continent {
        "us" => "us".to_string(),
        "eu" | "europe" => "eu".to_string(),
        "asia" => "asia".to_string(),
        _ => region,
    }
}

/// A concrete region to place zonal resources in when a bucket lives in a
/// multi-region.
pub fn representative_region(location: &str) -> String {
    match location.to_lowercase().as_str() {
        "us" => DEFAULT_REGION.to_string(),
        "eu" => "europe-west1".to_string(),
        "asia" => "asia-east1".to_string(),
        region => region.to_string(),
    }
}

/// Splits `gs://bucket/some/object` into `("bucket", "some/object")`.
pub fn split_gcs_path(path: &str) -> Result<(String, String), ResolveError> {
    let invalid = || ResolveError::InvalidStoragePath(path.to_string());
    let rest = path.strip_prefix("gs://").ok_or_else(invalid)?;
    let (bucket, object) = rest.split_once('/').unwrap_or((rest, ""));
    if bucket.is_empty() {
        return Err(invalid());
    }
    Ok((bucket.to_string(), object.to_string()))
}

/// The first zone of `region` that is `UP`, in the order the API lists them.
pub async fn first_zone_in_region<C: ComputeApi>(
    compute: &C,
    region: &str,
    project: &str,
) -> Result<String, ResolveError> {
    let region = representative_region(region);
    let prefix = format!("{region}-");
    let zones = compute.list_zones(project).await?;
    zones
        .into_iter()
        .find(|z| z.status == "UP" && z.name.starts_with(&prefix))
        .map(|z| {
            debug!(zone = %z.name, %region, "picked zone");
            z.name
        })
        .ok_or(ResolveError::NoZone {
            region,
            project: project.to_string(),
        })
}
