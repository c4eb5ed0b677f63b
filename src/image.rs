//! Image helpers used around a run: sizing the source before export and
//! turning an imported data disk into an image.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::cloud::{ComputeApi, EncryptionKey, ImageSpec};
use crate::error::ImageError;
use crate::hooks::ApplyCmekHook;
use crate::validation::{validate_image_name, validate_image_uri, validate_snapshot_name};

/// Project that publishes the import licenses.
pub const RELEASE_PROJECT: &str = "compute-image-import";

const IMPORT_LABEL: &str = "gce-image-import";

/// Where an export reads its disk from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Image(String),
    Snapshot(String),
}

/// Size in GB of the image or snapshot an export starts from.
///
/// Only names this crate recognises are looked up; anything else (for
/// instance a full URL) yields 0 and leaves interpretation to the engine.
pub async fn probe_source_size<C: ComputeApi>(
    compute: &C,
    project: &str,
    source: &ImageSource,
) -> Result<i64, ImageError> {
    match source {
        ImageSource::Image(uri) => {
            let (project, name) = if validate_image_name(uri).is_ok() {
                (project.to_string(), uri.clone())
            } else if let Ok(parts) = validate_image_uri(uri) {
                parts
            } else {
                return Ok(0);
            };
            info!(image = %name, %project, "fetching image");
            let image = compute.get_image(&project, &name).await.map_err(|source| {
                warn!(image = %uri, error = %source, "error fetching image");
                ImageError::NotFound {
                    kind: "Image",
                    name: uri.clone(),
                    source,
                }
            })?;
            Ok(image.disk_size_gb)
        }
        ImageSource::Snapshot(name) => {
            if validate_snapshot_name(name).is_err() {
                return Ok(0);
            }
            let snapshot = compute.get_snapshot(project, name).await.map_err(|source| {
                warn!(snapshot = %name, error = %source, "error fetching snapshot");
                ImageError::NotFound {
                    kind: "Snapshot",
                    name: name.clone(),
                    source,
                }
            })?;
            Ok(snapshot.disk_size_gb)
        }
    }
}

/// Creates an image from an imported data disk, without guest translation.
#[derive(Debug, Clone)]
pub struct DataDiskImage {
    project: String,
    request: ImageSpec,
}

impl DataDiskImage {
    /// Builds the image request for the disk at `disk_uri`.
    ///
    /// User labels are added on top of the import label. An empty
    /// `storage_location` lets the API pick one.
    pub fn new(
        project: &str,
        image_name: &str,
        disk_uri: &str,
        user_labels: &BTreeMap<String, String>,
        storage_location: &str,
        kms: &ApplyCmekHook,
    ) -> Result<Self, ImageError> {
        validate_image_name(image_name)?;

        let mut labels = BTreeMap::from([(IMPORT_LABEL.to_string(), "true".to_string())]);
        labels.extend(user_labels.iter().map(|(k, v)| (k.clone(), v.clone())));

        let storage_locations = if storage_location.is_empty() {
            Vec::new()
        } else {
            vec![storage_location.to_string()]
        };
        let image_encryption_key = kms
            .key_name(project)?
            .map(|kms_key_name| EncryptionKey { kms_key_name });

        Ok(Self {
            project: project.to_string(),
            request: ImageSpec {
                name: image_name.to_string(),
                labels,
                source_disk: disk_uri.to_string(),
                storage_locations,
                licenses: vec![format!(
                    "projects/{RELEASE_PROJECT}/global/licenses/virtual-disk-import"
                )],
                image_encryption_key,
                ..Default::default()
            },
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.request.description = description.into();
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.request.family = family.into();
        self
    }

    pub fn request(&self) -> &ImageSpec {
        &self.request
    }

    pub async fn create<C: ComputeApi>(&self, compute: &C) -> Result<(), ImageError> {
        info!(image = %self.request.name, project = %self.project, "creating image");
        compute
            .create_image(&self.project, &self.request)
            .await
            .map_err(|source| ImageError::Create {
                name: self.request.name.clone(),
                source,
            })
    }
}
