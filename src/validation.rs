//! Name checks for Compute Engine resources.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

const IMAGE_NAME: &str = "[a-z](?:[-a-z0-9]{0,61}[a-z0-9])?";
const PROJECT_ID: &str = r"(?:google\.com:)?[a-z][-a-z0-9]{4,28}[a-z0-9]";

const IMAGES_REFERENCE: &str = "https://cloud.google.com/compute/docs/reference/rest/v1/images";
const SNAPSHOTS_REFERENCE: &str = "https://cloud.google.com/compute/docs/reference/rest/v1/snapshots";
const PROJECTS_REFERENCE: &str = "https://cloud.google.com/resource-manager/reference/rest/v1/projects";

static IMAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{IMAGE_NAME}$")).expect("valid image name regex"));

static IMAGE_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "^projects/(?P<project>{PROJECT_ID})/global/images/(?P<image>{IMAGE_NAME})$"
    ))
    .expect("valid image URI regex")
});

static PROJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{PROJECT_ID}$")).expect("valid project id regex"));

fn invalid(kind: &'static str, value: &str, reference: &'static str) -> ValidationError {
    ValidationError {
        kind,
        value: value.to_string(),
        reference,
    }
}

pub fn validate_image_name(value: &str) -> Result<(), ValidationError> {
    if IMAGE_NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("Image name", value, IMAGES_REFERENCE))
    }
}

/// Splits `projects/<project>/global/images/<image>` into project and image.
pub fn validate_image_uri(value: &str) -> Result<(String, String), ValidationError> {
    let caps = IMAGE_URI_RE
        .captures(value)
        .ok_or_else(|| invalid("Image URI", value, IMAGES_REFERENCE))?;
    Ok((caps["project"].to_string(), caps["image"].to_string()))
}

/// Snapshot names follow the same rules as image names.
pub fn validate_snapshot_name(value: &str) -> Result<(), ValidationError> {
    if IMAGE_NAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("Snapshot name", value, SNAPSHOTS_REFERENCE))
    }
}

pub fn validate_project_id(value: &str) -> Result<(), ValidationError> {
    if PROJECT_ID_RE.is_match(value) {
        Ok(())
    } else {
        Err(invalid("Project ID", value, PROJECTS_REFERENCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_names() {
        assert!(validate_image_name("debian-12").is_ok());
        assert!(validate_image_name("a").is_ok());
        assert!(validate_image_name(&"a".repeat(63)).is_ok());
        assert!(validate_image_name(&"a".repeat(64)).is_err());
        assert!(validate_image_name("Debian").is_err());
        assert!(validate_image_name("trailing-").is_err());
        assert!(validate_image_name("1st").is_err());
    }

    #[test]
    fn image_uris() {
        assert_eq!(
            validate_image_uri("projects/my-project/global/images/debian-12").unwrap(),
            ("my-project".to_string(), "debian-12".to_string())
        );
        assert_eq!(
            validate_image_uri("projects/google.com:proj-x/global/images/img").unwrap().0,
            "google.com:proj-x"
        );
        assert!(validate_image_uri("global/images/debian-12").is_err());
        assert!(validate_image_uri("projects/p/global/images/debian-12").is_err());
    }

    #[test]
    fn snapshot_names() {
        assert!(validate_snapshot_name("snap-1").is_ok());
        assert!(validate_snapshot_name("projects/p/global/snapshots/snap-1").is_err());
    }

    #[test]
    fn project_ids() {
        assert!(validate_project_id("my-project").is_ok());
        assert!(validate_project_id("google.com:my-project").is_ok());
        assert!(validate_project_id("short").is_err());
        assert!(validate_project_id("ends-with-").is_err());
        assert!(validate_project_id("UPPER-case").is_err());
    }

    #[test]
    fn error_message_names_reference() {
        let err = validate_image_name("Bad").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Image name `Bad` must conform to https://cloud.google.com/compute/docs/reference/rest/v1/images"
        );
    }
}
