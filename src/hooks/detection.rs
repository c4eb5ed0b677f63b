use std::fmt;

use tracing::debug;

use crate::error::WorkflowError;

use super::{HookOutcome, WorkflowHook};

/// An operating system release as named on the command line, e.g.
/// `centos-7`, `ubuntu-1804` or `rhel-8-byol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    pub distro: String,
    pub major: String,
    pub minor: String,
}

impl OsRelease {
    pub fn parse(os: &str) -> Option<Self> {
        let lower = os.to_lowercase();
        let mut parts = lower.split('-');
        let distro = parts.next().filter(|d| !d.is_empty())?;
        let version = parts
            .next()
            .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))?;

        // Ubuntu packs year and month together: 1804 is 18.04.
        let (major, minor) = if distro == "ubuntu" && version.len() == 4 {
            version.split_at(2)
        } else {
            (version, "")
        };

        Some(Self {
            distro: distro.to_string(),
            major: major.to_string(),
            minor: minor.to_string(),
        })
    }
}

impl fmt::Display for OsRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}{}", self.distro, self.major, self.minor)
    }
}

/// Replaces a failure's message when the OS found on the disk contradicts
/// the one the user specified.
///
/// The rewrite only happens when detection produced a result, the user's
/// value parses, and the two differ in distro or major version; otherwise the
/// original error is kept.
pub struct DetectionMismatchHook {
    specified: String,
    detected: Option<OsRelease>,
}

impl DetectionMismatchHook {
    pub fn new(specified: impl Into<String>, detected: Option<OsRelease>) -> Self {
        Self {
            specified: specified.into(),
            detected,
        }
    }

    fn customize(&self, original: WorkflowError) -> WorkflowError {
        let Some(detected) = &self.detected else {
            return original;
        };
        let Some(from_user) = OsRelease::parse(&self.specified) else {
            debug!(specified = %self.specified, "could not parse specified OS; keeping original error");
            return original;
        };
        if from_user.distro == detected.distro && from_user.major == detected.major {
            return original;
        }

        debug!(cause = %original, "replacing error with detection mismatch message");
        WorkflowError::UserInput(format!(
            "\"{detected}\" was detected on your disk, but \"{}\" was specified. Please verify and re-import",
            self.specified
        ))
    }
}

impl WorkflowHook for DetectionMismatchHook {
    fn name(&self) -> &'static str {
        "detection-mismatch"
    }

    fn after_execution(&mut self, error: Option<WorkflowError>) -> HookOutcome {
        HookOutcome::pass(error.map(|e| self.customize(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(os: &str) -> Option<OsRelease> {
        OsRelease::parse(os)
    }

    fn rewrite(specified: &str, detected: Option<OsRelease>) -> String {
        let mut hook = DetectionMismatchHook::new(specified, detected);
        let outcome = hook.after_execution(Some(WorkflowError::engine("cause")));
        assert!(!outcome.want_retry);
        outcome.error.unwrap().to_string()
    }

    #[test]
    fn parses_release_names() {
        assert_eq!(
            release("ubuntu-1804"),
            Some(OsRelease {
                distro: "ubuntu".into(),
                major: "18".into(),
                minor: "04".into()
            })
        );
        assert_eq!(release("rhel-8-byol").unwrap().to_string(), "rhel-8");
        assert_eq!(release("CentOS-7").unwrap().to_string(), "centos-7");
        assert_eq!(release("not-a-distro"), None);
        assert_eq!(release("debian"), None);
    }

    #[test]
    fn keeps_original_when_detection_matches() {
        assert_eq!(rewrite("centos-7", release("centos-7")), "cause");
    }

    #[test]
    fn keeps_original_when_only_minor_version_differs() {
        assert_eq!(rewrite("ubuntu-1804", release("ubuntu-1810")), "cause");
    }

    #[test]
    fn rewrites_when_major_version_differs() {
        assert_eq!(
            rewrite("ubuntu-1804", release("ubuntu-2004")),
            "\"ubuntu-2004\" was detected on your disk, but \"ubuntu-1804\" was specified. Please verify and re-import"
        );
    }

    #[test]
    fn keeps_original_when_user_value_does_not_parse() {
        assert_eq!(rewrite("not-a-distro", release("centos-7")), "cause");
    }

    #[test]
    fn keeps_original_when_detection_empty() {
        assert_eq!(rewrite("ubuntu-1804", None), "cause");
    }

    #[test]
    fn rewrites_when_detection_contradicts_user() {
        assert_eq!(
            rewrite("ubuntu-1804", release("centos-7")),
            "\"centos-7\" was detected on your disk, but \"ubuntu-1804\" was specified. Please verify and re-import"
        );
    }

    #[test]
    fn success_passes_through() {
        let mut hook = DetectionMismatchHook::new("ubuntu-1804", release("centos-7"));
        let outcome = hook.after_execution(None);
        assert!(outcome.error.is_none());
        assert!(!outcome.want_retry);
    }
}
