//! Classification of quota failures.
//!
//! The API reports exhausted CPU quota only through its message text
//! (`Quota 'N2_CPUS' exceeded. Limit: 24.0 in region us-central1.`), so the
//! match is a substring search. Everything that decides retryability from an
//! error goes through this module.

use crate::error::WorkflowError;

/// The resource name the API uses for a series' CPU quota, e.g. `N2_CPUS`.
pub fn cpu_quota_marker(series: &str) -> String {
    format!("{}_CPUS", series.to_uppercase())
}

/// Whether `err` reports exhausted CPU quota for machine `series`.
pub fn is_cpu_quota_error(err: &WorkflowError, series: &str) -> bool {
    if series.is_empty() {
        return false;
    }
    err.to_string().contains(&cpu_quota_marker(series))
}
