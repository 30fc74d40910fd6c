//! Reported health of a backend service.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The liveness probe returned a 2xx response.
    Ok,
    /// The probe failed: transport error, timeout or non-2xx status.
    Unavailable,
    /// No address is configured for the service.
    Unknown,
}

impl HealthStatus {
    pub fn is_ok(self) -> bool {
        self == HealthStatus::Ok
    }
}
