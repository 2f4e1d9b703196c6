use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of currently connected scoreboard viewers.
    pub viewers: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(viewers: usize) -> Self {
        Self {
            status: "ok".to_string(),
            viewers,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(viewers: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            viewers,
        }
    }
}
