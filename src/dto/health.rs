use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Current venue time (RFC 3339).
    pub server_time: String,
    /// Connected realtime subscribers.
    pub sse_subscribers: usize,
}

impl HealthResponse {
    pub fn new(degraded: bool, server_time: String, sse_subscribers: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            server_time,
            sse_subscribers,
        }
    }
}
