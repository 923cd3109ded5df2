use tracing::warn;

use crate::{dao::calendar::format_timestamp, dto::health::HealthResponse, state::SharedState};

/// Ping the store and report whether the service runs degraded.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let mut degraded = state.is_degraded().await;
    match state.booking_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                degraded = true;
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(
        degraded,
        format_timestamp(state.now()),
        state.public_sse().subscriber_count(),
    )
}
