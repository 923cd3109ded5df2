use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dao::models::{ShowtimeEntity, ShowtimeSeatEntity},
    dto::{
        seat::SeatView,
        showtime::ShowtimeSummary,
        sse::{SeatsUpdatedEvent, ServerEvent, ShowtimeUpdatedEvent, SystemStatus},
    },
    state::{SharedState, seat_ledger::effective_status},
};

const EVENT_SEATS_UPDATED: &str = "seats.updated";
const EVENT_SHOWTIME_UPDATED: &str = "showtime.updated";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Broadcast the new state of seats that changed on a showtime.
pub fn broadcast_seats_updated(
    state: &SharedState,
    showtime_id: Uuid,
    seats: &[ShowtimeSeatEntity],
) {
    if seats.is_empty() {
        return;
    }
    let now = state.now();
    let ttl = state.rules().seat_lock_ttl;
    let payload = SeatsUpdatedEvent {
        showtime_id,
        seats: seats
            .iter()
            .map(|seat| SeatView::new(seat, effective_status(seat, now, ttl)))
            .collect(),
    };
    send_public_event(state, EVENT_SEATS_UPDATED, &payload);
}

/// Broadcast a showtime lifecycle change (`created`, `opened`, `cancelled`, `finished`, `deleted`).
pub fn broadcast_showtime_updated(state: &SharedState, change: &str, showtime: &ShowtimeEntity) {
    let payload = ShowtimeUpdatedEvent {
        change: change.to_string(),
        showtime: showtime.into(),
    };
    send_public_event(state, EVENT_SHOWTIME_UPDATED, &payload);
}

/// Broadcast a degraded-mode transition.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    send_public_event(state, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn system_status_reaches_subscribers() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();

        broadcast_system_status(&state, true);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some(EVENT_SYSTEM_STATUS));
        assert_eq!(event.data, r#"{"degraded":true}"#);
    }

    #[tokio::test]
    async fn empty_seat_changes_are_not_broadcast() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.public_sse().subscribe();

        broadcast_seats_updated(&state, Uuid::new_v4(), &[]);

        assert!(receiver.try_recv().is_err());
    }
}
