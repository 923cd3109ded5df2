use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{seat::SeatView, showtime::ShowtimeSummary};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already rendered data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub stream: String,
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever seats of a showtime change state.
pub struct SeatsUpdatedEvent {
    pub showtime_id: Uuid,
    pub seats: Vec<SeatView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a showtime is created, opened, cancelled, closed or deleted.
pub struct ShowtimeUpdatedEvent {
    pub change: String,
    pub showtime: ShowtimeSummary,
}
