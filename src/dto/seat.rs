use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{SeatStatus, ShowtimeSeatEntity},
    dto::validation::validate_holder,
};

/// Seats picked by a checkout session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SeatSelectionRequest {
    /// Checkout session identifier owning the locks.
    #[validate(custom(function = "validate_holder"))]
    pub holder: String,
    /// Showtime seat ids.
    pub seat_ids: Vec<Uuid>,
}

/// Seat as displayed on the seat map.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeatView {
    /// Showtime seat id used for lock and order requests.
    pub id: Uuid,
    pub seat_id: Uuid,
    pub label: String,
    pub column: u16,
    pub seat_number: u16,
    pub ticket_price: u32,
    pub status: SeatStatus,
}

impl SeatView {
    /// Project a seat with the status customers should see.
    pub fn new(seat: &ShowtimeSeatEntity, status: SeatStatus) -> Self {
        Self {
            id: seat.id,
            seat_id: seat.seat_id,
            label: seat.label(),
            column: seat.column,
            seat_number: seat.seat_number,
            ticket_price: seat.ticket_price,
            status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeatRowView {
    pub row_name: String,
    pub row_index: u16,
    pub seats: Vec<SeatView>,
}

/// Seat map of a showtime, rows front to back.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeatMapResponse {
    pub showtime_id: Uuid,
    /// Number of rows in the theater layout.
    pub max_row: u16,
    /// Seats in the widest row.
    pub max_column: u16,
    pub rows: Vec<SeatRowView>,
}

/// Outcome of a lock or release request.
#[derive(Debug, Serialize, ToSchema)]
pub struct SeatChangeResponse {
    pub showtime_id: Uuid,
    pub holder: String,
    pub seats: Vec<SeatView>,
    /// When the locks lapse; absent after a release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}
