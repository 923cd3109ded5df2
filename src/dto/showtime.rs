use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        calendar::{format_date, format_time},
        models::{ShowtimeEntity, ShowtimeStatus},
    },
    dto::validation::{validate_clock_time, validate_date, validate_not_blank},
};

/// Payload to place a new showtime in a theater.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateShowtimeRequest {
    pub theater_id: Uuid,
    pub movie_id: Uuid,
    /// `YYYY-MM-DD`, strictly after today.
    #[validate(custom(function = "validate_date"))]
    pub show_date: String,
    /// `HH:MM`.
    #[validate(custom(function = "validate_clock_time"))]
    pub start_time: String,
    /// `HH:MM`; defaults to the start time plus the movie duration.
    #[serde(default)]
    #[validate(custom(function = "validate_clock_time"))]
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CancelShowtimeRequest {
    #[validate(length(min = 1, max = 500), custom(function = "validate_not_blank"))]
    pub reason: String,
}

/// Optional date filter (`YYYY-MM-DD`).
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    #[validate(custom(function = "validate_date"))]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShowtimeSummary {
    pub id: Uuid,
    pub theater_id: Uuid,
    pub movie_id: Uuid,
    pub show_date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: ShowtimeStatus,
    pub open_for_orders: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl From<&ShowtimeEntity> for ShowtimeSummary {
    fn from(showtime: &ShowtimeEntity) -> Self {
        Self {
            id: showtime.id,
            theater_id: showtime.theater_id,
            movie_id: showtime.movie_id,
            show_date: format_date(showtime.show_date),
            start_time: format_time(showtime.start_time),
            end_time: format_time(showtime.end_time),
            status: showtime.status,
            open_for_orders: showtime.open_for_orders,
            cancel_reason: showtime.cancel_reason.clone(),
        }
    }
}

/// Showtime joined with the names of its movie, theater and branch.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShowtimeDetail {
    pub showtime: ShowtimeSummary,
    pub movie_name: String,
    pub duration_minutes: u16,
    pub theater_name: String,
    pub theater_kind: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    /// Seats currently selectable, counting expired locks as free.
    pub seats_available: usize,
    pub seats_total: usize,
}

/// Showtime entry of a per-branch listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShowtimeListing {
    pub id: Uuid,
    pub movie_id: Uuid,
    pub theater_id: Uuid,
    pub theater_name: String,
    pub show_date: String,
    pub start_time: String,
    pub end_time: String,
    pub status: ShowtimeStatus,
    pub open_for_orders: bool,
}

/// Showtimes of a movie grouped by branch.
#[derive(Debug, Serialize, ToSchema)]
pub struct BranchShowtimes {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub showtimes: Vec<ShowtimeListing>,
}
