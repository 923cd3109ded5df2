use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        seat::{SeatChangeResponse, SeatMapResponse, SeatSelectionRequest},
        showtime::ShowtimeDetail,
    },
    error::AppError,
    services::{seat_service, showtime_service},
    state::SharedState,
};

/// Showtime details, seat map and seat locks.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/showtimes/{id}", get(get_showtime))
        .route("/showtimes/{id}/seats", get(seat_map))
        .route("/showtimes/{id}/seats/lock", post(lock_seats))
        .route("/showtimes/{id}/seats/release", post(release_seats))
}

#[utoipa::path(
    get,
    path = "/showtimes/{id}",
    tag = "showtimes",
    params(("id" = Uuid, Path, description = "Showtime identifier")),
    responses(
        (status = 200, description = "Showtime with movie, theater and branch", body = ShowtimeDetail),
        (status = 404, description = "Unknown showtime")
    )
)]
pub async fn get_showtime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ShowtimeDetail>, AppError> {
    Ok(Json(showtime_service::get_showtime(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/showtimes/{id}/seats",
    tag = "showtimes",
    params(("id" = Uuid, Path, description = "Showtime identifier")),
    responses(
        (status = 200, description = "Seat map", body = SeatMapResponse),
        (status = 404, description = "Unknown showtime")
    )
)]
pub async fn seat_map(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SeatMapResponse>, AppError> {
    Ok(Json(seat_service::seat_map(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/showtimes/{id}/seats/lock",
    tag = "showtimes",
    params(("id" = Uuid, Path, description = "Showtime identifier")),
    request_body = SeatSelectionRequest,
    responses(
        (status = 200, description = "Seats locked for the holder", body = SeatChangeResponse),
        (status = 400, description = "Empty, duplicate, unknown or too many seats"),
        (status = 409, description = "A seat is taken or the showtime is closed"),
        (status = 503, description = "Storage unavailable or lock timed out")
    )
)]
/// Lock seats for a checkout session. Either every seat is locked or none.
pub async fn lock_seats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SeatSelectionRequest>>,
) -> Result<Json<SeatChangeResponse>, AppError> {
    Ok(Json(seat_service::lock_seats(&state, id, payload).await?))
}

#[utoipa::path(
    post,
    path = "/showtimes/{id}/seats/release",
    tag = "showtimes",
    params(("id" = Uuid, Path, description = "Showtime identifier")),
    request_body = SeatSelectionRequest,
    responses(
        (status = 200, description = "Seats released", body = SeatChangeResponse),
        (status = 409, description = "A seat is held by another checkout")
    )
)]
pub async fn release_seats(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SeatSelectionRequest>>,
) -> Result<Json<SeatChangeResponse>, AppError> {
    Ok(Json(seat_service::release_seats(&state, id, payload).await?))
}
