use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

use crate::{
    dao::storage::StorageError,
    state::{
        scheduling::{ScheduleViolation, SchedulingConflict},
        seat_ledger::SeatLockError,
    },
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Request clashes with existing data (schedule or seat reservations).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ScheduleViolation> for ServiceError {
    fn from(err: ScheduleViolation) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<SchedulingConflict> for ServiceError {
    fn from(err: SchedulingConflict) -> Self {
        ServiceError::Conflict(err.to_string())
    }
}

impl From<SeatLockError> for ServiceError {
    fn from(err: SeatLockError) -> Self {
        match err {
            SeatLockError::Unavailable(_) | SeatLockError::NotHeld(_) => {
                ServiceError::Conflict(err.to_string())
            }
            SeatLockError::Empty
            | SeatLockError::TooMany { .. }
            | SeatLockError::Duplicate(_)
            | SeatLockError::UnknownSeats(_) => ServiceError::InvalidInput(err.to_string()),
        }
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Unauthorized access attempt.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::InvalidState(message) | ServiceError::Conflict(message) => {
                AppError::Conflict(message)
            }
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Timeout => AppError::ServiceUnavailable("operation timed out".into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::time;
    use uuid::Uuid;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn scheduling_failures_map_to_400_and_409() {
        assert_eq!(
            status_of(ScheduleViolation::TheaterInactive.into()),
            StatusCode::BAD_REQUEST
        );
        let conflict = SchedulingConflict::Overlap {
            showtime_id: Uuid::nil(),
            start: time!(10:00),
            end: time!(12:00),
        };
        assert_eq!(status_of(conflict.into()), StatusCode::CONFLICT);
    }

    #[test]
    fn seat_errors_split_between_bad_request_and_conflict() {
        assert_eq!(status_of(SeatLockError::Empty.into()), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(SeatLockError::Unavailable(vec!["A1".into()]).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::Timeout),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
