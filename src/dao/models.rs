use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

use crate::dao::calendar::{clock_time, show_date};

/// Creation and last-update bookkeeping carried by staff-managed records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditStamp {
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub created_by: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub updated_by: String,
}

impl AuditStamp {
    /// Stamp a freshly created record.
    pub fn new(now: OffsetDateTime, operator: &str) -> Self {
        Self {
            created_at: now,
            created_by: operator.to_owned(),
            updated_at: now,
            updated_by: operator.to_owned(),
        }
    }

    /// Record a modification.
    pub fn touch(&mut self, now: OffsetDateTime, operator: &str) {
        self.updated_at = now;
        self.updated_by = operator.to_owned();
    }
}

/// Cinema branch (a physical venue hosting several theaters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub city: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub audit: AuditStamp,
}

/// Screening room inside a branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TheaterEntity {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub slug: String,
    /// Projection format, e.g. `2D` or `IMAX`.
    pub kind: String,
    /// Default ticket price applied to every seat when a showtime is seeded.
    pub seats_price: u32,
    /// Inactive theaters cannot receive new showtimes.
    pub active: bool,
    pub max_row: u16,
    pub max_column: u16,
    pub audit: AuditStamp,
}

/// Physical seat of a theater.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatEntity {
    pub id: Uuid,
    pub theater_id: Uuid,
    pub row_name: String,
    /// Zero-based position of the row in the theater layout.
    pub row_index: u16,
    /// Zero-based position of the seat inside its row.
    pub column: u16,
    /// Number printed on the seat, starting at 1.
    pub seat_number: u16,
    pub description: Option<String>,
}

/// Release lifecycle of a movie.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MovieStatus {
    Upcoming,
    NowShowing,
    Ended,
}

impl MovieStatus {
    /// Status a movie should have on `today` given its screening window.
    pub fn on(today: Date, release_date: Date, last_screen_date: Date) -> Self {
        if last_screen_date < today {
            MovieStatus::Ended
        } else if release_date <= today {
            MovieStatus::NowShowing
        } else {
            MovieStatus::Upcoming
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    /// Audience rating tag such as `P`, `T13` or `T18`.
    pub age_tag: String,
    pub duration_minutes: u16,
    #[serde(with = "show_date")]
    pub release_date: Date,
    #[serde(with = "show_date")]
    pub last_screen_date: Date,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub rating: f32,
    pub description: String,
    pub status: MovieStatus,
    pub audit: AuditStamp,
}

/// Concession item sold by a branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoodEntity {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShowtimeStatus {
    /// The screening has started; no more bookings.
    Finished,
    Scheduled,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowtimeEntity {
    pub id: Uuid,
    pub theater_id: Uuid,
    pub movie_id: Uuid,
    #[serde(with = "show_date")]
    pub show_date: Date,
    #[serde(with = "clock_time")]
    pub start_time: Time,
    #[serde(with = "clock_time")]
    pub end_time: Time,
    pub status: ShowtimeStatus,
    /// Set by staff once ticket sales are opened.
    pub open_for_orders: bool,
    pub cancel_reason: Option<String>,
    pub audit: AuditStamp,
}

impl ShowtimeEntity {
    /// Instant the screening starts, in the venue offset.
    pub fn starts_at(&self, offset: UtcOffset) -> OffsetDateTime {
        PrimitiveDateTime::new(self.show_date, self.start_time).assume_offset(offset)
    }

    /// Whether seats can currently be selected or paid for.
    pub fn is_bookable(&self, now: OffsetDateTime) -> bool {
        self.status == ShowtimeStatus::Scheduled
            && self.open_for_orders
            && now < self.starts_at(now.offset())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
}

/// Seat of a specific showtime, carrying its reservation state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowtimeSeatEntity {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub seat_id: Uuid,
    pub row_name: String,
    pub row_index: u16,
    pub column: u16,
    pub seat_number: u16,
    pub ticket_price: u32,
    pub status: SeatStatus,
    pub order_id: Option<Uuid>,
    /// Checkout session currently holding the lock.
    pub locked_by: Option<String>,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub locked_at: Option<OffsetDateTime>,
}

impl ShowtimeSeatEntity {
    /// Seed an available seat for a showtime from the theater layout.
    pub fn seed(showtime_id: Uuid, seat: &SeatEntity, ticket_price: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            showtime_id,
            seat_id: seat.id,
            row_name: seat.row_name.clone(),
            row_index: seat.row_index,
            column: seat.column,
            seat_number: seat.seat_number,
            ticket_price,
            status: SeatStatus::Available,
            order_id: None,
            locked_by: None,
            locked_at: None,
        }
    }

    /// Human label such as `C7`.
    pub fn label(&self) -> String {
        format!("{}{}", self.row_name, self.seat_number)
    }
}

/// Concession line attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderFoodEntity {
    pub food_id: Uuid,
    pub name: String,
    pub unit_price: u32,
    pub quantity: u16,
    pub line_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderEntity {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub holder: String,
    pub email: Option<String>,
    pub seat_ids: Vec<Uuid>,
    pub foods: Vec<OrderFoodEntity>,
    pub tickets_total: u64,
    pub foods_total: u64,
    pub total: u64,
    /// Code presented at the gate.
    pub ticket_code: String,
    /// Reference returned by the payment provider, if any.
    pub payment_reference: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn movie_status_follows_screening_window() {
        let release = date!(2025 - 05 - 10);
        let last = date!(2025 - 06 - 10);

        assert_eq!(
            MovieStatus::on(date!(2025 - 05 - 09), release, last),
            MovieStatus::Upcoming
        );
        assert_eq!(
            MovieStatus::on(release, release, last),
            MovieStatus::NowShowing
        );
        assert_eq!(MovieStatus::on(last, release, last), MovieStatus::NowShowing);
        assert_eq!(
            MovieStatus::on(date!(2025 - 06 - 11), release, last),
            MovieStatus::Ended
        );
    }

    #[test]
    fn showtime_is_bookable_until_it_starts() {
        let now = datetime!(2025-05-20 17:59 +07:00);
        let showtime = ShowtimeEntity {
            id: Uuid::new_v4(),
            theater_id: Uuid::new_v4(),
            movie_id: Uuid::new_v4(),
            show_date: date!(2025 - 05 - 20),
            start_time: time!(18:00),
            end_time: time!(20:00),
            status: ShowtimeStatus::Scheduled,
            open_for_orders: true,
            cancel_reason: None,
            audit: AuditStamp::new(now, "tester"),
        };

        assert!(showtime.is_bookable(now));
        assert!(!showtime.is_bookable(datetime!(2025-05-20 18:00 +07:00)));

        let closed = ShowtimeEntity {
            open_for_orders: false,
            ..showtime
        };
        assert!(!closed.is_bookable(now));
    }
}
