//! Showtime placement rules.
//!
//! Every check here is pure: callers load the competing showtimes and the
//! functions decide whether a new slot fits. Validation problems with the
//! request itself are [`ScheduleViolation`]s; clashes with existing
//! showtimes are [`SchedulingConflict`]s.

use thiserror::Error;
use time::{Date, Duration, Time};
use uuid::Uuid;

use crate::dao::{
    calendar::{format_date, format_time},
    models::{MovieEntity, ShowtimeEntity, ShowtimeStatus},
};

/// Start and end of a screening on its show date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: Time,
    pub end: Time,
}

impl Slot {
    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    fn of(showtime: &ShowtimeEntity) -> Self {
        Self {
            start: showtime.start_time,
            end: showtime.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleViolation {
    #[error(
        "showtimes for {day} can no longer be scheduled (today is {current})",
        day = format_date(*.show_date),
        current = format_date(*.today)
    )]
    DateNotInFuture { show_date: Date, today: Date },
    #[error(
        "show date {day} is outside the screening window {from}..={until}",
        day = format_date(*.show_date),
        from = format_date(*.release),
        until = format_date(*.last)
    )]
    OutsideScreeningWindow {
        show_date: Date,
        release: Date,
        last: Date,
    },
    #[error("theater is not active")]
    TheaterInactive,
    #[error("end time must be after start time")]
    EndNotAfterStart,
    #[error("showtime would run past midnight")]
    CrossesMidnight,
    #[error("slot of {slot_minutes} minutes is shorter than the movie ({duration_minutes} minutes)")]
    ShorterThanMovie {
        slot_minutes: i64,
        duration_minutes: u16,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingConflict {
    #[error(
        "overlaps showtime {showtime_id} ({begins}-{ends})",
        begins = format_time(*.start),
        ends = format_time(*.end)
    )]
    Overlap {
        showtime_id: Uuid,
        start: Time,
        end: Time,
    },
    #[error(
        "needs at least {required_minutes} minutes between screenings, only {gap_minutes} left around showtime {showtime_id}"
    )]
    TooClose {
        showtime_id: Uuid,
        gap_minutes: i64,
        required_minutes: i64,
    },
    #[error(
        "same movie already starts at {begins} in showtime {showtime_id}; starts must be {required_minutes} minutes apart",
        begins = format_time(*.start)
    )]
    SameMovieTooClose {
        showtime_id: Uuid,
        start: Time,
        required_minutes: i64,
    },
}

/// Ensure the show date is bookable today and inside the movie's run.
pub fn check_show_date(
    show_date: Date,
    today: Date,
    movie: &MovieEntity,
) -> Result<(), ScheduleViolation> {
    if show_date <= today {
        return Err(ScheduleViolation::DateNotInFuture { show_date, today });
    }
    if show_date < movie.release_date || show_date > movie.last_screen_date {
        return Err(ScheduleViolation::OutsideScreeningWindow {
            show_date,
            release: movie.release_date,
            last: movie.last_screen_date,
        });
    }
    Ok(())
}

/// Build the slot, defaulting the end to `start + duration`.
pub fn resolve_slot(
    start: Time,
    end: Option<Time>,
    duration_minutes: u16,
) -> Result<Slot, ScheduleViolation> {
    let duration = Duration::minutes(i64::from(duration_minutes));
    let end = match end {
        Some(end) if end <= start => return Err(ScheduleViolation::EndNotAfterStart),
        Some(end) => end,
        None => {
            // `Time` arithmetic wraps at midnight.
            let end = start + duration;
            if end <= start {
                return Err(ScheduleViolation::CrossesMidnight);
            }
            end
        }
    };

    let slot = Slot { start, end };
    if slot.length() < duration {
        return Err(ScheduleViolation::ShorterThanMovie {
            slot_minutes: slot.length().whole_minutes(),
            duration_minutes,
        });
    }
    Ok(slot)
}

/// Check a slot against the showtimes already placed in the same theater on the same day.
pub fn check_theater_slot<'a>(
    slot: Slot,
    existing: impl IntoIterator<Item = &'a ShowtimeEntity>,
    min_gap: Duration,
) -> Result<(), SchedulingConflict> {
    for other in active(existing) {
        let taken = Slot::of(other);
        if slot.start < taken.end && slot.end > taken.start {
            return Err(SchedulingConflict::Overlap {
                showtime_id: other.id,
                start: taken.start,
                end: taken.end,
            });
        }

        let gap = if slot.start >= taken.end {
            slot.start - taken.end
        } else {
            taken.start - slot.end
        };
        if gap < min_gap {
            return Err(SchedulingConflict::TooClose {
                showtime_id: other.id,
                gap_minutes: gap.whole_minutes(),
                required_minutes: min_gap.whole_minutes(),
            });
        }
    }
    Ok(())
}

/// Check the start against showtimes of the same movie in the same branch on the same day.
pub fn check_movie_spacing<'a>(
    start: Time,
    same_movie: impl IntoIterator<Item = &'a ShowtimeEntity>,
    spacing: Duration,
) -> Result<(), SchedulingConflict> {
    for other in active(same_movie) {
        if (start - other.start_time).abs() < spacing {
            return Err(SchedulingConflict::SameMovieTooClose {
                showtime_id: other.id,
                start: other.start_time,
                required_minutes: spacing.whole_minutes(),
            });
        }
    }
    Ok(())
}

fn active<'a>(
    showtimes: impl IntoIterator<Item = &'a ShowtimeEntity>,
) -> impl Iterator<Item = &'a ShowtimeEntity> {
    showtimes
        .into_iter()
        .filter(|showtime| showtime.status != ShowtimeStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{AuditStamp, MovieStatus};
    use time::macros::{date, datetime, time};

    const GAP: Duration = Duration::minutes(10);

    fn movie(duration_minutes: u16) -> MovieEntity {
        MovieEntity {
            id: Uuid::new_v4(),
            name: "Arrival".into(),
            slug: "arrival".into(),
            age_tag: "T13".into(),
            duration_minutes,
            release_date: date!(2025 - 06 - 01),
            last_screen_date: date!(2025 - 06 - 30),
            poster_url: None,
            trailer_url: None,
            rating: 8.0,
            description: String::new(),
            status: MovieStatus::NowShowing,
            audit: AuditStamp::new(datetime!(2025-05-01 00:00 UTC), "tester"),
        }
    }

    fn existing(start: Time, end: Time) -> ShowtimeEntity {
        ShowtimeEntity {
            id: Uuid::new_v4(),
            theater_id: Uuid::new_v4(),
            movie_id: Uuid::new_v4(),
            show_date: date!(2025 - 06 - 10),
            start_time: start,
            end_time: end,
            status: ShowtimeStatus::Scheduled,
            open_for_orders: false,
            cancel_reason: None,
            audit: AuditStamp::new(datetime!(2025-05-01 00:00 UTC), "tester"),
        }
    }

    fn slot(start: Time, end: Time) -> Slot {
        Slot { start, end }
    }

    #[test]
    fn show_date_must_be_after_today() {
        let movie = movie(120);
        let today = date!(2025 - 06 - 10);

        assert!(matches!(
            check_show_date(today, today, &movie),
            Err(ScheduleViolation::DateNotInFuture { .. })
        ));
        assert!(check_show_date(date!(2025 - 06 - 11), today, &movie).is_ok());
    }

    #[test]
    fn show_date_must_fall_inside_screening_window() {
        let movie = movie(120);
        let today = date!(2025 - 05 - 20);

        assert!(check_show_date(date!(2025 - 06 - 01), today, &movie).is_ok());
        assert!(check_show_date(date!(2025 - 06 - 30), today, &movie).is_ok());
        assert!(matches!(
            check_show_date(date!(2025 - 05 - 31), today, &movie),
            Err(ScheduleViolation::OutsideScreeningWindow { .. })
        ));
        assert!(matches!(
            check_show_date(date!(2025 - 07 - 01), today, &movie),
            Err(ScheduleViolation::OutsideScreeningWindow { .. })
        ));
    }

    #[test]
    fn end_defaults_to_movie_duration() {
        let slot = resolve_slot(time!(18:00), None, 135).unwrap();
        assert_eq!(slot.end, time!(20:15));
    }

    #[test]
    fn rejects_inverted_short_and_overnight_slots() {
        assert_eq!(
            resolve_slot(time!(18:00), Some(time!(17:00)), 90),
            Err(ScheduleViolation::EndNotAfterStart)
        );
        assert!(matches!(
            resolve_slot(time!(18:00), Some(time!(19:00)), 90),
            Err(ScheduleViolation::ShorterThanMovie {
                slot_minutes: 60,
                ..
            })
        ));
        assert_eq!(
            resolve_slot(time!(23:00), None, 90),
            Err(ScheduleViolation::CrossesMidnight)
        );
    }

    #[test]
    fn longer_slot_than_movie_is_accepted() {
        let slot = resolve_slot(time!(18:00), Some(time!(20:30)), 120).unwrap();
        assert_eq!(slot.length(), Duration::minutes(150));
    }

    #[test]
    fn overlapping_slot_is_a_conflict() {
        let taken = [existing(time!(10:00), time!(12:00))];
        let result = check_theater_slot(slot(time!(11:00), time!(13:00)), &taken, GAP);
        assert!(matches!(result, Err(SchedulingConflict::Overlap { showtime_id, .. }) if showtime_id == taken[0].id));

        let enclosing = check_theater_slot(slot(time!(09:00), time!(13:00)), &taken, GAP);
        assert!(matches!(enclosing, Err(SchedulingConflict::Overlap { .. })));
    }

    #[test]
    fn back_to_back_is_a_conflict() {
        let taken = [existing(time!(10:00), time!(12:00))];
        let result = check_theater_slot(slot(time!(12:00), time!(14:00)), &taken, GAP);
        assert!(matches!(
            result,
            Err(SchedulingConflict::TooClose { gap_minutes: 0, .. })
        ));
    }

    #[test]
    fn gap_shorter_than_minimum_is_a_conflict_on_both_sides() {
        let taken = [existing(time!(10:00), time!(12:00))];

        let after = check_theater_slot(slot(time!(12:09), time!(14:00)), &taken, GAP);
        assert!(matches!(
            after,
            Err(SchedulingConflict::TooClose { gap_minutes: 9, .. })
        ));

        let before = check_theater_slot(slot(time!(08:00), time!(09:55)), &taken, GAP);
        assert!(matches!(
            before,
            Err(SchedulingConflict::TooClose { gap_minutes: 5, .. })
        ));
    }

    #[test]
    fn gap_of_exactly_minimum_is_allowed() {
        let taken = [existing(time!(10:00), time!(12:00))];
        assert!(check_theater_slot(slot(time!(12:10), time!(14:00)), &taken, GAP).is_ok());
        assert!(check_theater_slot(slot(time!(07:50), time!(09:50)), &taken, GAP).is_ok());
    }

    #[test]
    fn cancelled_showtimes_do_not_block() {
        let mut cancelled = existing(time!(10:00), time!(12:00));
        cancelled.status = ShowtimeStatus::Cancelled;
        assert!(check_theater_slot(slot(time!(10:30), time!(12:30)), [&cancelled], GAP).is_ok());
        assert!(check_movie_spacing(time!(10:00), [&cancelled], Duration::minutes(30)).is_ok());
    }

    #[test]
    fn same_movie_starts_must_be_spaced() {
        let spacing = Duration::minutes(30);
        let taken = [existing(time!(18:00), time!(20:00))];

        assert!(matches!(
            check_movie_spacing(time!(18:29), &taken, spacing),
            Err(SchedulingConflict::SameMovieTooClose { .. })
        ));
        assert!(matches!(
            check_movie_spacing(time!(17:31), &taken, spacing),
            Err(SchedulingConflict::SameMovieTooClose { .. })
        ));
        assert!(check_movie_spacing(time!(18:30), &taken, spacing).is_ok());
        assert!(check_movie_spacing(time!(17:30), &taken, spacing).is_ok());
    }
}
