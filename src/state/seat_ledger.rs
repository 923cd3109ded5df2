//! Seat reservation state machine.
//!
//! `available -> locked(holder, locked_at) -> booked(order)`, with `locked`
//! falling back to `available` on release, expiry or cancellation. Locks
//! expire lazily: a lock older than the TTL reads as available even before
//! the sweeper clears it.
//!
//! Operations never mutate their input. They return updated copies of the
//! seats that changed, or an error and no changes at all.

use std::collections::HashSet;

use thiserror::Error;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::dao::models::{SeatStatus, ShowtimeSeatEntity};

/// Limits applied to seat requests.
#[derive(Debug, Clone, Copy)]
pub struct LockPolicy {
    pub ttl: Duration,
    pub max_seats: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeatLockError {
    #[error("at least one seat must be selected")]
    Empty,
    #[error("{requested} seats requested, at most {max} per order")]
    TooMany { requested: usize, max: usize },
    #[error("seat {0} is listed more than once")]
    Duplicate(Uuid),
    #[error("seats not part of this showtime: {}", join(.0))]
    UnknownSeats(Vec<Uuid>),
    #[error("seats unavailable: {}", .0.join(", "))]
    Unavailable(Vec<String>),
    #[error("seats not held by this checkout: {}", .0.join(", "))]
    NotHeld(Vec<String>),
}

fn join(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whether the seat carries a lock that has not yet expired.
pub fn is_live_lock(seat: &ShowtimeSeatEntity, now: OffsetDateTime, ttl: Duration) -> bool {
    seat.status == SeatStatus::Locked
        && seat
            .locked_at
            .is_some_and(|locked_at| now < locked_at + ttl)
}

/// Status as seen by customers, with expired locks reading as available.
pub fn effective_status(seat: &ShowtimeSeatEntity, now: OffsetDateTime, ttl: Duration) -> SeatStatus {
    match seat.status {
        SeatStatus::Locked if !is_live_lock(seat, now, ttl) => SeatStatus::Available,
        status => status,
    }
}

/// Resolve the requested ids against the showtime's seats.
fn select<'a>(
    seats: &'a [ShowtimeSeatEntity],
    seat_ids: &[Uuid],
    max_seats: usize,
) -> Result<Vec<&'a ShowtimeSeatEntity>, SeatLockError> {
    if seat_ids.is_empty() {
        return Err(SeatLockError::Empty);
    }
    if seat_ids.len() > max_seats {
        return Err(SeatLockError::TooMany {
            requested: seat_ids.len(),
            max: max_seats,
        });
    }

    let mut seen = HashSet::with_capacity(seat_ids.len());
    if let Some(duplicate) = seat_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(SeatLockError::Duplicate(*duplicate));
    }

    let mut selected = Vec::with_capacity(seat_ids.len());
    let mut unknown = Vec::new();
    for id in seat_ids {
        match seats.iter().find(|seat| seat.id == *id) {
            Some(seat) => selected.push(seat),
            None => unknown.push(*id),
        }
    }

    if unknown.is_empty() {
        Ok(selected)
    } else {
        Err(SeatLockError::UnknownSeats(unknown))
    }
}

fn cleared(seat: &ShowtimeSeatEntity) -> ShowtimeSeatEntity {
    ShowtimeSeatEntity {
        status: SeatStatus::Available,
        locked_by: None,
        locked_at: None,
        ..seat.clone()
    }
}

/// Lock every requested seat for `holder`, or none of them.
///
/// Seats already locked by the same holder have their lock refreshed.
pub fn lock(
    seats: &[ShowtimeSeatEntity],
    holder: &str,
    seat_ids: &[Uuid],
    now: OffsetDateTime,
    policy: LockPolicy,
) -> Result<Vec<ShowtimeSeatEntity>, SeatLockError> {
    let selected = select(seats, seat_ids, policy.max_seats)?;

    let unavailable: Vec<String> = selected
        .iter()
        .filter(|seat| match effective_status(seat, now, policy.ttl) {
            SeatStatus::Available => false,
            SeatStatus::Locked => seat.locked_by.as_deref() != Some(holder),
            SeatStatus::Booked => true,
        })
        .map(|seat| seat.label())
        .collect();
    if !unavailable.is_empty() {
        return Err(SeatLockError::Unavailable(unavailable));
    }

    Ok(selected
        .into_iter()
        .map(|seat| ShowtimeSeatEntity {
            status: SeatStatus::Locked,
            locked_by: Some(holder.to_owned()),
            locked_at: Some(now),
            ..seat.clone()
        })
        .collect())
}

/// Give back seats locked by `holder`. Seats that already read as available are skipped.
pub fn release(
    seats: &[ShowtimeSeatEntity],
    holder: &str,
    seat_ids: &[Uuid],
    now: OffsetDateTime,
    policy: LockPolicy,
) -> Result<Vec<ShowtimeSeatEntity>, SeatLockError> {
    let selected = select(seats, seat_ids, policy.max_seats)?;

    let mut released = Vec::with_capacity(selected.len());
    let mut not_held = Vec::new();
    for seat in selected {
        let held = seat.status == SeatStatus::Locked && seat.locked_by.as_deref() == Some(holder);
        if held {
            released.push(cleared(seat));
        } else if effective_status(seat, now, policy.ttl) != SeatStatus::Available {
            not_held.push(seat.label());
        }
    }

    if not_held.is_empty() {
        Ok(released)
    } else {
        Err(SeatLockError::NotHeld(not_held))
    }
}

/// Turn the holder's live locks into bookings for `order_id`.
pub fn commit(
    seats: &[ShowtimeSeatEntity],
    holder: &str,
    seat_ids: &[Uuid],
    order_id: Uuid,
    now: OffsetDateTime,
    policy: LockPolicy,
) -> Result<Vec<ShowtimeSeatEntity>, SeatLockError> {
    let selected = select(seats, seat_ids, policy.max_seats)?;

    let not_held: Vec<String> = selected
        .iter()
        .filter(|seat| {
            !is_live_lock(seat, now, policy.ttl) || seat.locked_by.as_deref() != Some(holder)
        })
        .map(|seat| seat.label())
        .collect();
    if !not_held.is_empty() {
        return Err(SeatLockError::NotHeld(not_held));
    }

    Ok(selected
        .into_iter()
        .map(|seat| ShowtimeSeatEntity {
            status: SeatStatus::Booked,
            order_id: Some(order_id),
            locked_by: None,
            locked_at: None,
            ..seat.clone()
        })
        .collect())
}

/// Clear every lock whose TTL has elapsed.
pub fn expire(
    seats: &[ShowtimeSeatEntity],
    now: OffsetDateTime,
    ttl: Duration,
) -> Vec<ShowtimeSeatEntity> {
    seats
        .iter()
        .filter(|seat| seat.status == SeatStatus::Locked && !is_live_lock(seat, now, ttl))
        .map(cleared)
        .collect()
}

/// Clear every lock regardless of age. Booked seats are untouched.
pub fn release_all(seats: &[ShowtimeSeatEntity]) -> Vec<ShowtimeSeatEntity> {
    seats
        .iter()
        .filter(|seat| seat.status == SeatStatus::Locked)
        .map(cleared)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::SeatEntity;
    use time::macros::datetime;

    const POLICY: LockPolicy = LockPolicy {
        ttl: Duration::minutes(3),
        max_seats: 4,
    };
    const NOW: OffsetDateTime = datetime!(2025-06-10 17:00 UTC);

    fn seats(count: u16) -> Vec<ShowtimeSeatEntity> {
        let showtime_id = Uuid::new_v4();
        (0..count)
            .map(|column| {
                let seat = SeatEntity {
                    id: Uuid::new_v4(),
                    theater_id: Uuid::new_v4(),
                    row_name: "A".into(),
                    row_index: 0,
                    column,
                    seat_number: column + 1,
                    description: None,
                };
                ShowtimeSeatEntity::seed(showtime_id, &seat, 50_000)
            })
            .collect()
    }

    fn apply(seats: &mut [ShowtimeSeatEntity], changes: Vec<ShowtimeSeatEntity>) {
        for change in changes {
            if let Some(seat) = seats.iter_mut().find(|seat| seat.id == change.id) {
                *seat = change;
            }
        }
    }

    #[test]
    fn lock_marks_every_requested_seat() {
        let seats = seats(3);
        let ids = [seats[0].id, seats[2].id];

        let locked = lock(&seats, "alice", &ids, NOW, POLICY).unwrap();

        assert_eq!(locked.len(), 2);
        assert!(locked.iter().all(|seat| seat.status == SeatStatus::Locked
            && seat.locked_by.as_deref() == Some("alice")
            && seat.locked_at == Some(NOW)));
    }

    #[test]
    fn lock_is_all_or_nothing() {
        let mut seats = seats(3);
        let taken = lock(&seats, "bob", &[seats[1].id], NOW, POLICY).unwrap();
        apply(&mut seats, taken);

        let err = lock(&seats, "alice", &[seats[0].id, seats[1].id], NOW, POLICY).unwrap_err();
        assert_eq!(err, SeatLockError::Unavailable(vec!["A2".into()]));
    }

    #[test]
    fn same_holder_refreshes_lock() {
        let mut seats = seats(1);
        let first = lock(&seats, "alice", &[seats[0].id], NOW, POLICY).unwrap();
        apply(&mut seats, first);

        let later = NOW + Duration::minutes(2);
        let refreshed = lock(&seats, "alice", &[seats[0].id], later, POLICY).unwrap();
        assert_eq!(refreshed[0].locked_at, Some(later));
    }

    #[test]
    fn expired_lock_reads_as_available_and_can_be_taken() {
        let mut seats = seats(1);
        let taken = lock(&seats, "bob", &[seats[0].id], NOW, POLICY).unwrap();
        apply(&mut seats, taken);

        let just_before = NOW + Duration::minutes(3) - Duration::SECOND;
        let at_expiry = NOW + Duration::minutes(3);
        assert_eq!(
            effective_status(&seats[0], just_before, POLICY.ttl),
            SeatStatus::Locked
        );
        assert_eq!(
            effective_status(&seats[0], at_expiry, POLICY.ttl),
            SeatStatus::Available
        );

        let stolen = lock(&seats, "alice", &[seats[0].id], at_expiry, POLICY).unwrap();
        assert_eq!(stolen[0].locked_by.as_deref(), Some("alice"));
    }

    #[test]
    fn request_shape_is_validated() {
        let seats = seats(6);
        let ids: Vec<Uuid> = seats.iter().map(|seat| seat.id).collect();

        assert_eq!(lock(&seats, "a", &[], NOW, POLICY), Err(SeatLockError::Empty));
        assert_eq!(
            lock(&seats, "a", &ids[..5], NOW, POLICY),
            Err(SeatLockError::TooMany {
                requested: 5,
                max: 4
            })
        );
        assert_eq!(
            lock(&seats, "a", &[ids[0], ids[0]], NOW, POLICY),
            Err(SeatLockError::Duplicate(ids[0]))
        );
        let stranger = Uuid::new_v4();
        assert_eq!(
            lock(&seats, "a", &[ids[0], stranger], NOW, POLICY),
            Err(SeatLockError::UnknownSeats(vec![stranger]))
        );
    }

    #[test]
    fn release_skips_available_and_rejects_foreign_locks() {
        let mut seats = seats(3);
        let alice = lock(&seats, "alice", &[seats[0].id], NOW, POLICY).unwrap();
        let bob = lock(&seats, "bob", &[seats[1].id], NOW, POLICY).unwrap();
        apply(&mut seats, alice);
        apply(&mut seats, bob);

        let released = release(&seats, "alice", &[seats[0].id, seats[2].id], NOW, POLICY).unwrap();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].status, SeatStatus::Available);
        assert!(released[0].locked_by.is_none());

        let err = release(&seats, "alice", &[seats[0].id, seats[1].id], NOW, POLICY).unwrap_err();
        assert_eq!(err, SeatLockError::NotHeld(vec!["A2".into()]));
    }

    #[test]
    fn commit_requires_live_lock_of_holder() {
        let mut seats = seats(2);
        let order_id = Uuid::new_v4();
        let held = lock(&seats, "alice", &[seats[0].id, seats[1].id], NOW, POLICY).unwrap();
        apply(&mut seats, held);

        let err = commit(
            &seats,
            "bob",
            &[seats[0].id],
            order_id,
            NOW,
            POLICY,
        )
        .unwrap_err();
        assert!(matches!(err, SeatLockError::NotHeld(_)));

        let late = NOW + Duration::minutes(5);
        assert!(commit(&seats, "alice", &[seats[0].id], order_id, late, POLICY).is_err());

        let booked = commit(
            &seats,
            "alice",
            &[seats[0].id, seats[1].id],
            order_id,
            NOW + Duration::minutes(1),
            POLICY,
        )
        .unwrap();
        assert!(booked.iter().all(|seat| seat.status == SeatStatus::Booked
            && seat.order_id == Some(order_id)
            && seat.locked_by.is_none()));
    }

    #[test]
    fn booked_seat_cannot_be_locked_or_released() {
        let mut seats = seats(1);
        let held = lock(&seats, "alice", &[seats[0].id], NOW, POLICY).unwrap();
        apply(&mut seats, held);
        let booked = commit(&seats, "alice", &[seats[0].id], Uuid::new_v4(), NOW, POLICY).unwrap();
        apply(&mut seats, booked);

        assert!(matches!(
            lock(&seats, "bob", &[seats[0].id], NOW, POLICY),
            Err(SeatLockError::Unavailable(_))
        ));
        assert!(matches!(
            release(&seats, "alice", &[seats[0].id], NOW, POLICY),
            Err(SeatLockError::NotHeld(_))
        ));
    }

    #[test]
    fn expire_only_clears_stale_locks() {
        let mut seats = seats(3);
        let early = lock(&seats, "alice", &[seats[0].id], NOW, POLICY).unwrap();
        let later = lock(
            &seats,
            "bob",
            &[seats[1].id],
            NOW + Duration::minutes(2),
            POLICY,
        )
        .unwrap();
        apply(&mut seats, early);
        apply(&mut seats, later);

        let expired = expire(&seats, NOW + Duration::minutes(4), POLICY.ttl);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, seats[0].id);
        assert_eq!(expired[0].status, SeatStatus::Available);
    }

    #[test]
    fn release_all_keeps_bookings() {
        let mut seats = seats(2);
        let held = lock(&seats, "alice", &[seats[0].id, seats[1].id], NOW, POLICY).unwrap();
        apply(&mut seats, held);
        let booked = commit(&seats, "alice", &[seats[1].id], Uuid::new_v4(), NOW, POLICY).unwrap();
        apply(&mut seats, booked);

        let released = release_all(&seats);
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].id, seats[0].id);
    }
}
