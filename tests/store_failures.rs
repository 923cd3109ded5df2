mod common;

use std::sync::Arc;

use cinema_booking_back::{
    dao::models::{SeatStatus, ShowtimeStatus},
    error::ServiceError,
    services::{maintenance, order_service, seat_service, showtime_service},
};
use common::*;
use time::{Duration, macros::datetime};

#[tokio::test]
async fn failed_booking_write_leaves_seats_locked_and_no_order() {
    let store = FlakyStore::new();
    let cinema = cinema_on(Arc::new(store.clone())).await;
    let (showtime_id, seats) = open_showtime(&cinema).await;
    let state = &cinema.state;

    seat_service::lock_seats(state, showtime_id, selection("alice", &seats[..3]))
        .await
        .unwrap();

    store.fail_next_seat_write_after(1);
    let result = order_service::place_order(state, order(showtime_id, "alice", &seats[..3])).await;
    assert!(matches!(result, Err(ServiceError::Unavailable(_))));

    let statuses = seat_statuses(&cinema, showtime_id).await;
    assert!(statuses[..3].iter().all(|(_, status)| *status == SeatStatus::Locked));
    assert!(
        order_service::list_orders(state, None)
            .await
            .unwrap()
            .is_empty()
    );

    // the locks survived, so the checkout can retry
    order_service::place_order(state, order(showtime_id, "alice", &seats[..3]))
        .await
        .unwrap();
    let statuses = seat_statuses(&cinema, showtime_id).await;
    assert!(statuses[..3].iter().all(|(_, status)| *status == SeatStatus::Booked));
}

#[tokio::test]
async fn failed_lock_write_locks_nothing() {
    let store = FlakyStore::new();
    let cinema = cinema_on(Arc::new(store.clone())).await;
    let (showtime_id, seats) = open_showtime(&cinema).await;
    let state = &cinema.state;

    store.fail_next_seat_write_after(2);
    let result = seat_service::lock_seats(state, showtime_id, selection("bob", &seats[..4])).await;
    assert!(result.is_err());
    assert!(
        seat_statuses(&cinema, showtime_id)
            .await
            .iter()
            .all(|(_, status)| *status == SeatStatus::Available)
    );

    let locked = seat_service::lock_seats(state, showtime_id, selection("bob", &seats[..4]))
        .await
        .unwrap();
    assert_eq!(locked.seats.len(), 4);
}

#[tokio::test]
async fn sweeps_skip_a_failing_showtime_and_finish_the_rest() {
    let store = FlakyStore::new();
    let cinema = cinema_on(Arc::new(store.clone())).await;
    let (morning, morning_seats) = open_showtime_at(&cinema, "10:00").await;
    let (afternoon, afternoon_seats) = open_showtime_at(&cinema, "14:00").await;
    let state = &cinema.state;

    seat_service::lock_seats(state, morning, selection("alice", &morning_seats[..1]))
        .await
        .unwrap();
    seat_service::lock_seats(state, afternoon, selection("bob", &afternoon_seats[..2]))
        .await
        .unwrap();
    cinema.clock.advance(Duration::minutes(3));

    store.break_seat_reads(Some(morning));
    let report = maintenance::unlock_expired_seats(state).await.unwrap();
    assert_eq!(report.changed, 2);

    store.break_seat_reads(None);
    let report = maintenance::unlock_expired_seats(state).await.unwrap();
    assert_eq!(report.changed, 1);

    cinema.clock.set(datetime!(2030-03-02 15:00 UTC));
    store.break_seat_reads(Some(afternoon));
    let report = maintenance::close_started_showtimes(state).await.unwrap();
    assert_eq!(report.changed, 1);

    store.break_seat_reads(None);
    let skipped = showtime_service::get_showtime(state, afternoon).await.unwrap();
    assert_eq!(skipped.showtime.status, ShowtimeStatus::Scheduled);
    let report = maintenance::close_started_showtimes(state).await.unwrap();
    assert_eq!(report.changed, 1);
}
