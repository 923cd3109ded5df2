//! Showtime scheduling and lifecycle.

use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use time::{Date, Time};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        booking_store::{BookingStore, ShowtimeQuery},
        calendar::{format_date, format_time, parse_date, parse_time},
        models::{
            AuditStamp, SeatStatus, ShowtimeEntity, ShowtimeSeatEntity, ShowtimeStatus,
            TheaterEntity,
        },
    },
    dto::showtime::{
        BranchShowtimes, CreateShowtimeRequest, ShowtimeDetail, ShowtimeListing, ShowtimeSummary,
    },
    error::ServiceError,
    services::{
        catalog_service::{load_branch, load_movie, load_theater, not_found},
        sse_events::{broadcast_seats_updated, broadcast_showtime_updated},
    },
    state::{
        SharedState,
        scheduling::{self, ScheduleViolation},
        seat_ledger::{self, effective_status},
    },
};

pub(crate) async fn load_showtime(
    store: &Arc<dyn BookingStore>,
    id: Uuid,
) -> Result<ShowtimeEntity, ServiceError> {
    store
        .find_showtime(id)
        .await?
        .ok_or_else(|| not_found("showtime", id))
}

fn parse_field_date(field: &str, value: &str) -> Result<Date, ServiceError> {
    parse_date(value)
        .map_err(|_| ServiceError::InvalidInput(format!("`{field}` must use YYYY-MM-DD")))
}

fn parse_field_time(field: &str, value: &str) -> Result<Time, ServiceError> {
    parse_time(value).map_err(|_| ServiceError::InvalidInput(format!("`{field}` must use HH:MM")))
}

/// Parse an optional `YYYY-MM-DD` query parameter.
pub fn parse_date_filter(value: Option<&str>) -> Result<Option<Date>, ServiceError> {
    value
        .map(|value| parse_field_date("date", value))
        .transpose()
}

/// Place a new showtime after checking it against the theater's and the branch's schedule.
///
/// Detection and insertion run under the scheduling gate so two concurrent
/// requests cannot both claim the same slot.
pub async fn create_showtime(
    state: &SharedState,
    request: CreateShowtimeRequest,
    operator: &str,
) -> Result<ShowtimeSummary, ServiceError> {
    let show_date = parse_field_date("show_date", &request.show_date)?;
    let start_time = parse_field_time("start_time", &request.start_time)?;
    let end_time = request
        .end_time
        .as_deref()
        .map(|value| parse_field_time("end_time", value))
        .transpose()?;

    let store = state.require_store().await?;
    let rules = state.rules().clone();

    let showtime = state
        .run_scheduling(|| async {
            let now = state.now();
            let today = now.date();
            if show_date <= today {
                return Err(ServiceError::from(ScheduleViolation::DateNotInFuture {
                    show_date,
                    today,
                }));
            }

            let movie = store.find_movie(request.movie_id).await?.ok_or_else(|| {
                ServiceError::InvalidInput(format!("movie {} does not exist", request.movie_id))
            })?;
            scheduling::check_show_date(show_date, today, &movie)?;

            let theater = store.find_theater(request.theater_id).await?.ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "theater {} does not exist",
                    request.theater_id
                ))
            })?;
            if !theater.active {
                return Err(ServiceError::from(ScheduleViolation::TheaterInactive));
            }

            let slot = scheduling::resolve_slot(start_time, end_time, movie.duration_minutes)?;

            let same_theater = store
                .list_showtimes(
                    ShowtimeQuery::default()
                        .on_date(show_date)
                        .in_theaters(vec![theater.id]),
                )
                .await?;
            scheduling::check_theater_slot(slot, &same_theater, rules.min_gap)?;

            let branch_theaters = store
                .list_theaters(theater.branch_id)
                .await?
                .into_iter()
                .map(|theater| theater.id)
                .collect();
            let same_movie = store
                .list_showtimes(
                    ShowtimeQuery::default()
                        .on_date(show_date)
                        .for_movie(movie.id)
                        .in_theaters(branch_theaters),
                )
                .await?;
            scheduling::check_movie_spacing(slot.start, &same_movie, rules.same_movie_spacing)?;

            let showtime = ShowtimeEntity {
                id: Uuid::new_v4(),
                theater_id: theater.id,
                movie_id: movie.id,
                show_date,
                start_time: slot.start,
                end_time: slot.end,
                status: ShowtimeStatus::Scheduled,
                open_for_orders: false,
                cancel_reason: None,
                audit: AuditStamp::new(now, operator),
            };
            store.save_showtime(showtime.clone()).await?;

            if let Err(err) = seed_seats(&store, &showtime, &theater).await {
                if let Err(cleanup) = store.delete_showtime(showtime.id).await {
                    warn!(showtime_id = %showtime.id, error = %cleanup, "failed to roll back showtime");
                }
                return Err(err);
            }
            Ok(showtime)
        })
        .await?;

    info!(
        showtime_id = %showtime.id,
        theater_id = %showtime.theater_id,
        movie_id = %showtime.movie_id,
        show_date = %format_date(showtime.show_date),
        start = %format_time(showtime.start_time),
        end = %format_time(showtime.end_time),
        operator,
        "showtime scheduled"
    );
    broadcast_showtime_updated(state, "created", &showtime);
    Ok((&showtime).into())
}

async fn seed_seats(
    store: &Arc<dyn BookingStore>,
    showtime: &ShowtimeEntity,
    theater: &TheaterEntity,
) -> Result<usize, ServiceError> {
    let seats: Vec<ShowtimeSeatEntity> = store
        .list_seats(theater.id)
        .await?
        .iter()
        .map(|seat| ShowtimeSeatEntity::seed(showtime.id, seat, theater.seats_price))
        .collect();
    let count = seats.len();
    store.save_showtime_seats(seats).await?;
    Ok(count)
}

/// Open ticket sales. Only allowed until `open_order_lead` before the start.
pub async fn open_orders(
    state: &SharedState,
    id: Uuid,
    operator: &str,
) -> Result<ShowtimeSummary, ServiceError> {
    let store = state.require_store().await?;
    let lead = state.rules().open_order_lead;

    let showtime = state
        .run_gated(id, || async {
            let mut showtime = load_showtime(&store, id).await?;
            if showtime.status != ShowtimeStatus::Scheduled {
                return Err(ServiceError::InvalidState(format!(
                    "showtime is {:?}, only scheduled showtimes can open for orders",
                    showtime.status
                )));
            }
            if showtime.open_for_orders {
                return Err(ServiceError::InvalidState(
                    "showtime is already open for orders".into(),
                ));
            }

            let now = state.now();
            let deadline = showtime.starts_at(now.offset()) - lead;
            if now > deadline {
                return Err(ServiceError::InvalidState(format!(
                    "orders must be opened at least {} minutes before the start",
                    lead.whole_minutes()
                )));
            }

            showtime.open_for_orders = true;
            showtime.audit.touch(now, operator);
            store.save_showtime(showtime.clone()).await?;
            Ok(showtime)
        })
        .await?;

    info!(showtime_id = %id, operator, "showtime opened for orders");
    broadcast_showtime_updated(state, "opened", &showtime);
    Ok((&showtime).into())
}

/// Cancel a showtime and release every seat lock it carries. Bookings stay.
pub async fn cancel_showtime(
    state: &SharedState,
    id: Uuid,
    reason: &str,
    operator: &str,
) -> Result<ShowtimeSummary, ServiceError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a cancellation reason is required".into(),
        ));
    }
    let store = state.require_store().await?;

    let (showtime, released) = state
        .run_gated(id, || async {
            let mut showtime = load_showtime(&store, id).await?;
            match showtime.status {
                ShowtimeStatus::Scheduled => {}
                ShowtimeStatus::Finished => {
                    return Err(ServiceError::InvalidState(
                        "showtime has already started".into(),
                    ));
                }
                ShowtimeStatus::Cancelled => {
                    return Err(ServiceError::InvalidState(
                        "showtime is already cancelled".into(),
                    ));
                }
            }

            showtime.status = ShowtimeStatus::Cancelled;
            showtime.open_for_orders = false;
            showtime.cancel_reason = Some(reason.to_owned());
            showtime.audit.touch(state.now(), operator);
            store.save_showtime(showtime.clone()).await?;

            let seats = store.list_showtime_seats(id).await?;
            let released = seat_ledger::release_all(&seats);
            if !released.is_empty() {
                store.save_showtime_seats(released.clone()).await?;
            }
            Ok((showtime, released))
        })
        .await?;

    info!(showtime_id = %id, released = released.len(), operator, reason, "showtime cancelled");
    broadcast_showtime_updated(state, "cancelled", &showtime);
    broadcast_seats_updated(state, id, &released);
    Ok((&showtime).into())
}

/// Delete a showtime with no bookings, together with its seats.
pub async fn delete_showtime(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let showtime = state
        .run_gated(id, || async {
            let showtime = load_showtime(&store, id).await?;
            let seats = store.list_showtime_seats(id).await?;
            let booked = seats
                .iter()
                .filter(|seat| seat.status == SeatStatus::Booked)
                .count();
            if booked > 0 {
                return Err(ServiceError::Conflict(format!(
                    "showtime has {booked} booked seat(s)"
                )));
            }

            store.delete_showtime_seats(id).await?;
            store.delete_showtime(id).await?;
            Ok(showtime)
        })
        .await?;
    state.forget_showtime_gate(id);

    info!(showtime_id = %id, "showtime deleted");
    broadcast_showtime_updated(state, "deleted", &showtime);
    Ok(())
}

pub async fn get_showtime(state: &SharedState, id: Uuid) -> Result<ShowtimeDetail, ServiceError> {
    let store = state.require_store().await?;
    let showtime = load_showtime(&store, id).await?;
    let movie = load_movie(&store, showtime.movie_id).await?;
    let theater = load_theater(&store, showtime.theater_id).await?;
    let branch = load_branch(&store, theater.branch_id).await?;

    let seats = store.list_showtime_seats(id).await?;
    let now = state.now();
    let ttl = state.rules().seat_lock_ttl;
    let seats_available = seats
        .iter()
        .filter(|seat| effective_status(seat, now, ttl) == SeatStatus::Available)
        .count();

    Ok(ShowtimeDetail {
        showtime: (&showtime).into(),
        movie_name: movie.name,
        duration_minutes: movie.duration_minutes,
        theater_name: theater.name,
        theater_kind: theater.kind,
        branch_id: branch.id,
        branch_name: branch.name,
        seats_available,
        seats_total: seats.len(),
    })
}

fn listing(showtime: &ShowtimeEntity, theater_name: &str) -> ShowtimeListing {
    ShowtimeListing {
        id: showtime.id,
        movie_id: showtime.movie_id,
        theater_id: showtime.theater_id,
        theater_name: theater_name.to_owned(),
        show_date: format_date(showtime.show_date),
        start_time: format_time(showtime.start_time),
        end_time: format_time(showtime.end_time),
        status: showtime.status,
        open_for_orders: showtime.open_for_orders,
    }
}

/// Every showtime of a branch, ordered by date then start time.
pub async fn list_for_branch(
    state: &SharedState,
    branch_id: Uuid,
    date: Option<Date>,
) -> Result<Vec<ShowtimeListing>, ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;

    let theaters: HashMap<Uuid, String> = store
        .list_theaters(branch_id)
        .await?
        .into_iter()
        .map(|theater| (theater.id, theater.name))
        .collect();
    if theaters.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = ShowtimeQuery::default().in_theaters(theaters.keys().copied().collect());
    if let Some(date) = date {
        query = query.on_date(date);
    }
    let mut showtimes = store.list_showtimes(query).await?;
    showtimes.sort_by_key(|showtime| (showtime.show_date, showtime.start_time));

    Ok(showtimes
        .iter()
        .map(|showtime| {
            let name = theaters
                .get(&showtime.theater_id)
                .map(String::as_str)
                .unwrap_or_default();
            listing(showtime, name)
        })
        .collect())
}

/// Bookable showtimes of a movie on a day (today by default), grouped by branch name.
pub async fn list_for_movie(
    state: &SharedState,
    movie_id: Uuid,
    date: Option<Date>,
) -> Result<Vec<BranchShowtimes>, ServiceError> {
    let store = state.require_store().await?;
    load_movie(&store, movie_id).await?;

    let now = state.now();
    let date = date.unwrap_or(now.date());
    let mut showtimes: Vec<ShowtimeEntity> = store
        .list_showtimes(ShowtimeQuery::default().for_movie(movie_id).on_date(date))
        .await?
        .into_iter()
        .filter(|showtime| showtime.is_bookable(now))
        .collect();
    showtimes.sort_by_key(|showtime| showtime.start_time);

    let mut theaters: HashMap<Uuid, TheaterEntity> = HashMap::new();
    let mut groups: IndexMap<Uuid, BranchShowtimes> = IndexMap::new();
    for showtime in &showtimes {
        if !theaters.contains_key(&showtime.theater_id) {
            let Some(theater) = store.find_theater(showtime.theater_id).await? else {
                warn!(showtime_id = %showtime.id, "showtime references a missing theater");
                continue;
            };
            theaters.insert(theater.id, theater);
        }
        let Some(theater) = theaters.get(&showtime.theater_id) else {
            continue;
        };

        if !groups.contains_key(&theater.branch_id) {
            let Some(branch) = store.find_branch(theater.branch_id).await? else {
                warn!(theater_id = %theater.id, "theater references a missing branch");
                continue;
            };
            groups.insert(
                branch.id,
                BranchShowtimes {
                    branch_id: branch.id,
                    branch_name: branch.name,
                    showtimes: Vec::new(),
                },
            );
        }
        if let Some(group) = groups.get_mut(&theater.branch_id) {
            group.showtimes.push(listing(showtime, &theater.name));
        }
    }

    let mut groups: Vec<BranchShowtimes> = groups.into_values().collect();
    groups.sort_by(|a, b| a.branch_name.cmp(&b.branch_name));
    Ok(groups)
}
