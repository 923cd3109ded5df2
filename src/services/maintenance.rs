//! Periodic housekeeping jobs.
//!
//! Each job is idempotent and can also be triggered from the admin API.

use std::{collections::BTreeSet, future::Future, time::Duration};

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dao::{
        booking_store::ShowtimeQuery,
        models::{MovieStatus, ShowtimeStatus},
    },
    dto::maintenance::JobReport,
    error::ServiceError,
    services::{
        showtime_service::load_showtime,
        sse_events::{broadcast_seats_updated, broadcast_showtime_updated},
    },
    state::{
        SharedState,
        seat_ledger::{self, is_live_lock},
    },
};

/// Operator recorded on changes made by jobs.
const JOB_OPERATOR: &str = "system";

pub const UNLOCK_EXPIRED_SEATS: &str = "unlock_expired_seats";
pub const CLOSE_STARTED_SHOWTIMES: &str = "close_started_showtimes";
pub const REFRESH_MOVIE_STATUSES: &str = "refresh_movie_statuses";

/// Clear seat locks whose TTL has elapsed.
pub async fn unlock_expired_seats(state: &SharedState) -> Result<JobReport, ServiceError> {
    let store = state.require_store().await?;
    let ttl = state.rules().seat_lock_ttl;
    let now = state.now();

    let showtimes: BTreeSet<Uuid> = store
        .list_locked_seats()
        .await?
        .iter()
        .filter(|seat| !is_live_lock(seat, now, ttl))
        .map(|seat| seat.showtime_id)
        .collect();

    let mut changed = 0;
    for showtime_id in showtimes {
        let expired = state
            .run_gated(showtime_id, || async {
                let seats = store.list_showtime_seats(showtime_id).await?;
                // re-read under the gate; a holder may have refreshed the lock
                let expired = seat_ledger::expire(&seats, state.now(), ttl);
                if !expired.is_empty() {
                    store.save_showtime_seats(expired.clone()).await?;
                }
                Ok(expired)
            })
            .await;
        let expired = match expired {
            Ok(expired) => expired,
            Err(err) => {
                warn!(job = UNLOCK_EXPIRED_SEATS, %showtime_id, error = %err, "skipping showtime");
                continue;
            }
        };

        changed += expired.len() as u64;
        broadcast_seats_updated(state, showtime_id, &expired);
    }

    Ok(JobReport::new(UNLOCK_EXPIRED_SEATS, changed))
}

/// Mark open showtimes that have started as finished and drop their remaining locks.
pub async fn close_started_showtimes(state: &SharedState) -> Result<JobReport, ServiceError> {
    let store = state.require_store().await?;
    let now = state.now();

    let started: Vec<Uuid> = store
        .list_showtimes(ShowtimeQuery::default())
        .await?
        .iter()
        .filter(|showtime| {
            showtime.status == ShowtimeStatus::Scheduled
                && showtime.open_for_orders
                && showtime.starts_at(now.offset()) <= now
        })
        .map(|showtime| showtime.id)
        .collect();

    let mut changed = 0;
    for showtime_id in started {
        let closed = state
            .run_gated(showtime_id, || async {
                let mut showtime = load_showtime(&store, showtime_id).await?;
                if showtime.status != ShowtimeStatus::Scheduled || !showtime.open_for_orders {
                    return Ok(None);
                }

                let seats = store.list_showtime_seats(showtime_id).await?;
                showtime.status = ShowtimeStatus::Finished;
                showtime.open_for_orders = false;
                showtime.audit.touch(now, JOB_OPERATOR);
                store.save_showtime(showtime.clone()).await?;

                let released = seat_ledger::release_all(&seats);
                if !released.is_empty() {
                    store.save_showtime_seats(released.clone()).await?;
                }
                Ok(Some((showtime, released)))
            })
            .await;

        match closed {
            Ok(Some((showtime, released))) => {
                changed += 1;
                broadcast_showtime_updated(state, "finished", &showtime);
                broadcast_seats_updated(state, showtime_id, &released);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(job = CLOSE_STARTED_SHOWTIMES, %showtime_id, error = %err, "skipping showtime");
            }
        }
    }


    Ok(JobReport::new(CLOSE_STARTED_SHOWTIMES, changed))
}

/// Move movies along `upcoming -> now_showing -> ended` as dates pass.
pub async fn refresh_movie_statuses(state: &SharedState) -> Result<JobReport, ServiceError> {
    let store = state.require_store().await?;
    let now = state.now();
    let today = now.date();

    let mut changed = 0;
    for mut movie in store.list_movies().await? {
        let status = MovieStatus::on(today, movie.release_date, movie.last_screen_date);
        if status == movie.status {
            continue;
        }
        debug!(movie_id = %movie.id, from = ?movie.status, to = ?status, "movie status changed");
        movie.status = status;
        movie.audit.touch(now, JOB_OPERATOR);
        store.save_movie(movie).await?;
        changed += 1;
    }

    Ok(JobReport::new(REFRESH_MOVIE_STATUSES, changed))
}

/// Run a job by name, as exposed on the admin API.
pub async fn run_job(state: &SharedState, job: &str) -> Result<JobReport, ServiceError> {
    match job {
        UNLOCK_EXPIRED_SEATS => unlock_expired_seats(state).await,
        CLOSE_STARTED_SHOWTIMES => close_started_showtimes(state).await,
        REFRESH_MOVIE_STATUSES => refresh_movie_statuses(state).await,
        other => Err(ServiceError::NotFound(format!("unknown job `{other}`"))),
    }
}

/// Spawn the periodic jobs on the runtime.
pub fn spawn(state: &SharedState) {
    let rules = state.rules();
    schedule(
        state.clone(),
        UNLOCK_EXPIRED_SEATS,
        rules.lock_sweep_interval,
        |state| async move { unlock_expired_seats(&state).await },
    );
    schedule(
        state.clone(),
        CLOSE_STARTED_SHOWTIMES,
        rules.showtime_close_interval,
        |state| async move { close_started_showtimes(&state).await },
    );
    schedule(
        state.clone(),
        REFRESH_MOVIE_STATUSES,
        rules.movie_refresh_interval,
        |state| async move { refresh_movie_statuses(&state).await },
    );
}

fn schedule<F, Fut>(state: SharedState, job: &'static str, period: Duration, run: F)
where
    F: Fn(SharedState) -> Fut + Send + 'static,
    Fut: Future<Output = Result<JobReport, ServiceError>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match run(state.clone()).await {
                Ok(report) if report.changed > 0 => {
                    info!(job, changed = report.changed, "maintenance job run");
                }
                Ok(_) => {}
                Err(ServiceError::Degraded) => debug!(job, "skipping maintenance job in degraded mode"),
                Err(err) => warn!(job, error = %err, "maintenance job failed"),
            }
        }
    });
}
