use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    dao::{booking_store::BookingStore, calendar::format_timestamp, models::ShowtimeSeatEntity},
    dto::seat::{SeatChangeResponse, SeatMapResponse, SeatRowView, SeatSelectionRequest, SeatView},
    error::ServiceError,
    services::{
        catalog_service::load_theater, showtime_service::load_showtime,
        sse_events::broadcast_seats_updated,
    },
    state::{
        SharedState,
        seat_ledger::{self, LockPolicy, effective_status},
    },
};

fn lock_policy(state: &SharedState) -> LockPolicy {
    let rules = state.rules();
    LockPolicy {
        ttl: rules.seat_lock_ttl,
        max_seats: rules.max_seats_per_order,
    }
}

/// Persist `changed`, or put every touched seat back to its `before` snapshot.
///
/// Stores may apply a batch partially, so a failed save is followed by a
/// restore of the seats it covered.
pub(crate) async fn save_or_restore(
    store: &Arc<dyn BookingStore>,
    showtime_id: Uuid,
    before: &[ShowtimeSeatEntity],
    changed: Vec<ShowtimeSeatEntity>,
) -> Result<(), ServiceError> {
    let touched: HashSet<Uuid> = changed.iter().map(|seat| seat.id).collect();
    let Err(err) = store.save_showtime_seats(changed).await else {
        return Ok(());
    };

    let snapshot: Vec<ShowtimeSeatEntity> = before
        .iter()
        .filter(|seat| touched.contains(&seat.id))
        .cloned()
        .collect();
    if let Err(restore) = store.save_showtime_seats(snapshot).await {
        error!(%showtime_id, error = %restore, "failed to restore seats after a partial write");
    }
    Err(err.into())
}

/// Seat map of a showtime with expired locks shown as available.
pub async fn seat_map(
    state: &SharedState,
    showtime_id: Uuid,
) -> Result<SeatMapResponse, ServiceError> {
    let store = state.require_store().await?;
    let showtime = load_showtime(&store, showtime_id).await?;
    // grid dimensions are counts, taken from the theater layout
    let theater = load_theater(&store, showtime.theater_id).await?;
    let mut seats = store.list_showtime_seats(showtime_id).await?;
    seats.sort_by_key(|seat| (seat.row_index, seat.column));

    let now = state.now();
    let ttl = state.rules().seat_lock_ttl;

    let mut rows: BTreeMap<u16, SeatRowView> = BTreeMap::new();
    for seat in &seats {
        rows.entry(seat.row_index)
            .or_insert_with(|| SeatRowView {
                row_name: seat.row_name.clone(),
                row_index: seat.row_index,
                seats: Vec::new(),
            })
            .seats
            .push(SeatView::new(seat, effective_status(seat, now, ttl)));
    }

    Ok(SeatMapResponse {
        showtime_id,
        max_row: theater.max_row,
        max_column: theater.max_column,
        rows: rows.into_values().collect(),
    })
}

/// Lock seats for a checkout session. All requested seats are locked or none.
pub async fn lock_seats(
    state: &SharedState,
    showtime_id: Uuid,
    request: SeatSelectionRequest,
) -> Result<SeatChangeResponse, ServiceError> {
    let store = state.require_store().await?;
    let policy = lock_policy(state);
    let now = state.now();

    let locked = state
        .run_gated(showtime_id, || async {
            let showtime = load_showtime(&store, showtime_id).await?;
            if !showtime.is_bookable(now) {
                return Err(ServiceError::InvalidState(
                    "showtime is not open for orders".into(),
                ));
            }

            let seats = store.list_showtime_seats(showtime_id).await?;
            let locked = seat_ledger::lock(&seats, &request.holder, &request.seat_ids, now, policy)?;
            save_or_restore(&store, showtime_id, &seats, locked.clone()).await?;
            Ok(locked)
        })
        .await?;

    info!(
        showtime_id = %showtime_id,
        holder = %request.holder,
        seats = locked.len(),
        "seats locked"
    );
    broadcast_seats_updated(state, showtime_id, &locked);

    Ok(SeatChangeResponse {
        showtime_id,
        seats: locked
            .iter()
            .map(|seat| SeatView::new(seat, seat.status))
            .collect(),
        holder: request.holder,
        expires_at: Some(format_timestamp(now + policy.ttl)),
    })
}

/// Release seats held by a checkout session.
pub async fn release_seats(
    state: &SharedState,
    showtime_id: Uuid,
    request: SeatSelectionRequest,
) -> Result<SeatChangeResponse, ServiceError> {
    let store = state.require_store().await?;
    let policy = lock_policy(state);

    let released = state
        .run_gated(showtime_id, || async {
            load_showtime(&store, showtime_id).await?;
            let seats = store.list_showtime_seats(showtime_id).await?;
            let released = seat_ledger::release(
                &seats,
                &request.holder,
                &request.seat_ids,
                state.now(),
                policy,
            )?;
            if !released.is_empty() {
                save_or_restore(&store, showtime_id, &seats, released.clone()).await?;
            }
            Ok(released)
        })
        .await?;

    debug!(showtime_id = %showtime_id, holder = %request.holder, seats = released.len(), "seats released");
    broadcast_seats_updated(state, showtime_id, &released);

    Ok(SeatChangeResponse {
        showtime_id,
        seats: released
            .iter()
            .map(|seat| SeatView::new(seat, seat.status))
            .collect(),
        holder: request.holder,
        expires_at: None,
    })
}
