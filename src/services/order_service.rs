use std::{collections::HashSet, sync::Arc};

use rand::{Rng, rng};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    dao::{
        booking_store::BookingStore,
        models::{OrderEntity, OrderFoodEntity, ShowtimeSeatEntity, ShowtimeStatus},
    },
    dto::order::{OrderFoodInput, OrderResponse, PlaceOrderRequest},
    error::ServiceError,
    services::{
        catalog_service::{load_theater, not_found},
        seat_service::save_or_restore,
        showtime_service::load_showtime,
        sse_events::broadcast_seats_updated,
    },
    state::{
        SharedState,
        seat_ledger::{self, LockPolicy},
    },
};

const TICKET_CODE_LEN: usize = 10;
const TICKET_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Random gate code, e.g. `Q7K2M9XA0B`.
pub fn ticket_code() -> String {
    let mut rng = rng();
    (0..TICKET_CODE_LEN)
        .map(|_| {
            let index = rng.random_range(0..TICKET_CODE_ALPHABET.len());
            char::from(TICKET_CODE_ALPHABET[index])
        })
        .collect()
}

/// Resolve food lines against the branch menu.
async fn price_foods(
    store: &Arc<dyn BookingStore>,
    branch_id: Uuid,
    inputs: &[OrderFoodInput],
) -> Result<Vec<OrderFoodEntity>, ServiceError> {
    let mut seen = HashSet::with_capacity(inputs.len());
    let mut lines = Vec::with_capacity(inputs.len());
    for input in inputs {
        if !seen.insert(input.food_id) {
            return Err(ServiceError::InvalidInput(format!(
                "food {} is listed more than once",
                input.food_id
            )));
        }
        let food = store
            .find_food(input.food_id)
            .await?
            .filter(|food| food.branch_id == branch_id)
            .ok_or_else(|| {
                ServiceError::InvalidInput(format!(
                    "food {} is not sold at this branch",
                    input.food_id
                ))
            })?;
        lines.push(OrderFoodEntity {
            food_id: food.id,
            name: food.name,
            unit_price: food.price,
            quantity: input.quantity,
            line_total: u64::from(food.price) * u64::from(input.quantity),
        });
    }
    Ok(lines)
}

fn tickets_total(seats: &[ShowtimeSeatEntity]) -> u64 {
    seats.iter().map(|seat| u64::from(seat.ticket_price)).sum()
}

/// Confirm payment: turn the holder's locked seats into an order.
///
/// Every seat must still be locked by the holder. On any failure no seat
/// changes state.
pub async fn place_order(
    state: &SharedState,
    request: PlaceOrderRequest,
) -> Result<OrderResponse, ServiceError> {
    let store = state.require_store().await?;
    let policy = LockPolicy {
        ttl: state.rules().seat_lock_ttl,
        max_seats: state.rules().max_seats_per_order,
    };
    let showtime_id = request.showtime_id;

    let (order, booked) = state
        .run_gated(showtime_id, || async {
            let now = state.now();
            let showtime = load_showtime(&store, showtime_id).await?;
            if showtime.status != ShowtimeStatus::Scheduled
                || now >= showtime.starts_at(now.offset())
            {
                return Err(ServiceError::InvalidState(
                    "showtime is no longer taking orders".into(),
                ));
            }
            let theater = load_theater(&store, showtime.theater_id).await?;
            let foods = price_foods(&store, theater.branch_id, &request.foods).await?;

            let seats = store.list_showtime_seats(showtime_id).await?;
            let order_id = Uuid::new_v4();
            let booked = seat_ledger::commit(
                &seats,
                &request.holder,
                &request.seat_ids,
                order_id,
                now,
                policy,
            )?;

            let tickets_total = tickets_total(&booked);
            let foods_total: u64 = foods.iter().map(|line| line.line_total).sum();
            let order = OrderEntity {
                id: order_id,
                showtime_id,
                holder: request.holder.clone(),
                email: request.email.clone(),
                seat_ids: booked.iter().map(|seat| seat.id).collect(),
                foods,
                tickets_total,
                foods_total,
                total: tickets_total + foods_total,
                ticket_code: ticket_code(),
                payment_reference: request.payment_reference.clone(),
                created_at: now,
            };

            store.save_order(order.clone()).await?;
            if let Err(err) = save_or_restore(&store, showtime_id, &seats, booked.clone()).await {
                if let Err(cleanup) = store.delete_order(order_id).await {
                    error!(order_id = %order_id, error = %cleanup, "failed to roll back order");
                }
                return Err(err);
            }
            Ok((order, booked))
        })
        .await?;

    info!(
        order_id = %order.id,
        showtime_id = %showtime_id,
        holder = %order.holder,
        seats = booked.len(),
        total = order.total,
        "order placed"
    );
    broadcast_seats_updated(state, showtime_id, &booked);
    Ok(order.into())
}

pub async fn get_order(state: &SharedState, id: Uuid) -> Result<OrderResponse, ServiceError> {
    let store = state.require_store().await?;
    store
        .find_order(id)
        .await?
        .map(Into::into)
        .ok_or_else(|| not_found("order", id))
}

/// Orders newest first, optionally restricted to one holder.
pub async fn list_orders(
    state: &SharedState,
    holder: Option<String>,
) -> Result<Vec<OrderResponse>, ServiceError> {
    let store = state.require_store().await?;
    let mut orders = store.list_orders(holder).await?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders.into_iter().map(Into::into).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_codes_use_uppercase_alphanumerics() {
        for _ in 0..50 {
            let code = ticket_code();
            assert_eq!(code.len(), TICKET_CODE_LEN);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }
}
