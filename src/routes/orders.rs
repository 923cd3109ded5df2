use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::order::{OrderListQuery, OrderResponse, PlaceOrderRequest},
    error::AppError,
    services::order_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/orders", get(list_orders).post(place_order))
        .route("/orders/{id}", get(get_order))
}

#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Seats booked and order recorded", body = OrderResponse),
        (status = 400, description = "Invalid seats or foods"),
        (status = 409, description = "Seats not held by this checkout or showtime closed")
    )
)]
/// Book the holder's locked seats once payment went through.
pub async fn place_order(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<PlaceOrderRequest>>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let order = order_service::place_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    params(OrderListQuery),
    responses((status = 200, description = "Orders, newest first", body = [OrderResponse]))
)]
pub async fn list_orders(
    State(state): State<SharedState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderResponse>>, AppError> {
    Ok(Json(order_service::list_orders(&state, query.holder).await?))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(("id" = Uuid, Path, description = "Order identifier")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 404, description = "Unknown order")
    )
)]
pub async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, AppError> {
    Ok(Json(order_service::get_order(&state, id).await?))
}
