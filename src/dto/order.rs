use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        calendar::format_timestamp,
        models::{OrderEntity, OrderFoodEntity},
    },
    dto::validation::validate_holder,
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OrderFoodInput {
    pub food_id: Uuid,
    #[validate(range(min = 1, max = 50))]
    pub quantity: u16,
}

/// Payment confirmation turning locked seats into an order.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct PlaceOrderRequest {
    pub showtime_id: Uuid,
    #[validate(custom(function = "validate_holder"))]
    pub holder: String,
    pub seat_ids: Vec<Uuid>,
    #[serde(default)]
    #[validate(nested)]
    pub foods: Vec<OrderFoodInput>,
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    /// Reference issued by the payment provider.
    #[serde(default)]
    #[validate(length(max = 128))]
    pub payment_reference: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    /// Only orders placed by this holder.
    pub holder: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderFoodLine {
    pub food_id: Uuid,
    pub name: String,
    pub unit_price: u32,
    pub quantity: u16,
    pub line_total: u64,
}

impl From<OrderFoodEntity> for OrderFoodLine {
    fn from(line: OrderFoodEntity) -> Self {
        Self {
            food_id: line.food_id,
            name: line.name,
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total: line.line_total,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub showtime_id: Uuid,
    pub holder: String,
    pub email: Option<String>,
    pub seat_ids: Vec<Uuid>,
    pub foods: Vec<OrderFoodLine>,
    pub tickets_total: u64,
    pub foods_total: u64,
    pub total: u64,
    pub ticket_code: String,
    pub payment_reference: Option<String>,
    pub created_at: String,
}

impl From<OrderEntity> for OrderResponse {
    fn from(order: OrderEntity) -> Self {
        Self {
            id: order.id,
            showtime_id: order.showtime_id,
            holder: order.holder,
            email: order.email,
            seat_ids: order.seat_ids,
            foods: order.foods.into_iter().map(Into::into).collect(),
            tickets_total: order.tickets_total,
            foods_total: order.foods_total,
            total: order.total,
            ticket_code: order.ticket_code,
            payment_reference: order.payment_reference,
            created_at: format_timestamp(order.created_at),
        }
    }
}
