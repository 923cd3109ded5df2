//! Sales reports for the staff dashboard.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::dto::validation::validate_date;

/// Inclusive order-date range, both ends `YYYY-MM-DD`.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    #[validate(custom(function = "validate_date"))]
    pub from: String,
    #[validate(custom(function = "validate_date"))]
    pub to: String,
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct YearQuery {
    #[validate(range(min = 1970, max = 9999))]
    pub year: i32,
}

/// Order turnover of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MonthlyTotal {
    /// 1 = January.
    pub month: u8,
    pub orders: u64,
    pub total: u64,
}

/// Ticket sales on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyRevenue {
    pub date: String,
    pub seats: u64,
    pub revenue: u64,
}

/// Ticket sales of a movie or a branch over a date range.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevenueReport {
    pub from: String,
    pub to: String,
    pub sold_seats: u64,
    pub revenue: u64,
    /// Distinct showtimes that sold at least one seat.
    pub showtimes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lowest_day: Option<DailyRevenue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_day: Option<DailyRevenue>,
    /// Days with sales, oldest first.
    pub daily: Vec<DailyRevenue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DailyFoodSales {
    pub date: String,
    pub quantity: u64,
    pub revenue: u64,
}

/// Sales of one concession item over a date range.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FoodRevenueReport {
    pub food_id: Uuid,
    pub name: String,
    pub from: String,
    pub to: String,
    pub quantity: u64,
    pub revenue: u64,
    pub daily: Vec<DailyFoodSales>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FoodQuantity {
    pub food_id: Uuid,
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FoodPrice {
    pub food_id: Uuid,
    pub name: String,
    pub price: u32,
}

/// Menu highlights of a branch across all orders.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FoodOverview {
    pub branch_id: Uuid,
    pub best_selling: Option<FoodQuantity>,
    pub least_selling: Option<FoodQuantity>,
    pub most_expensive: Option<FoodPrice>,
    pub cheapest: Option<FoodPrice>,
    pub revenue: u64,
}

/// Share of the catalog carrying an age tag.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgeTagShare {
    pub age_tag: String,
    pub movies: u64,
    pub percentage: f64,
}
