use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::report::{
        AgeTagShare, DateRangeQuery, FoodOverview, FoodRevenueReport, MonthlyTotal,
        RevenueReport, YearQuery,
    },
    error::AppError,
    services::report_service,
    state::SharedState,
};

/// Dashboard endpoints, mounted under the admin token check.
pub(super) fn routes() -> Router<SharedState> {
    Router::new()
        .route("/admin/reports/orders/monthly", get(monthly_orders))
        .route("/admin/reports/movies/{id}", get(movie_revenue))
        .route("/admin/reports/branches/{id}", get(branch_revenue))
        .route("/admin/reports/branches/{id}/foods", get(food_overview))
        .route("/admin/reports/foods/{id}", get(food_revenue))
        .route("/admin/reports/age-tags", get(age_tags))
}

#[utoipa::path(
    get,
    path = "/admin/reports/orders/monthly",
    tag = "reports",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"), YearQuery),
    responses((status = 200, description = "Twelve monthly totals", body = [MonthlyTotal]))
)]
pub async fn monthly_orders(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<YearQuery>>,
) -> Result<Json<Vec<MonthlyTotal>>, AppError> {
    Ok(Json(
        report_service::monthly_order_totals(&state, query.year).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/reports/movies/{id}",
    tag = "reports",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Movie identifier"), DateRangeQuery),
    responses(
        (status = 200, description = "Ticket sales of the movie", body = RevenueReport),
        (status = 404, description = "Unknown movie")
    )
)]
pub async fn movie_revenue(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(range)): Valid<Query<DateRangeQuery>>,
) -> Result<Json<RevenueReport>, AppError> {
    Ok(Json(
        report_service::movie_revenue(&state, id, &range.from, &range.to).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/reports/branches/{id}",
    tag = "reports",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier"), DateRangeQuery),
    responses(
        (status = 200, description = "Ticket sales of the branch", body = RevenueReport),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn branch_revenue(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(range)): Valid<Query<DateRangeQuery>>,
) -> Result<Json<RevenueReport>, AppError> {
    Ok(Json(
        report_service::branch_revenue(&state, id, &range.from, &range.to).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/reports/branches/{id}/foods",
    tag = "reports",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier")),
    responses((status = 200, description = "Menu highlights", body = FoodOverview))
)]
pub async fn food_overview(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FoodOverview>, AppError> {
    Ok(Json(report_service::food_overview(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/admin/reports/foods/{id}",
    tag = "reports",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Food identifier"), DateRangeQuery),
    responses((status = 200, description = "Daily sales of the item", body = FoodRevenueReport))
)]
pub async fn food_revenue(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(range)): Valid<Query<DateRangeQuery>>,
) -> Result<Json<FoodRevenueReport>, AppError> {
    Ok(Json(
        report_service::food_revenue(&state, id, &range.from, &range.to).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/admin/reports/age-tags",
    tag = "reports",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token")),
    responses((status = 200, description = "Catalog share per age tag", body = [AgeTagShare]))
)]
pub async fn age_tags(State(state): State<SharedState>) -> Result<Json<Vec<AgeTagShare>>, AppError> {
    Ok(Json(report_service::age_tag_distribution(&state).await?))
}
