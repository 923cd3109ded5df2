use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the booking backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::catalog::list_movies,
        crate::routes::catalog::get_movie,
        crate::routes::catalog::movie_showtimes,
        crate::routes::catalog::list_branches,
        crate::routes::catalog::branch_theaters,
        crate::routes::catalog::branch_foods,
        crate::routes::showtimes::get_showtime,
        crate::routes::showtimes::seat_map,
        crate::routes::showtimes::lock_seats,
        crate::routes::showtimes::release_seats,
        crate::routes::orders::place_order,
        crate::routes::orders::list_orders,
        crate::routes::orders::get_order,
        crate::routes::admin::list_branches,
        crate::routes::admin::create_branch,
        crate::routes::admin::get_branch,
        crate::routes::admin::update_branch,
        crate::routes::admin::delete_branch,
        crate::routes::admin::create_theater,
        crate::routes::admin::create_food,
        crate::routes::admin::branch_showtimes,
        crate::routes::admin::get_theater,
        crate::routes::admin::update_theater,
        crate::routes::admin::delete_theater,
        crate::routes::admin::set_theater_active,
        crate::routes::admin::create_movie,
        crate::routes::admin::update_movie,
        crate::routes::admin::delete_movie,
        crate::routes::admin::update_food,
        crate::routes::admin::delete_food,
        crate::routes::admin::create_showtime,
        crate::routes::admin::delete_showtime,
        crate::routes::admin::open_showtime,
        crate::routes::admin::cancel_showtime,
        crate::routes::admin::run_maintenance,
        crate::routes::reports::monthly_orders,
        crate::routes::reports::movie_revenue,
        crate::routes::reports::branch_revenue,
        crate::routes::reports::food_overview,
        crate::routes::reports::food_revenue,
        crate::routes::reports::age_tags,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::catalog::CreateBranchRequest,
            crate::dto::catalog::UpdateBranchRequest,
            crate::dto::catalog::BranchSummary,
            crate::dto::catalog::TheaterRowInput,
            crate::dto::catalog::CreateTheaterRequest,
            crate::dto::catalog::UpdateTheaterRequest,
            crate::dto::catalog::SetTheaterActiveRequest,
            crate::dto::catalog::TheaterSummary,
            crate::dto::catalog::SeatSummary,
            crate::dto::catalog::TheaterDetail,
            crate::dto::catalog::CreateMovieRequest,
            crate::dto::catalog::UpdateMovieRequest,
            crate::dto::catalog::MovieSummary,
            crate::dto::catalog::MoviePage,
            crate::dto::catalog::CreateFoodRequest,
            crate::dto::catalog::UpdateFoodRequest,
            crate::dto::catalog::FoodSummary,
            crate::dto::showtime::CreateShowtimeRequest,
            crate::dto::showtime::CancelShowtimeRequest,
            crate::dto::showtime::ShowtimeSummary,
            crate::dto::showtime::ShowtimeDetail,
            crate::dto::showtime::ShowtimeListing,
            crate::dto::showtime::BranchShowtimes,
            crate::dto::seat::SeatSelectionRequest,
            crate::dto::seat::SeatView,
            crate::dto::seat::SeatRowView,
            crate::dto::seat::SeatMapResponse,
            crate::dto::seat::SeatChangeResponse,
            crate::dto::order::OrderFoodInput,
            crate::dto::order::PlaceOrderRequest,
            crate::dto::order::OrderFoodLine,
            crate::dto::order::OrderResponse,
            crate::dto::maintenance::JobReport,
            crate::dto::report::MonthlyTotal,
            crate::dto::report::DailyRevenue,
            crate::dto::report::RevenueReport,
            crate::dto::report::DailyFoodSales,
            crate::dto::report::FoodRevenueReport,
            crate::dto::report::FoodQuantity,
            crate::dto::report::FoodPrice,
            crate::dto::report::FoodOverview,
            crate::dto::report::AgeTagShare,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::SeatsUpdatedEvent,
            crate::dto::sse::ShowtimeUpdatedEvent,
            crate::dao::models::MovieStatus,
            crate::dao::models::ShowtimeStatus,
            crate::dao::models::SeatStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "catalog", description = "Movies, branches, theaters and concessions"),
        (name = "showtimes", description = "Showtime details, seat map and seat locks"),
        (name = "orders", description = "Bookings"),
        (name = "admin", description = "Staff operations behind `X-Admin-Token`"),
        (name = "reports", description = "Sales dashboard behind `X-Admin-Token`"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_booking_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/showtimes/{id}/seats/lock",
            "/orders",
            "/admin/showtimes",
            "/admin/maintenance/{job}",
            "/admin/reports/movies/{id}",
            "/admin/foods/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
