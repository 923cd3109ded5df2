use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{BranchSummary, FoodSummary, MovieListQuery, MoviePage, MovieSummary, TheaterSummary},
        showtime::{BranchShowtimes, DateQuery},
    },
    error::AppError,
    services::{catalog_service, showtime_service},
    state::SharedState,
};

/// Public read-only catalog.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/movies", get(list_movies))
        .route("/movies/{id}", get(get_movie))
        .route("/movies/{id}/showtimes", get(movie_showtimes))
        .route("/branches", get(list_branches))
        .route("/branches/{id}/theaters", get(branch_theaters))
        .route("/branches/{id}/foods", get(branch_foods))
}

#[utoipa::path(
    get,
    path = "/movies",
    tag = "catalog",
    params(MovieListQuery),
    responses(
        (status = 200, description = "Page of movies, newest release first", body = MoviePage),
        (status = 400, description = "Invalid paging parameters")
    )
)]
/// List movies with optional name search and status filter.
pub async fn list_movies(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<MovieListQuery>>,
) -> Result<Json<MoviePage>, AppError> {
    Ok(Json(catalog_service::list_movies(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/movies/{id}",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Movie identifier")),
    responses(
        (status = 200, description = "Movie", body = MovieSummary),
        (status = 404, description = "Unknown movie")
    )
)]
pub async fn get_movie(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MovieSummary>, AppError> {
    Ok(Json(catalog_service::get_movie(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/movies/{id}/showtimes",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Movie identifier"), DateQuery),
    responses(
        (status = 200, description = "Bookable showtimes grouped by branch", body = [BranchShowtimes]),
        (status = 404, description = "Unknown movie")
    )
)]
/// Showtimes still open for orders on the given day (today by default).
pub async fn movie_showtimes(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(query)): Valid<Query<DateQuery>>,
) -> Result<Json<Vec<BranchShowtimes>>, AppError> {
    let date = showtime_service::parse_date_filter(query.date.as_deref())?;
    Ok(Json(showtime_service::list_for_movie(&state, id, date).await?))
}

#[utoipa::path(
    get,
    path = "/branches",
    tag = "catalog",
    responses((status = 200, description = "Branches by name", body = [BranchSummary]))
)]
pub async fn list_branches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<BranchSummary>>, AppError> {
    Ok(Json(catalog_service::list_branches(&state).await?))
}

#[utoipa::path(
    get,
    path = "/branches/{id}/theaters",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Branch identifier")),
    responses(
        (status = 200, description = "Theaters of the branch", body = [TheaterSummary]),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn branch_theaters(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TheaterSummary>>, AppError> {
    Ok(Json(catalog_service::list_theaters(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/branches/{id}/foods",
    tag = "catalog",
    params(("id" = Uuid, Path, description = "Branch identifier")),
    responses(
        (status = 200, description = "Concessions sold at the branch", body = [FoodSummary]),
        (status = 404, description = "Unknown branch")
    )
)]
pub async fn branch_foods(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FoodSummary>>, AppError> {
    Ok(Json(catalog_service::list_foods(&state, id).await?))
}
