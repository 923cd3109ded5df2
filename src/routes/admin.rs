use std::convert::Infallible;

use axum::{
    Json, Router,
    body::Body,
    extract::{FromRequestParts, Path, Query, State},
    http::{Request, StatusCode, request::Parts},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{
            BranchSummary, CreateBranchRequest, CreateFoodRequest, CreateMovieRequest,
            CreateTheaterRequest, FoodSummary, MovieSummary, SetTheaterActiveRequest,
            TheaterDetail, TheaterSummary, UpdateBranchRequest, UpdateFoodRequest,
            UpdateMovieRequest, UpdateTheaterRequest,
        },
        maintenance::JobReport,
        showtime::{
            CancelShowtimeRequest, CreateShowtimeRequest, DateQuery, ShowtimeListing,
            ShowtimeSummary,
        },
    },
    error::AppError,
    routes::reports,
    services::{catalog_service, maintenance, showtime_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";
const OPERATOR_HEADER: &str = "x-operator";
const DEFAULT_OPERATOR: &str = "system";
const MAX_OPERATOR_LEN: usize = 64;

/// Staff name recorded in audit stamps, read from `X-Operator`.
#[derive(Debug, Clone)]
pub struct Operator(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Operator {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let name = parts
            .headers
            .get(OPERATOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.chars().take(MAX_OPERATOR_LEN).collect())
            .unwrap_or_else(|| DEFAULT_OPERATOR.to_owned());
        Ok(Operator(name))
    }
}

/// Staff endpoints for the catalog, scheduling and maintenance.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/branches", get(list_branches).post(create_branch))
        .route(
            "/admin/branches/{id}",
            get(get_branch).put(update_branch).delete(delete_branch),
        )
        .route("/admin/branches/{id}/theaters", post(create_theater))
        .route("/admin/branches/{id}/foods", post(create_food))
        .route("/admin/branches/{id}/showtimes", get(branch_showtimes))
        .route(
            "/admin/theaters/{id}",
            get(get_theater).put(update_theater).delete(delete_theater),
        )
        .route("/admin/theaters/{id}/active", put(set_theater_active))
        .route("/admin/movies", post(create_movie))
        .route("/admin/movies/{id}", put(update_movie).delete(delete_movie))
        .route("/admin/foods/{id}", put(update_food).delete(delete_food))
        .route("/admin/showtimes", post(create_showtime))
        .route("/admin/showtimes/{id}", delete(delete_showtime))
        .route("/admin/showtimes/{id}/open", post(open_showtime))
        .route("/admin/showtimes/{id}/cancel", post(cancel_showtime))
        .route("/admin/maintenance/{job}", post(run_maintenance))
        .merge(reports::routes())
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

#[utoipa::path(
    get,
    path = "/admin/branches",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token")),
    responses((status = 200, description = "Branches by name", body = [BranchSummary]))
)]
pub async fn list_branches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<BranchSummary>>, AppError> {
    Ok(Json(catalog_service::list_branches(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/branches",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token")),
    request_body = CreateBranchRequest,
    responses(
        (status = 201, description = "Branch created", body = BranchSummary),
        (status = 409, description = "Slug already in use")
    )
)]
pub async fn create_branch(
    State(state): State<SharedState>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<CreateBranchRequest>>,
) -> Result<(StatusCode, Json<BranchSummary>), AppError> {
    let branch = catalog_service::create_branch(&state, payload, &operator).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

#[utoipa::path(
    get,
    path = "/admin/branches/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier")),
    responses((status = 200, description = "Branch", body = BranchSummary))
)]
pub async fn get_branch(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BranchSummary>, AppError> {
    Ok(Json(catalog_service::get_branch(&state, id).await?))
}

#[utoipa::path(
    put,
    path = "/admin/branches/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier")),
    request_body = UpdateBranchRequest,
    responses(
        (status = 200, description = "Branch updated", body = BranchSummary),
        (status = 409, description = "Slug already in use")
    )
)]
pub async fn update_branch(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<UpdateBranchRequest>>,
) -> Result<Json<BranchSummary>, AppError> {
    Ok(Json(
        catalog_service::update_branch(&state, id, payload, &operator).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/branches/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier")),
    responses(
        (status = 204, description = "Branch and its foods deleted"),
        (status = 409, description = "Branch still has theaters")
    )
)]
pub async fn delete_branch(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog_service::delete_branch(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/branches/{id}/theaters",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier")),
    request_body = CreateTheaterRequest,
    responses((status = 201, description = "Theater and its seats created", body = TheaterDetail))
)]
/// Create a theater from a row layout. Seats are generated row by row.
pub async fn create_theater(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<CreateTheaterRequest>>,
) -> Result<(StatusCode, Json<TheaterDetail>), AppError> {
    let theater = catalog_service::create_theater(&state, id, payload, &operator).await?;
    Ok((StatusCode::CREATED, Json(theater)))
}

#[utoipa::path(
    post,
    path = "/admin/branches/{id}/foods",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier")),
    request_body = CreateFoodRequest,
    responses((status = 201, description = "Food added to the branch menu", body = FoodSummary))
)]
pub async fn create_food(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<CreateFoodRequest>>,
) -> Result<(StatusCode, Json<FoodSummary>), AppError> {
    let food = catalog_service::create_food(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(food)))
}

#[utoipa::path(
    get,
    path = "/admin/branches/{id}/showtimes",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Branch identifier"), DateQuery),
    responses((status = 200, description = "Showtimes by date and start time", body = [ShowtimeListing]))
)]
pub async fn branch_showtimes(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Query(query)): Valid<Query<DateQuery>>,
) -> Result<Json<Vec<ShowtimeListing>>, AppError> {
    let date = showtime_service::parse_date_filter(query.date.as_deref())?;
    Ok(Json(showtime_service::list_for_branch(&state, id, date).await?))
}

#[utoipa::path(
    get,
    path = "/admin/theaters/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Theater identifier")),
    responses((status = 200, description = "Theater with its seats", body = TheaterDetail))
)]
pub async fn get_theater(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TheaterDetail>, AppError> {
    Ok(Json(catalog_service::get_theater(&state, id).await?))
}

#[utoipa::path(
    put,
    path = "/admin/theaters/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Theater identifier")),
    request_body = UpdateTheaterRequest,
    responses((status = 200, description = "Theater updated", body = TheaterSummary))
)]
pub async fn update_theater(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<UpdateTheaterRequest>>,
) -> Result<Json<TheaterSummary>, AppError> {
    Ok(Json(
        catalog_service::update_theater(&state, id, payload, &operator).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/theaters/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Theater identifier")),
    responses(
        (status = 204, description = "Theater deleted"),
        (status = 409, description = "Theater still has showtimes")
    )
)]
pub async fn delete_theater(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog_service::delete_theater(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/admin/theaters/{id}/active",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Theater identifier")),
    request_body = SetTheaterActiveRequest,
    responses((status = 200, description = "Theater updated", body = TheaterSummary))
)]
/// Inactive theaters cannot receive new showtimes.
pub async fn set_theater_active(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Json(payload): Json<SetTheaterActiveRequest>,
) -> Result<Json<TheaterSummary>, AppError> {
    Ok(Json(
        catalog_service::set_theater_active(&state, id, payload.active, &operator).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/movies",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token")),
    request_body = CreateMovieRequest,
    responses((status = 201, description = "Movie created", body = MovieSummary))
)]
pub async fn create_movie(
    State(state): State<SharedState>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<CreateMovieRequest>>,
) -> Result<(StatusCode, Json<MovieSummary>), AppError> {
    let movie = catalog_service::create_movie(&state, payload, &operator).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

#[utoipa::path(
    put,
    path = "/admin/movies/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Movie identifier")),
    request_body = UpdateMovieRequest,
    responses((status = 200, description = "Movie updated", body = MovieSummary))
)]
pub async fn update_movie(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<UpdateMovieRequest>>,
) -> Result<Json<MovieSummary>, AppError> {
    Ok(Json(
        catalog_service::update_movie(&state, id, payload, &operator).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/movies/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Movie identifier")),
    responses(
        (status = 204, description = "Movie deleted"),
        (status = 409, description = "Movie still has showtimes")
    )
)]
pub async fn delete_movie(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog_service::delete_movie(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/admin/foods/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Food identifier")),
    request_body = UpdateFoodRequest,
    responses((status = 200, description = "Food updated", body = FoodSummary))
)]
pub async fn update_food(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateFoodRequest>>,
) -> Result<Json<FoodSummary>, AppError> {
    Ok(Json(catalog_service::update_food(&state, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/foods/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Food identifier")),
    responses((status = 204, description = "Food deleted"))
)]
pub async fn delete_food(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog_service::delete_food(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/showtimes",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token")),
    request_body = CreateShowtimeRequest,
    responses(
        (status = 201, description = "Showtime scheduled and seats seeded", body = ShowtimeSummary),
        (status = 400, description = "Date, window or slot rejected"),
        (status = 409, description = "Overlaps or sits too close to another showtime")
    )
)]
/// Schedule a showtime, checked against the theater's and the branch's program for that day.
pub async fn create_showtime(
    State(state): State<SharedState>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<CreateShowtimeRequest>>,
) -> Result<(StatusCode, Json<ShowtimeSummary>), AppError> {
    let showtime = showtime_service::create_showtime(&state, payload, &operator).await?;
    Ok((StatusCode::CREATED, Json(showtime)))
}

#[utoipa::path(
    delete,
    path = "/admin/showtimes/{id}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Showtime identifier")),
    responses(
        (status = 204, description = "Showtime and its seats deleted"),
        (status = 409, description = "Showtime has bookings")
    )
)]
pub async fn delete_showtime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    showtime_service::delete_showtime(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/showtimes/{id}/open",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Showtime identifier")),
    responses(
        (status = 200, description = "Ticket sales opened", body = ShowtimeSummary),
        (status = 409, description = "Showtime not scheduled, already open or too close to its start")
    )
)]
pub async fn open_showtime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
) -> Result<Json<ShowtimeSummary>, AppError> {
    Ok(Json(
        showtime_service::open_orders(&state, id, &operator).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/showtimes/{id}/cancel",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("id" = Uuid, Path, description = "Showtime identifier")),
    request_body = CancelShowtimeRequest,
    responses(
        (status = 200, description = "Showtime cancelled and seat locks released", body = ShowtimeSummary),
        (status = 409, description = "Showtime already started or cancelled")
    )
)]
pub async fn cancel_showtime(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Operator(operator): Operator,
    Valid(Json(payload)): Valid<Json<CancelShowtimeRequest>>,
) -> Result<Json<ShowtimeSummary>, AppError> {
    Ok(Json(
        showtime_service::cancel_showtime(&state, id, &payload.reason, &operator).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/maintenance/{job}",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Configured staff token"),
    ("job" = String, Path, description = "`unlock_expired_seats`, `close_started_showtimes` or `refresh_movie_statuses`")),
    responses(
        (status = 200, description = "Job ran", body = JobReport),
        (status = 404, description = "Unknown job")
    )
)]
/// Run a maintenance job immediately instead of waiting for its next tick.
pub async fn run_maintenance(
    State(state): State<SharedState>,
    Path(job): Path<String>,
) -> Result<Json<JobReport>, AppError> {
    Ok(Json(maintenance::run_job(&state, &job).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().admin_token() else {
        return Err(AppError::Unauthorized("admin API disabled".into()));
    };

    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid admin token".into()))
    }
}
