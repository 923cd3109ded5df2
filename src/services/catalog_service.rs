//! Branch, theater, movie and concession management.

use std::sync::Arc;

use time::Date;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        booking_store::{BookingStore, ShowtimeQuery},
        calendar::parse_date,
        models::{
            AuditStamp, BranchEntity, FoodEntity, MovieEntity, MovieStatus, SeatEntity,
            TheaterEntity,
        },
    },
    dto::catalog::{
        BranchSummary, CreateBranchRequest, CreateFoodRequest, CreateMovieRequest,
        CreateTheaterRequest, FoodSummary, MovieListQuery, MoviePage, MovieSummary, SeatSummary,
        TheaterDetail, TheaterSummary, UpdateBranchRequest, UpdateFoodRequest,
        UpdateMovieRequest, UpdateTheaterRequest,
    },
    error::ServiceError,
    state::SharedState,
};

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Turn a display name into a URL slug, e.g. `CGV Vincom 2` -> `cgv-vincom-2`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn resolve_slug(requested: Option<String>, name: &str, id: Uuid) -> String {
    requested
        .filter(|slug| !slug.is_empty())
        .or_else(|| Some(slugify(name)).filter(|slug| !slug.is_empty()))
        .unwrap_or_else(|| id.simple().to_string())
}

pub(crate) fn not_found(kind: &str, id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{kind} `{id}` not found"))
}

pub(crate) async fn load_branch(
    store: &Arc<dyn BookingStore>,
    id: Uuid,
) -> Result<BranchEntity, ServiceError> {
    store
        .find_branch(id)
        .await?
        .ok_or_else(|| not_found("branch", id))
}

pub(crate) async fn load_theater(
    store: &Arc<dyn BookingStore>,
    id: Uuid,
) -> Result<TheaterEntity, ServiceError> {
    store
        .find_theater(id)
        .await?
        .ok_or_else(|| not_found("theater", id))
}

pub(crate) async fn load_movie(
    store: &Arc<dyn BookingStore>,
    id: Uuid,
) -> Result<MovieEntity, ServiceError> {
    store
        .find_movie(id)
        .await?
        .ok_or_else(|| not_found("movie", id))
}

fn parse_request_date(field: &str, value: &str) -> Result<Date, ServiceError> {
    parse_date(value)
        .map_err(|_| ServiceError::InvalidInput(format!("`{field}` must use YYYY-MM-DD")))
}

fn check_screening_window(release: Date, last: Date) -> Result<(), ServiceError> {
    if last < release {
        return Err(ServiceError::InvalidInput(
            "last_screen_date must not precede release_date".into(),
        ));
    }
    Ok(())
}

// ---- branches ----

pub async fn create_branch(
    state: &SharedState,
    request: CreateBranchRequest,
    operator: &str,
) -> Result<BranchSummary, ServiceError> {
    let store = state.require_store().await?;
    let id = Uuid::new_v4();
    let slug = resolve_slug(request.slug, &request.name, id);

    let existing = store.list_branches().await?;
    if existing.iter().any(|branch| branch.slug == slug) {
        return Err(ServiceError::Conflict(format!(
            "a branch with slug `{slug}` already exists"
        )));
    }

    let branch = BranchEntity {
        id,
        name: request.name.trim().to_owned(),
        slug,
        city: request.city,
        address: request.address,
        email: request.email,
        phone: request.phone,
        audit: AuditStamp::new(state.now(), operator),
    };
    store.save_branch(branch.clone()).await?;
    info!(branch_id = %branch.id, slug = %branch.slug, operator, "branch created");
    Ok(branch.into())
}

pub async fn get_branch(state: &SharedState, id: Uuid) -> Result<BranchSummary, ServiceError> {
    let store = state.require_store().await?;
    Ok(load_branch(&store, id).await?.into())
}

pub async fn list_branches(state: &SharedState) -> Result<Vec<BranchSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut branches = store.list_branches().await?;
    branches.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(branches.into_iter().map(Into::into).collect())
}

pub async fn update_branch(
    state: &SharedState,
    id: Uuid,
    request: UpdateBranchRequest,
    operator: &str,
) -> Result<BranchSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut branch = load_branch(&store, id).await?;

    if let Some(slug) = request.slug.filter(|slug| *slug != branch.slug) {
        let taken = store
            .list_branches()
            .await?
            .iter()
            .any(|other| other.id != id && other.slug == slug);
        if taken {
            return Err(ServiceError::Conflict(format!(
                "a branch with slug `{slug}` already exists"
            )));
        }
        branch.slug = slug;
    }
    if let Some(name) = request.name {
        branch.name = name.trim().to_owned();
    }
    if let Some(city) = request.city {
        branch.city = city;
    }
    if let Some(address) = request.address {
        branch.address = address;
    }
    if let Some(email) = request.email {
        branch.email = email;
    }
    if let Some(phone) = request.phone {
        branch.phone = phone;
    }

    branch.audit.touch(state.now(), operator);
    store.save_branch(branch.clone()).await?;
    info!(branch_id = %id, operator, "branch updated");
    Ok(branch.into())
}

/// Remove a branch that no longer has theaters. Its concessions go with it.
pub async fn delete_branch(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, id).await?;

    if !store.list_theaters(id).await?.is_empty() {
        return Err(ServiceError::Conflict(
            "branch still has theaters; delete them first".into(),
        ));
    }
    for food in store.list_foods(id).await? {
        store.delete_food(food.id).await?;
    }
    store.delete_branch(id).await?;
    info!(branch_id = %id, "branch deleted");
    Ok(())
}

// ---- theaters ----

/// Expand a row layout into seats: rows keep request order, seats are numbered from 1.
fn layout_seats(theater_id: Uuid, request: &CreateTheaterRequest) -> Vec<SeatEntity> {
    request
        .rows
        .iter()
        .zip(0u16..)
        .flat_map(|(row, row_index)| {
            (0..row.seats).map(move |column| SeatEntity {
                id: Uuid::new_v4(),
                theater_id,
                row_name: row.name.trim().to_owned(),
                row_index,
                column,
                seat_number: column + 1,
                description: row.description.clone(),
            })
        })
        .collect()
}

fn sorted_seats(mut seats: Vec<SeatEntity>) -> Vec<SeatSummary> {
    seats.sort_by_key(|seat| (seat.row_index, seat.column));
    seats.into_iter().map(Into::into).collect()
}

pub async fn create_theater(
    state: &SharedState,
    branch_id: Uuid,
    request: CreateTheaterRequest,
    operator: &str,
) -> Result<TheaterDetail, ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;

    if request.rows.is_empty() {
        return Err(ServiceError::InvalidInput(
            "a theater needs at least one row".into(),
        ));
    }
    let max_row = u16::try_from(request.rows.len())
        .map_err(|_| ServiceError::InvalidInput("too many rows".into()))?;
    let max_column = request.rows.iter().map(|row| row.seats).max().unwrap_or(0);

    let id = Uuid::new_v4();
    let seats = layout_seats(id, &request);
    let theater = TheaterEntity {
        id,
        branch_id,
        slug: resolve_slug(request.slug, &request.name, id),
        name: request.name.trim().to_owned(),
        kind: request.kind,
        seats_price: request.seats_price,
        active: request.active,
        max_row,
        max_column,
        audit: AuditStamp::new(state.now(), operator),
    };

    store.save_theater(theater.clone()).await?;
    store.save_seats(seats.clone()).await?;
    info!(
        theater_id = %theater.id,
        %branch_id,
        seats = seats.len(),
        operator,
        "theater created"
    );

    Ok(TheaterDetail {
        theater: theater.into(),
        seats: sorted_seats(seats),
    })
}

pub async fn get_theater(state: &SharedState, id: Uuid) -> Result<TheaterDetail, ServiceError> {
    let store = state.require_store().await?;
    let theater = load_theater(&store, id).await?;
    let seats = store.list_seats(id).await?;
    Ok(TheaterDetail {
        theater: theater.into(),
        seats: sorted_seats(seats),
    })
}

pub async fn list_theaters(
    state: &SharedState,
    branch_id: Uuid,
) -> Result<Vec<TheaterSummary>, ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;
    let mut theaters = store.list_theaters(branch_id).await?;
    theaters.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(theaters.into_iter().map(Into::into).collect())
}

/// Enable or disable scheduling in a theater. Existing showtimes are unaffected.
pub async fn set_theater_active(
    state: &SharedState,
    id: Uuid,
    active: bool,
    operator: &str,
) -> Result<TheaterSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut theater = load_theater(&store, id).await?;
    theater.active = active;
    theater.audit.touch(state.now(), operator);
    store.save_theater(theater.clone()).await?;
    info!(theater_id = %id, active, operator, "theater availability changed");
    Ok(theater.into())
}

pub async fn update_theater(
    state: &SharedState,
    id: Uuid,
    request: UpdateTheaterRequest,
    operator: &str,
) -> Result<TheaterSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut theater = load_theater(&store, id).await?;

    if let Some(name) = request.name {
        theater.name = name.trim().to_owned();
    }
    if let Some(slug) = request.slug {
        theater.slug = slug;
    }
    if let Some(kind) = request.kind {
        theater.kind = kind;
    }
    if let Some(price) = request.seats_price {
        theater.seats_price = price;
    }
    if let Some(active) = request.active {
        theater.active = active;
    }

    theater.audit.touch(state.now(), operator);
    store.save_theater(theater.clone()).await?;
    info!(theater_id = %id, operator, "theater updated");
    Ok(theater.into())
}

pub async fn delete_theater(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    load_theater(&store, id).await?;

    let showtimes = store
        .list_showtimes(ShowtimeQuery::default().in_theaters(vec![id]))
        .await?;
    if !showtimes.is_empty() {
        return Err(ServiceError::Conflict(format!(
            "theater still has {} showtime(s)",
            showtimes.len()
        )));
    }

    let seats = store.delete_seats(id).await?;
    store.delete_theater(id).await?;
    info!(theater_id = %id, seats, "theater deleted");
    Ok(())
}

// ---- movies ----

pub async fn create_movie(
    state: &SharedState,
    request: CreateMovieRequest,
    operator: &str,
) -> Result<MovieSummary, ServiceError> {
    let store = state.require_store().await?;
    let release_date = parse_request_date("release_date", &request.release_date)?;
    let last_screen_date = parse_request_date("last_screen_date", &request.last_screen_date)?;
    check_screening_window(release_date, last_screen_date)?;

    let id = Uuid::new_v4();
    let now = state.now();
    let movie = MovieEntity {
        id,
        slug: resolve_slug(request.slug, &request.name, id),
        name: request.name.trim().to_owned(),
        age_tag: request.age_tag,
        duration_minutes: request.duration_minutes,
        release_date,
        last_screen_date,
        poster_url: request.poster_url,
        trailer_url: request.trailer_url,
        rating: request.rating,
        description: request.description,
        status: MovieStatus::on(now.date(), release_date, last_screen_date),
        audit: AuditStamp::new(now, operator),
    };
    store.save_movie(movie.clone()).await?;
    info!(movie_id = %movie.id, status = ?movie.status, operator, "movie created");
    Ok(movie.into())
}

pub async fn get_movie(state: &SharedState, id: Uuid) -> Result<MovieSummary, ServiceError> {
    let store = state.require_store().await?;
    Ok(load_movie(&store, id).await?.into())
}

/// Search and paginate the catalog, most recent releases first.
pub async fn list_movies(
    state: &SharedState,
    query: MovieListQuery,
) -> Result<MoviePage, ServiceError> {
    let store = state.require_store().await?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
    let needle = query
        .query
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_lowercase);

    let mut movies: Vec<MovieEntity> = store
        .list_movies()
        .await?
        .into_iter()
        .filter(|movie| query.status.is_none_or(|status| movie.status == status))
        .filter(|movie| {
            needle
                .as_deref()
                .is_none_or(|needle| movie.name.to_lowercase().contains(needle))
        })
        .collect();
    movies.sort_by(|a, b| {
        b.release_date
            .cmp(&a.release_date)
            .then_with(|| a.name.cmp(&b.name))
    });

    let total = movies.len() as u64;
    let total_pages = total.div_ceil(u64::from(limit)) as u32;
    let offset = (u64::from(page) - 1).saturating_mul(u64::from(limit));
    let items = movies
        .into_iter()
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(limit as usize)
        .map(Into::into)
        .collect();

    Ok(MoviePage {
        items,
        page,
        limit,
        total,
        total_pages,
    })
}

pub async fn update_movie(
    state: &SharedState,
    id: Uuid,
    request: UpdateMovieRequest,
    operator: &str,
) -> Result<MovieSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut movie = load_movie(&store, id).await?;

    if let Some(name) = request.name {
        movie.name = name.trim().to_owned();
    }
    if let Some(age_tag) = request.age_tag {
        movie.age_tag = age_tag;
    }
    if let Some(duration) = request.duration_minutes {
        movie.duration_minutes = duration;
    }
    if let Some(release) = request.release_date {
        movie.release_date = parse_request_date("release_date", &release)?;
    }
    if let Some(last) = request.last_screen_date {
        movie.last_screen_date = parse_request_date("last_screen_date", &last)?;
    }
    if request.poster_url.is_some() {
        movie.poster_url = request.poster_url;
    }
    if request.trailer_url.is_some() {
        movie.trailer_url = request.trailer_url;
    }
    if let Some(rating) = request.rating {
        movie.rating = rating;
    }
    if let Some(description) = request.description {
        movie.description = description;
    }
    check_screening_window(movie.release_date, movie.last_screen_date)?;

    let now = state.now();
    movie.status = MovieStatus::on(now.date(), movie.release_date, movie.last_screen_date);
    movie.audit.touch(now, operator);
    store.save_movie(movie.clone()).await?;
    info!(movie_id = %id, operator, "movie updated");
    Ok(movie.into())
}

pub async fn delete_movie(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    load_movie(&store, id).await?;

    let showtimes = store
        .list_showtimes(ShowtimeQuery::default().for_movie(id))
        .await?;
    if !showtimes.is_empty() {
        return Err(ServiceError::Conflict(format!(
            "movie still has {} showtime(s)",
            showtimes.len()
        )));
    }
    store.delete_movie(id).await?;
    info!(movie_id = %id, "movie deleted");
    Ok(())
}

// ---- foods ----

pub async fn create_food(
    state: &SharedState,
    branch_id: Uuid,
    request: CreateFoodRequest,
) -> Result<FoodSummary, ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;

    let food = FoodEntity {
        id: Uuid::new_v4(),
        branch_id,
        name: request.name.trim().to_owned(),
        description: request.description,
        price: request.price,
    };
    store.save_food(food.clone()).await?;
    Ok(food.into())
}

pub async fn list_foods(
    state: &SharedState,
    branch_id: Uuid,
) -> Result<Vec<FoodSummary>, ServiceError> {
    let store = state.require_store().await?;
    load_branch(&store, branch_id).await?;
    let foods = store.list_foods(branch_id).await?;
    Ok(foods.into_iter().map(Into::into).collect())
}

pub async fn update_food(
    state: &SharedState,
    id: Uuid,
    request: UpdateFoodRequest,
) -> Result<FoodSummary, ServiceError> {
    let store = state.require_store().await?;
    let mut food = store
        .find_food(id)
        .await?
        .ok_or_else(|| not_found("food", id))?;

    if let Some(name) = request.name {
        food.name = name.trim().to_owned();
    }
    if let Some(description) = request.description {
        food.description = description;
    }
    if let Some(price) = request.price {
        food.price = price;
    }
    store.save_food(food.clone()).await?;
    info!(food_id = %id, price = food.price, "food updated");
    Ok(food.into())
}

pub async fn delete_food(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_store().await?;
    if !store.delete_food(id).await? {
        return Err(not_found("food", id));
    }
    Ok(())
}
