//! DTOs for branches, theaters, movies and concessions.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::{
        calendar::format_date,
        models::{BranchEntity, FoodEntity, MovieEntity, MovieStatus, SeatEntity, TheaterEntity},
    },
    dto::validation::{validate_date, validate_not_blank, validate_slug},
};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateBranchRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    /// Derived from the name when omitted.
    #[serde(default)]
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 250))]
    pub address: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 20))]
    pub phone: String,
}

/// Partial branch update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateBranchRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 250))]
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BranchSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub city: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl From<BranchEntity> for BranchSummary {
    fn from(branch: BranchEntity) -> Self {
        Self {
            id: branch.id,
            name: branch.name,
            slug: branch.slug,
            city: branch.city,
            address: branch.address,
            email: branch.email,
            phone: branch.phone,
        }
    }
}

/// One row of a theater layout.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TheaterRowInput {
    /// Row label printed on tickets, e.g. `A`.
    #[validate(length(min = 1, max = 3), custom(function = "validate_not_blank"))]
    pub name: String,
    #[validate(range(min = 1, max = 60))]
    pub seats: u16,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateTheaterRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub kind: String,
    #[validate(range(min = 1))]
    pub seats_price: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Rows in front-to-back order.
    #[validate(nested)]
    pub rows: Vec<TheaterRowInput>,
}

fn default_active() -> bool {
    true
}

/// Theater attributes staff may change. The seat layout is fixed once created.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateTheaterRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub kind: Option<String>,
    /// Applies to showtimes scheduled afterwards.
    #[validate(range(min = 1))]
    pub seats_price: Option<u32>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetTheaterActiveRequest {
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TheaterSummary {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub slug: String,
    pub kind: String,
    pub seats_price: u32,
    pub active: bool,
    pub max_row: u16,
    pub max_column: u16,
}

impl From<TheaterEntity> for TheaterSummary {
    fn from(theater: TheaterEntity) -> Self {
        Self {
            id: theater.id,
            branch_id: theater.branch_id,
            name: theater.name,
            slug: theater.slug,
            kind: theater.kind,
            seats_price: theater.seats_price,
            active: theater.active,
            max_row: theater.max_row,
            max_column: theater.max_column,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeatSummary {
    pub id: Uuid,
    pub row_name: String,
    pub row_index: u16,
    pub column: u16,
    pub seat_number: u16,
    pub description: Option<String>,
}

impl From<SeatEntity> for SeatSummary {
    fn from(seat: SeatEntity) -> Self {
        Self {
            id: seat.id,
            row_name: seat.row_name,
            row_index: seat.row_index,
            column: seat.column,
            seat_number: seat.seat_number,
            description: seat.description,
        }
    }
}

/// Theater together with its physical seats.
#[derive(Debug, Serialize, ToSchema)]
pub struct TheaterDetail {
    pub theater: TheaterSummary,
    pub seats: Vec<SeatSummary>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMovieRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub age_tag: String,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: u16,
    /// `YYYY-MM-DD`.
    #[validate(custom(function = "validate_date"))]
    pub release_date: String,
    /// `YYYY-MM-DD`, inclusive.
    #[validate(custom(function = "validate_date"))]
    pub last_screen_date: String,
    #[serde(default)]
    #[validate(url)]
    pub poster_url: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub trailer_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 10.0))]
    pub rating: f32,
    #[serde(default)]
    pub description: String,
}

/// Partial movie update; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateMovieRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub age_tag: Option<String>,
    #[validate(range(min = 1, max = 600))]
    pub duration_minutes: Option<u16>,
    #[validate(custom(function = "validate_date"))]
    pub release_date: Option<String>,
    #[validate(custom(function = "validate_date"))]
    pub last_screen_date: Option<String>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[validate(url)]
    pub trailer_url: Option<String>,
    #[validate(range(min = 0.0, max = 10.0))]
    pub rating: Option<f32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MovieSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub age_tag: String,
    pub duration_minutes: u16,
    pub release_date: String,
    pub last_screen_date: String,
    pub poster_url: Option<String>,
    pub trailer_url: Option<String>,
    pub rating: f32,
    pub description: String,
    pub status: MovieStatus,
}

impl From<MovieEntity> for MovieSummary {
    fn from(movie: MovieEntity) -> Self {
        Self {
            id: movie.id,
            name: movie.name,
            slug: movie.slug,
            age_tag: movie.age_tag,
            duration_minutes: movie.duration_minutes,
            release_date: format_date(movie.release_date),
            last_screen_date: format_date(movie.last_screen_date),
            poster_url: movie.poster_url,
            trailer_url: movie.trailer_url,
            rating: movie.rating,
            description: movie.description,
            status: movie.status,
        }
    }
}

/// Pagination and search parameters of the movie listing.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct MovieListQuery {
    /// 1-based page number, defaults to 1.
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Page size, defaults to 20.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
    /// Case-insensitive name search.
    pub query: Option<String>,
    /// Only movies in this lifecycle state.
    pub status: Option<MovieStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MoviePage {
    pub items: Vec<MovieSummary>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFoodRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 1))]
    pub price: u32,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateFoodRequest {
    #[validate(length(min = 1, max = 100), custom(function = "validate_not_blank"))]
    pub name: Option<String>,
    pub description: Option<String>,
    /// Orders already placed keep the price they were charged.
    #[validate(range(min = 1))]
    pub price: Option<u32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FoodSummary {
    pub id: Uuid,
    pub branch_id: Uuid,
    pub name: String,
    pub description: String,
    pub price: u32,
}

impl From<FoodEntity> for FoodSummary {
    fn from(food: FoodEntity) -> Self {
        Self {
            id: food.id,
            branch_id: food.branch_id,
            name: food.name,
            description: food.description,
            price: food.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theater_request_validates_rows() {
        let request: CreateTheaterRequest = serde_json::from_str(
            r#"{"name": "Hall 1", "kind": "2D", "seats_price": 50000,
                "rows": [{"name": "A", "seats": 0}]}"#,
        )
        .unwrap();
        assert!(request.active);
        assert!(request.validate().is_err());
    }

    #[test]
    fn movie_request_rejects_malformed_dates() {
        let request: CreateMovieRequest = serde_json::from_str(
            r#"{"name": "Dune", "age_tag": "T13", "duration_minutes": 155,
                "release_date": "2025-06-01", "last_screen_date": "01/07/2025"}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("last_screen_date"));
    }

    #[test]
    fn partial_updates_only_check_present_fields() {
        let empty: UpdateBranchRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.validate().is_ok());

        let bad_email: UpdateBranchRequest =
            serde_json::from_str(r#"{"email": "not-an-email"}"#).unwrap();
        assert!(bad_email.validate().is_err());

        let free_food: UpdateFoodRequest = serde_json::from_str(r#"{"price": 0}"#).unwrap();
        assert!(free_food.validate().is_err());
    }
}
