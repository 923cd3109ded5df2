pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use time::Date;
use uuid::Uuid;

use crate::dao::{
    models::{
        BranchEntity, FoodEntity, MovieEntity, OrderEntity, SeatEntity, ShowtimeEntity,
        ShowtimeSeatEntity, TheaterEntity,
    },
    storage::StorageResult,
};

pub use memory::InMemoryBookingStore;

/// Filter applied when listing showtimes. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ShowtimeQuery {
    pub show_date: Option<Date>,
    pub theater_ids: Option<Vec<Uuid>>,
    pub movie_id: Option<Uuid>,
}

impl ShowtimeQuery {
    pub fn on_date(mut self, date: Date) -> Self {
        self.show_date = Some(date);
        self
    }

    pub fn in_theaters(mut self, theater_ids: Vec<Uuid>) -> Self {
        self.theater_ids = Some(theater_ids);
        self
    }

    pub fn for_movie(mut self, movie_id: Uuid) -> Self {
        self.movie_id = Some(movie_id);
        self
    }

    /// Evaluate the filter against a showtime.
    pub fn matches(&self, showtime: &ShowtimeEntity) -> bool {
        self.show_date.is_none_or(|date| showtime.show_date == date)
            && self.movie_id.is_none_or(|id| showtime.movie_id == id)
            && self
                .theater_ids
                .as_ref()
                .is_none_or(|ids| ids.contains(&showtime.theater_id))
    }
}

/// Abstraction over the persistence layer for the booking schema.
///
/// Saves are upserts keyed by the entity id. Deletes report whether anything
/// was removed.
pub trait BookingStore: Send + Sync {
    fn save_branch(&self, branch: BranchEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BranchEntity>>>;
    fn list_branches(&self) -> BoxFuture<'static, StorageResult<Vec<BranchEntity>>>;
    fn delete_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_theater(&self, theater: TheaterEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TheaterEntity>>>;
    fn list_theaters(&self, branch_id: Uuid)
    -> BoxFuture<'static, StorageResult<Vec<TheaterEntity>>>;
    fn delete_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_seats(&self, seats: Vec<SeatEntity>) -> BoxFuture<'static, StorageResult<()>>;
    fn list_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeatEntity>>>;
    fn delete_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    fn save_movie(&self, movie: MovieEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MovieEntity>>>;
    fn list_movies(&self) -> BoxFuture<'static, StorageResult<Vec<MovieEntity>>>;
    fn delete_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_food(&self, food: FoodEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FoodEntity>>>;
    fn list_foods(&self, branch_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<FoodEntity>>>;
    fn delete_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn save_showtime(&self, showtime: ShowtimeEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_showtime(&self, id: Uuid)
    -> BoxFuture<'static, StorageResult<Option<ShowtimeEntity>>>;
    fn list_showtimes(
        &self,
        query: ShowtimeQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeEntity>>>;
    fn delete_showtime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Upsert a batch of seats. A failure may leave part of the batch written.
    fn save_showtime_seats(
        &self,
        seats: Vec<ShowtimeSeatEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    fn list_showtime_seats(
        &self,
        showtime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>>;
    /// Every seat currently in the locked state, across all showtimes.
    fn list_locked_seats(&self) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>>;
    fn delete_showtime_seats(&self, showtime_id: Uuid) -> BoxFuture<'static, StorageResult<u64>>;

    fn save_order(&self, order: OrderEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<OrderEntity>>>;
    fn list_orders(
        &self,
        holder: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<OrderEntity>>>;
    fn delete_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
