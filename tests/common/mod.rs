//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use cinema_booking_back::{
    config::AppConfig,
    dao::{
        booking_store::{BookingStore, InMemoryBookingStore, ShowtimeQuery},
        models::{
            BranchEntity, FoodEntity, MovieEntity, OrderEntity, SeatEntity, SeatStatus,
            ShowtimeEntity, ShowtimeSeatEntity, TheaterEntity,
        },
        storage::{StorageError, StorageResult},
    },
    dto::{
        catalog::{CreateBranchRequest, CreateMovieRequest, CreateTheaterRequest, TheaterRowInput},
        order::PlaceOrderRequest,
        seat::SeatSelectionRequest,
        showtime::CreateShowtimeRequest,
    },
    services::{catalog_service, seat_service, showtime_service},
    state::{AppState, ManualClock, SharedState},
};
use futures::future::BoxFuture;
use time::macros::datetime;
use uuid::Uuid;

pub const OPERATOR: &str = "tester";

pub struct Cinema {
    pub state: SharedState,
    pub clock: Arc<ManualClock>,
    pub branch_id: Uuid,
    pub theater_id: Uuid,
    pub movie_id: Uuid,
}

pub fn row(name: &str, seats: u16) -> TheaterRowInput {
    TheaterRowInput {
        name: name.into(),
        seats,
        description: None,
    }
}

pub fn theater_request(name: &str) -> CreateTheaterRequest {
    CreateTheaterRequest {
        name: name.into(),
        slug: None,
        kind: "2D".into(),
        seats_price: 90_000,
        active: true,
        rows: vec![row("A", 4), row("B", 4)],
    }
}

pub fn showtime_request(cinema: &Cinema, theater_id: Uuid, start: &str) -> CreateShowtimeRequest {
    CreateShowtimeRequest {
        theater_id,
        movie_id: cinema.movie_id,
        show_date: "2030-03-02".into(),
        start_time: start.into(),
        end_time: None,
    }
}

/// One branch with an 8-seat theater and a 100 minute movie, on 2030-03-01 09:00.
pub async fn cinema() -> Cinema {
    cinema_on(Arc::new(InMemoryBookingStore::new())).await
}

/// Same as [`cinema`], backed by the given store.
pub async fn cinema_on(store: Arc<dyn BookingStore>) -> Cinema {
    let clock = Arc::new(ManualClock::new(datetime!(2030-03-01 09:00 UTC)));
    let state = AppState::with_clock(AppConfig::default(), clock.clone());
    state.install_store(store).await;

    let branch = catalog_service::create_branch(
        &state,
        CreateBranchRequest {
            name: "Downtown".into(),
            slug: None,
            city: "Hanoi".into(),
            address: "1 Main Street".into(),
            email: "downtown@example.com".into(),
            phone: "0123456789".into(),
        },
        OPERATOR,
    )
    .await
    .unwrap();
    let theater =
        catalog_service::create_theater(&state, branch.id, theater_request("Hall 1"), OPERATOR)
            .await
            .unwrap();
    let movie = catalog_service::create_movie(
        &state,
        CreateMovieRequest {
            name: "Night Train".into(),
            slug: None,
            age_tag: "T13".into(),
            duration_minutes: 100,
            release_date: "2030-02-01".into(),
            last_screen_date: "2030-04-30".into(),
            poster_url: None,
            trailer_url: None,
            rating: 8.1,
            description: String::new(),
        },
        OPERATOR,
    )
    .await
    .unwrap();

    Cinema {
        state,
        clock,
        branch_id: branch.id,
        theater_id: theater.theater.id,
        movie_id: movie.id,
    }
}

/// Schedules a 10:00 showtime, opens it for orders and returns it with its seat ids.
pub async fn open_showtime(cinema: &Cinema) -> (Uuid, Vec<Uuid>) {
    open_showtime_at(cinema, "10:00").await
}

pub async fn open_showtime_at(cinema: &Cinema, start: &str) -> (Uuid, Vec<Uuid>) {
    let showtime = showtime_service::create_showtime(
        &cinema.state,
        showtime_request(cinema, cinema.theater_id, start),
        OPERATOR,
    )
    .await
    .unwrap();
    showtime_service::open_orders(&cinema.state, showtime.id, OPERATOR)
        .await
        .unwrap();

    let map = seat_service::seat_map(&cinema.state, showtime.id)
        .await
        .unwrap();
    let seats = map
        .rows
        .iter()
        .flat_map(|row| row.seats.iter().map(|seat| seat.id))
        .collect();
    (showtime.id, seats)
}

pub fn selection(holder: &str, seat_ids: &[Uuid]) -> SeatSelectionRequest {
    SeatSelectionRequest {
        holder: holder.into(),
        seat_ids: seat_ids.to_vec(),
    }
}

pub fn order(showtime_id: Uuid, holder: &str, seat_ids: &[Uuid]) -> PlaceOrderRequest {
    PlaceOrderRequest {
        showtime_id,
        holder: holder.into(),
        seat_ids: seat_ids.to_vec(),
        foods: Vec::new(),
        email: None,
        payment_reference: None,
    }
}

pub async fn seat_statuses(cinema: &Cinema, showtime_id: Uuid) -> Vec<(Uuid, SeatStatus)> {
    seat_service::seat_map(&cinema.state, showtime_id)
        .await
        .unwrap()
        .rows
        .into_iter()
        .flat_map(|row| row.seats.into_iter().map(|seat| (seat.id, seat.status)))
        .collect()
}

/// Failures a [`FlakyStore`] injects.
#[derive(Debug, Default)]
pub struct Faults {
    /// The next seat batch writes this many seats, then fails.
    pub partial_seat_write: Option<usize>,
    /// Seat reads of this showtime fail.
    pub unreadable_showtime: Option<Uuid>,
}

/// In-memory store that fails on demand.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryBookingStore,
    faults: Arc<Mutex<Faults>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_seat_write_after(&self, written: usize) {
        self.faults.lock().unwrap().partial_seat_write = Some(written);
    }

    pub fn break_seat_reads(&self, showtime_id: Option<Uuid>) {
        self.faults.lock().unwrap().unreadable_showtime = showtime_id;
    }
}

fn outage() -> StorageError {
    StorageError::unavailable(
        "flaky",
        "injected failure".into(),
        std::io::Error::other("connection reset"),
    )
}

impl BookingStore for FlakyStore {
    fn save_branch(&self, branch: BranchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_branch(branch)
    }
    fn find_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BranchEntity>>> {
        self.inner.find_branch(id)
    }
    fn list_branches(&self) -> BoxFuture<'static, StorageResult<Vec<BranchEntity>>> {
        self.inner.list_branches()
    }
    fn delete_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_branch(id)
    }

    fn save_theater(&self, theater: TheaterEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_theater(theater)
    }
    fn find_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TheaterEntity>>> {
        self.inner.find_theater(id)
    }
    fn list_theaters(
        &self,
        branch_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TheaterEntity>>> {
        self.inner.list_theaters(branch_id)
    }
    fn delete_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_theater(id)
    }

    fn save_seats(&self, seats: Vec<SeatEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_seats(seats)
    }
    fn list_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeatEntity>>> {
        self.inner.list_seats(theater_id)
    }
    fn delete_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_seats(theater_id)
    }

    fn save_movie(&self, movie: MovieEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_movie(movie)
    }
    fn find_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MovieEntity>>> {
        self.inner.find_movie(id)
    }
    fn list_movies(&self) -> BoxFuture<'static, StorageResult<Vec<MovieEntity>>> {
        self.inner.list_movies()
    }
    fn delete_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_movie(id)
    }

    fn save_food(&self, food: FoodEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_food(food)
    }
    fn find_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FoodEntity>>> {
        self.inner.find_food(id)
    }
    fn list_foods(&self, branch_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<FoodEntity>>> {
        self.inner.list_foods(branch_id)
    }
    fn delete_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_food(id)
    }

    fn save_showtime(&self, showtime: ShowtimeEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_showtime(showtime)
    }
    fn find_showtime(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ShowtimeEntity>>> {
        self.inner.find_showtime(id)
    }
    fn list_showtimes(
        &self,
        query: ShowtimeQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeEntity>>> {
        self.inner.list_showtimes(query)
    }
    fn delete_showtime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_showtime(id)
    }

    fn save_showtime_seats(
        &self,
        seats: Vec<ShowtimeSeatEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let cut = self.faults.lock().unwrap().partial_seat_write.take();
        let Some(written) = cut else {
            return self.inner.save_showtime_seats(seats);
        };
        let inner = self.inner.clone();
        Box::pin(async move {
            inner
                .save_showtime_seats(seats.into_iter().take(written).collect())
                .await?;
            Err(outage())
        })
    }
    fn list_showtime_seats(
        &self,
        showtime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>> {
        if self.faults.lock().unwrap().unreadable_showtime == Some(showtime_id) {
            return Box::pin(async { Err(outage()) });
        }
        self.inner.list_showtime_seats(showtime_id)
    }
    fn list_locked_seats(&self) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>> {
        self.inner.list_locked_seats()
    }
    fn delete_showtime_seats(&self, showtime_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.inner.delete_showtime_seats(showtime_id)
    }

    fn save_order(&self, order: OrderEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.save_order(order)
    }
    fn find_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<OrderEntity>>> {
        self.inner.find_order(id)
    }
    fn list_orders(
        &self,
        holder: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<OrderEntity>>> {
        self.inner.list_orders(holder)
    }
    fn delete_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.inner.delete_order(id)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.try_reconnect()
    }
}
