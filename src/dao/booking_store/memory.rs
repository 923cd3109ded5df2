//! Process-local [`BookingStore`] used when no database is configured and by tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    booking_store::{BookingStore, ShowtimeQuery},
    models::{
        BranchEntity, FoodEntity, MovieEntity, OrderEntity, SeatEntity, SeatStatus,
        ShowtimeEntity, ShowtimeSeatEntity, TheaterEntity,
    },
    storage::StorageResult,
};

#[derive(Default)]
struct Tables {
    branches: IndexMap<Uuid, BranchEntity>,
    theaters: IndexMap<Uuid, TheaterEntity>,
    seats: IndexMap<Uuid, SeatEntity>,
    movies: IndexMap<Uuid, MovieEntity>,
    foods: IndexMap<Uuid, FoodEntity>,
    showtimes: IndexMap<Uuid, ShowtimeEntity>,
    showtime_seats: IndexMap<Uuid, ShowtimeSeatEntity>,
    orders: IndexMap<Uuid, OrderEntity>,
}

/// In-memory [`BookingStore`] keeping insertion order for stable listings.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        F: FnOnce(&Tables) -> T + Send + 'static,
        T: Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let guard = tables.read().await;
            Ok(f(&guard))
        })
    }

    fn write<T, F>(&self, f: F) -> BoxFuture<'static, StorageResult<T>>
    where
        F: FnOnce(&mut Tables) -> T + Send + 'static,
        T: Send + 'static,
    {
        let tables = self.tables.clone();
        Box::pin(async move {
            let mut guard = tables.write().await;
            Ok(f(&mut guard))
        })
    }
}

impl BookingStore for InMemoryBookingStore {
    fn save_branch(&self, branch: BranchEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.branches.insert(branch.id, branch);
        })
    }

    fn find_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BranchEntity>>> {
        self.read(move |t| t.branches.get(&id).cloned())
    }

    fn list_branches(&self) -> BoxFuture<'static, StorageResult<Vec<BranchEntity>>> {
        self.read(|t| t.branches.values().cloned().collect())
    }

    fn delete_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| t.branches.shift_remove(&id).is_some())
    }

    fn save_theater(&self, theater: TheaterEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.theaters.insert(theater.id, theater);
        })
    }

    fn find_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TheaterEntity>>> {
        self.read(move |t| t.theaters.get(&id).cloned())
    }

    fn list_theaters(
        &self,
        branch_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TheaterEntity>>> {
        self.read(move |t| {
            t.theaters
                .values()
                .filter(|theater| theater.branch_id == branch_id)
                .cloned()
                .collect()
        })
    }

    fn delete_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| t.theaters.shift_remove(&id).is_some())
    }

    fn save_seats(&self, seats: Vec<SeatEntity>) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            for seat in seats {
                t.seats.insert(seat.id, seat);
            }
        })
    }

    fn list_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeatEntity>>> {
        self.read(move |t| {
            t.seats
                .values()
                .filter(|seat| seat.theater_id == theater_id)
                .cloned()
                .collect()
        })
    }

    fn delete_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.write(move |t| {
            let before = t.seats.len();
            t.seats.retain(|_, seat| seat.theater_id != theater_id);
            (before - t.seats.len()) as u64
        })
    }

    fn save_movie(&self, movie: MovieEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.movies.insert(movie.id, movie);
        })
    }

    fn find_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MovieEntity>>> {
        self.read(move |t| t.movies.get(&id).cloned())
    }

    fn list_movies(&self) -> BoxFuture<'static, StorageResult<Vec<MovieEntity>>> {
        self.read(|t| t.movies.values().cloned().collect())
    }

    fn delete_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| t.movies.shift_remove(&id).is_some())
    }

    fn save_food(&self, food: FoodEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.foods.insert(food.id, food);
        })
    }

    fn find_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FoodEntity>>> {
        self.read(move |t| t.foods.get(&id).cloned())
    }

    fn list_foods(&self, branch_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<FoodEntity>>> {
        self.read(move |t| {
            t.foods
                .values()
                .filter(|food| food.branch_id == branch_id)
                .cloned()
                .collect()
        })
    }

    fn delete_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| t.foods.shift_remove(&id).is_some())
    }

    fn save_showtime(&self, showtime: ShowtimeEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.showtimes.insert(showtime.id, showtime);
        })
    }

    fn find_showtime(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ShowtimeEntity>>> {
        self.read(move |t| t.showtimes.get(&id).cloned())
    }

    fn list_showtimes(
        &self,
        query: ShowtimeQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeEntity>>> {
        self.read(move |t| {
            t.showtimes
                .values()
                .filter(|showtime| query.matches(showtime))
                .cloned()
                .collect()
        })
    }

    fn delete_showtime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| t.showtimes.shift_remove(&id).is_some())
    }

    fn save_showtime_seats(
        &self,
        seats: Vec<ShowtimeSeatEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            for seat in seats {
                t.showtime_seats.insert(seat.id, seat);
            }
        })
    }

    fn list_showtime_seats(
        &self,
        showtime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>> {
        self.read(move |t| {
            t.showtime_seats
                .values()
                .filter(|seat| seat.showtime_id == showtime_id)
                .cloned()
                .collect()
        })
    }

    fn list_locked_seats(&self) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>> {
        self.read(|t| {
            t.showtime_seats
                .values()
                .filter(|seat| seat.status == SeatStatus::Locked)
                .cloned()
                .collect()
        })
    }

    fn delete_showtime_seats(&self, showtime_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        self.write(move |t| {
            let before = t.showtime_seats.len();
            t.showtime_seats
                .retain(|_, seat| seat.showtime_id != showtime_id);
            (before - t.showtime_seats.len()) as u64
        })
    }

    fn save_order(&self, order: OrderEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.write(move |t| {
            t.orders.insert(order.id, order);
        })
    }

    fn find_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<OrderEntity>>> {
        self.read(move |t| t.orders.get(&id).cloned())
    }

    fn list_orders(
        &self,
        holder: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<OrderEntity>>> {
        self.read(move |t| {
            t.orders
                .values()
                .filter(|order| holder.as_deref().is_none_or(|h| order.holder == h))
                .cloned()
                .collect()
        })
    }

    fn delete_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.write(move |t| t.orders.shift_remove(&id).is_some())
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::AuditStamp;
    use time::macros::{date, datetime, time};

    fn showtime(theater_id: Uuid, movie_id: Uuid) -> ShowtimeEntity {
        ShowtimeEntity {
            id: Uuid::new_v4(),
            theater_id,
            movie_id,
            show_date: date!(2025 - 07 - 01),
            start_time: time!(10:00),
            end_time: time!(12:00),
            status: crate::dao::models::ShowtimeStatus::Scheduled,
            open_for_orders: false,
            cancel_reason: None,
            audit: AuditStamp::new(datetime!(2025-06-01 09:00 UTC), "tester"),
        }
    }

    #[tokio::test]
    async fn showtime_query_filters_by_theater_and_movie() {
        let store = InMemoryBookingStore::new();
        let (theater_a, theater_b) = (Uuid::new_v4(), Uuid::new_v4());
        let movie = Uuid::new_v4();

        store.save_showtime(showtime(theater_a, movie)).await.unwrap();
        store
            .save_showtime(showtime(theater_b, Uuid::new_v4()))
            .await
            .unwrap();

        let in_a = store
            .list_showtimes(ShowtimeQuery::default().in_theaters(vec![theater_a]))
            .await
            .unwrap();
        assert_eq!(in_a.len(), 1);

        let for_movie = store
            .list_showtimes(ShowtimeQuery::default().for_movie(movie))
            .await
            .unwrap();
        assert_eq!(for_movie[0].theater_id, theater_a);

        let other_day = store
            .list_showtimes(ShowtimeQuery::default().on_date(date!(2025 - 07 - 02)))
            .await
            .unwrap();
        assert!(other_day.is_empty());
    }

    #[tokio::test]
    async fn deleting_showtime_seats_reports_count() {
        let store = InMemoryBookingStore::new();
        let showtime_id = Uuid::new_v4();
        let seat = SeatEntity {
            id: Uuid::new_v4(),
            theater_id: Uuid::new_v4(),
            row_name: "A".into(),
            row_index: 0,
            column: 0,
            seat_number: 1,
            description: None,
        };

        store
            .save_showtime_seats(vec![
                ShowtimeSeatEntity::seed(showtime_id, &seat, 50_000),
                ShowtimeSeatEntity::seed(Uuid::new_v4(), &seat, 50_000),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_showtime_seats(showtime_id).await.unwrap(), 1);
        assert!(store.list_showtime_seats(showtime_id).await.unwrap().is_empty());
    }
}
