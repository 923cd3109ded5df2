use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection,
    bson::{Document, doc},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::dao::{
    booking_store::{BookingStore, ShowtimeQuery},
    calendar::format_date,
    models::{
        BranchEntity, FoodEntity, MovieEntity, OrderEntity, SeatEntity, SeatStatus,
        ShowtimeEntity, ShowtimeSeatEntity, TheaterEntity,
    },
    storage::StorageResult,
};

use super::{MongoDaoError, MongoManager, error::MongoResult};

/// Envelope persisted for every entity.
///
/// The entity body round-trips through serde untouched while `refs` carries
/// plain string copies of the foreign keys so filters never depend on how the
/// driver encodes UUIDs.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord<T> {
    #[serde(rename = "_id")]
    key: String,
    #[serde(default)]
    refs: RecordRefs,
    body: T,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RecordRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    theater: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    movie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    showtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    show_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    holder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

/// Entities the MongoDB store knows how to persist.
trait Record: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    const COLLECTION: &'static str;

    fn key(&self) -> Uuid;

    fn refs(&self) -> RecordRefs {
        RecordRefs::default()
    }
}

impl Record for BranchEntity {
    const COLLECTION: &'static str = "branches";

    fn key(&self) -> Uuid {
        self.id
    }
}

impl Record for TheaterEntity {
    const COLLECTION: &'static str = "theaters";

    fn key(&self) -> Uuid {
        self.id
    }

    fn refs(&self) -> RecordRefs {
        RecordRefs {
            branch: Some(self.branch_id.to_string()),
            ..RecordRefs::default()
        }
    }
}

impl Record for SeatEntity {
    const COLLECTION: &'static str = "seats";

    fn key(&self) -> Uuid {
        self.id
    }

    fn refs(&self) -> RecordRefs {
        RecordRefs {
            theater: Some(self.theater_id.to_string()),
            ..RecordRefs::default()
        }
    }
}

impl Record for MovieEntity {
    const COLLECTION: &'static str = "movies";

    fn key(&self) -> Uuid {
        self.id
    }
}

impl Record for FoodEntity {
    const COLLECTION: &'static str = "foods";

    fn key(&self) -> Uuid {
        self.id
    }

    fn refs(&self) -> RecordRefs {
        RecordRefs {
            branch: Some(self.branch_id.to_string()),
            ..RecordRefs::default()
        }
    }
}

impl Record for ShowtimeEntity {
    const COLLECTION: &'static str = "showtimes";

    fn key(&self) -> Uuid {
        self.id
    }

    fn refs(&self) -> RecordRefs {
        RecordRefs {
            theater: Some(self.theater_id.to_string()),
            movie: Some(self.movie_id.to_string()),
            show_date: Some(format_date(self.show_date)),
            ..RecordRefs::default()
        }
    }
}

impl Record for ShowtimeSeatEntity {
    const COLLECTION: &'static str = "showtime_seats";

    fn key(&self) -> Uuid {
        self.id
    }

    fn refs(&self) -> RecordRefs {
        RecordRefs {
            showtime: Some(self.showtime_id.to_string()),
            status: Some(seat_status_key(self.status).to_owned()),
            ..RecordRefs::default()
        }
    }
}

impl Record for OrderEntity {
    const COLLECTION: &'static str = "orders";

    fn key(&self) -> Uuid {
        self.id
    }

    fn refs(&self) -> RecordRefs {
        RecordRefs {
            showtime: Some(self.showtime_id.to_string()),
            holder: Some(self.holder.clone()),
            ..RecordRefs::default()
        }
    }
}

fn seat_status_key(status: SeatStatus) -> &'static str {
    match status {
        SeatStatus::Available => "available",
        SeatStatus::Locked => "locked",
        SeatStatus::Booked => "booked",
    }
}

/// MongoDB-backed [`BookingStore`] implementation.
#[derive(Clone)]
pub struct MongoBookingStore {
    mongo: MongoManager,
}

impl MongoBookingStore {
    pub fn new(mongo: MongoManager) -> Self {
        Self { mongo }
    }

    async fn collection<T: Record>(&self) -> Collection<StoredRecord<T>> {
        self.mongo
            .database()
            .await
            .collection::<StoredRecord<T>>(T::COLLECTION)
    }

    async fn upsert<T: Record>(&self, entity: T) -> MongoResult<()> {
        let key = entity.key().to_string();
        let record = StoredRecord {
            key: key.clone(),
            refs: entity.refs(),
            body: entity,
        };

        self.collection::<T>()
            .await
            .replace_one(doc! { "_id": &key }, &record)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Save {
                collection: T::COLLECTION,
                key,
                source,
            })?;

        Ok(())
    }

    async fn upsert_all<T: Record>(&self, entities: Vec<T>) -> MongoResult<()> {
        for entity in entities {
            self.upsert(entity).await?;
        }
        Ok(())
    }

    async fn find_one<T: Record>(&self, id: Uuid) -> MongoResult<Option<T>> {
        let record = self
            .collection::<T>()
            .await
            .find_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: T::COLLECTION,
                source,
            })?;

        Ok(record.map(|record| record.body))
    }

    async fn find_where<T: Record>(&self, filter: Document) -> MongoResult<Vec<T>> {
        let collection = self.collection::<T>().await;
        let records: Vec<StoredRecord<T>> = collection
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: T::COLLECTION,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: T::COLLECTION,
                source,
            })?;

        Ok(records.into_iter().map(|record| record.body).collect())
    }

    async fn delete_one<T: Record>(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .collection::<T>()
            .await
            .delete_one(doc! { "_id": id.to_string() })
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: T::COLLECTION,
                source,
            })?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_where<T: Record>(&self, filter: Document) -> MongoResult<u64> {
        let result = self
            .collection::<T>()
            .await
            .delete_many(filter)
            .await
            .map_err(|source| MongoDaoError::Delete {
                collection: T::COLLECTION,
                source,
            })?;

        Ok(result.deleted_count)
    }

    fn showtime_filter(query: &ShowtimeQuery) -> Document {
        let mut filter = Document::new();
        if let Some(date) = query.show_date {
            filter.insert("refs.show_date", format_date(date));
        }
        if let Some(movie_id) = query.movie_id {
            filter.insert("refs.movie", movie_id.to_string());
        }
        if let Some(theater_ids) = &query.theater_ids {
            let ids: Vec<String> = theater_ids.iter().map(Uuid::to_string).collect();
            filter.insert("refs.theater", doc! { "$in": ids });
        }
        filter
    }
}

/// Box a store operation and map the MongoDB error into a [`StorageError`].
///
/// [`StorageError`]: crate::dao::storage::StorageError
macro_rules! boxed {
    ($store:expr, |$s:ident| $body:expr) => {{
        let $s = $store.clone();
        Box::pin(async move { $body.await.map_err(Into::into) })
    }};
}

impl BookingStore for MongoBookingStore {
    fn save_branch(&self, branch: BranchEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert(branch))
    }

    fn find_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<BranchEntity>>> {
        boxed!(self, |s| s.find_one::<BranchEntity>(id))
    }

    fn list_branches(&self) -> BoxFuture<'static, StorageResult<Vec<BranchEntity>>> {
        boxed!(self, |s| s.find_where::<BranchEntity>(doc! {}))
    }

    fn delete_branch(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        boxed!(self, |s| s.delete_one::<BranchEntity>(id))
    }

    fn save_theater(&self, theater: TheaterEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert(theater))
    }

    fn find_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TheaterEntity>>> {
        boxed!(self, |s| s.find_one::<TheaterEntity>(id))
    }

    fn list_theaters(
        &self,
        branch_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TheaterEntity>>> {
        boxed!(self, |s| s.find_where::<TheaterEntity>(
            doc! { "refs.branch": branch_id.to_string() }
        ))
    }

    fn delete_theater(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        boxed!(self, |s| s.delete_one::<TheaterEntity>(id))
    }

    fn save_seats(&self, seats: Vec<SeatEntity>) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert_all(seats))
    }

    fn list_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<SeatEntity>>> {
        boxed!(self, |s| s.find_where::<SeatEntity>(
            doc! { "refs.theater": theater_id.to_string() }
        ))
    }

    fn delete_seats(&self, theater_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        boxed!(self, |s| s.delete_where::<SeatEntity>(
            doc! { "refs.theater": theater_id.to_string() }
        ))
    }

    fn save_movie(&self, movie: MovieEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert(movie))
    }

    fn find_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<MovieEntity>>> {
        boxed!(self, |s| s.find_one::<MovieEntity>(id))
    }

    fn list_movies(&self) -> BoxFuture<'static, StorageResult<Vec<MovieEntity>>> {
        boxed!(self, |s| s.find_where::<MovieEntity>(doc! {}))
    }

    fn delete_movie(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        boxed!(self, |s| s.delete_one::<MovieEntity>(id))
    }

    fn save_food(&self, food: FoodEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert(food))
    }

    fn find_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<FoodEntity>>> {
        boxed!(self, |s| s.find_one::<FoodEntity>(id))
    }

    fn list_foods(&self, branch_id: Uuid) -> BoxFuture<'static, StorageResult<Vec<FoodEntity>>> {
        boxed!(self, |s| s.find_where::<FoodEntity>(
            doc! { "refs.branch": branch_id.to_string() }
        ))
    }

    fn delete_food(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        boxed!(self, |s| s.delete_one::<FoodEntity>(id))
    }

    fn save_showtime(&self, showtime: ShowtimeEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert(showtime))
    }

    fn find_showtime(
        &self,
        id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Option<ShowtimeEntity>>> {
        boxed!(self, |s| s.find_one::<ShowtimeEntity>(id))
    }

    fn list_showtimes(
        &self,
        query: ShowtimeQuery,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeEntity>>> {
        let filter = Self::showtime_filter(&query);
        boxed!(self, |s| s.find_where::<ShowtimeEntity>(filter))
    }

    fn delete_showtime(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        boxed!(self, |s| s.delete_one::<ShowtimeEntity>(id))
    }

    fn save_showtime_seats(
        &self,
        seats: Vec<ShowtimeSeatEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert_all(seats))
    }

    fn list_showtime_seats(
        &self,
        showtime_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>> {
        boxed!(self, |s| s.find_where::<ShowtimeSeatEntity>(
            doc! { "refs.showtime": showtime_id.to_string() }
        ))
    }

    fn list_locked_seats(&self) -> BoxFuture<'static, StorageResult<Vec<ShowtimeSeatEntity>>> {
        boxed!(self, |s| s.find_where::<ShowtimeSeatEntity>(
            doc! { "refs.status": seat_status_key(SeatStatus::Locked) }
        ))
    }

    fn delete_showtime_seats(&self, showtime_id: Uuid) -> BoxFuture<'static, StorageResult<u64>> {
        boxed!(self, |s| s.delete_where::<ShowtimeSeatEntity>(
            doc! { "refs.showtime": showtime_id.to_string() }
        ))
    }

    fn save_order(&self, order: OrderEntity) -> BoxFuture<'static, StorageResult<()>> {
        boxed!(self, |s| s.upsert(order))
    }

    fn find_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<OrderEntity>>> {
        boxed!(self, |s| s.find_one::<OrderEntity>(id))
    }

    fn list_orders(
        &self,
        holder: Option<String>,
    ) -> BoxFuture<'static, StorageResult<Vec<OrderEntity>>> {
        let filter = match holder {
            Some(holder) => doc! { "refs.holder": holder },
            None => doc! {},
        };
        boxed!(self, |s| s.find_where::<OrderEntity>(filter))
    }

    fn delete_order(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        boxed!(self, |s| s.delete_one::<OrderEntity>(id))
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let mongo = self.mongo.clone();
        Box::pin(async move { mongo.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let mongo = self.mongo.clone();
        Box::pin(async move { mongo.reconnect().await.map_err(Into::into) })
    }
}
