mod error;
mod manager;
mod store;

pub use error::{MongoDaoError, MongoResult};
pub use manager::{MongoManager, connect, ensure_indexes};
pub use store::MongoBookingStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable("mongodb", err.to_string(), err)
    }
}
