use mongodb::error::Error as MongoError;
use thiserror::Error;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("could not create the MongoDB client")]
    ClientConstruction(#[source] MongoError),
    #[error("MongoDB unreachable after {attempts} attempt(s)")]
    Unreachable {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB did not answer the ping")]
    Ping(#[source] MongoError),
    #[error("could not create index `{index}` on `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save `{key}` into `{collection}`")]
    Save {
        collection: &'static str,
        key: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to query `{collection}`")]
    Query {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete from `{collection}`")]
    Delete {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
}
