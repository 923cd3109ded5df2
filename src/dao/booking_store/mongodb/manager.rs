use std::{sync::Arc, time::Duration};

use mongodb::{
    Client, Database, IndexModel,
    bson::{Document, doc},
    options::{ClientOptions, IndexOptions},
};
use tokio::{
    sync::RwLock,
    time::{MissedTickBehavior, interval, sleep},
};
use tracing::{info, warn};

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "cinema_booking";
const CONNECT_ATTEMPTS: u32 = 10;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);
const WATCH_INTERVAL: Duration = Duration::from_secs(30);

/// Indexes backing the hot lookups: showtimes per theater/day and seats per showtime.
const INDEXES: &[(&str, &str, &[&str])] = &[
    ("showtimes", "showtime_theater_date_idx", &["refs.theater", "refs.show_date"]),
    ("showtimes", "showtime_movie_date_idx", &["refs.movie", "refs.show_date"]),
    ("showtime_seats", "showtime_seat_showtime_idx", &["refs.showtime"]),
    ("showtime_seats", "showtime_seat_status_idx", &["refs.status"]),
    ("seats", "seat_theater_idx", &["refs.theater"]),
    ("theaters", "theater_branch_idx", &["refs.branch"]),
    ("orders", "order_holder_idx", &["refs.holder"]),
];

/// Cloneable MongoDB handle. The underlying client is swapped on reconnect.
#[derive(Clone)]
pub struct MongoManager {
    shared: Arc<Shared>,
}

struct Shared {
    database: RwLock<Database>,
    options: ClientOptions,
    database_name: String,
}

/// Connect to MongoDB, retrying with backoff, and start the background watcher.
pub async fn connect(uri: &str, db_name: Option<&str>) -> MongoResult<MongoManager> {
    let options = ClientOptions::parse(uri)
        .await
        .map_err(|source| MongoDaoError::InvalidUri {
            uri: uri.to_owned(),
            source,
        })?;
    let database_name = db_name.unwrap_or(DEFAULT_DB).to_owned();

    let database = open_database(&options, &database_name).await?;
    let shared = Arc::new(Shared {
        database: RwLock::new(database),
        options,
        database_name,
    });
    watch(&shared);

    info!(database = %shared.database_name, "connected to MongoDB");
    Ok(MongoManager { shared })
}

/// Create the indexes used by booking queries. Existing indexes are left alone.
pub async fn ensure_indexes(database: &Database) -> MongoResult<()> {
    for &(collection, index, fields) in INDEXES {
        let mut keys = Document::new();
        for field in fields {
            keys.insert(*field, 1);
        }
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().name(Some(index.to_owned())).build())
            .build();

        database
            .collection::<Document>(collection)
            .create_index(model)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection,
                index,
                source,
            })?;
    }
    Ok(())
}

impl MongoManager {
    /// Current database handle.
    pub async fn database(&self) -> Database {
        self.shared.database.read().await.clone()
    }

    pub async fn ping(&self) -> MongoResult<()> {
        self.shared.ping().await
    }

    /// Open a fresh client and swap it in.
    pub async fn reconnect(&self) -> MongoResult<()> {
        self.shared.reopen().await
    }
}

impl Shared {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(MongoDaoError::Ping)
    }

    async fn reopen(&self) -> MongoResult<()> {
        let database = open_database(&self.options, &self.database_name).await?;
        *self.database.write().await = database;
        info!("MongoDB client replaced");
        Ok(())
    }
}

/// Ping periodically and reopen the client when the ping fails.
///
/// The task ends once every manager handle is dropped.
fn watch(shared: &Arc<Shared>) {
    let weak = Arc::downgrade(shared);
    tokio::spawn(async move {
        let mut ticker = interval(WATCH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick fires immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let Some(shared) = weak.upgrade() else {
                break;
            };
            let Err(err) = shared.ping().await else {
                continue;
            };
            warn!(error = %err, "MongoDB watcher ping failed; reopening client");
            if let Err(err) = shared.reopen().await {
                warn!(error = %err, "MongoDB watcher could not reopen the client");
            }
        }
    });
}

async fn open_database(options: &ClientOptions, database_name: &str) -> MongoResult<Database> {
    let client =
        Client::with_options(options.clone()).map_err(MongoDaoError::ClientConstruction)?;
    let database = client.database(database_name);

    let mut delay = FIRST_RETRY_DELAY;
    let mut attempt = 0;
    loop {
        attempt += 1;
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok(database),
            Err(source) if attempt >= CONNECT_ATTEMPTS => {
                return Err(MongoDaoError::Unreachable {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                warn!(
                    attempt,
                    retry_in_ms = delay.as_millis(),
                    error = %err,
                    "MongoDB not reachable yet"
                );
                sleep(delay).await;
                delay = (delay * 2).min(MAX_RETRY_DELAY);
            }
        }
    }
}
