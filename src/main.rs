//! Cinema booking backend entrypoint wiring REST, SSE, storage and background jobs.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking_back::{
    config::AppConfig,
    dao::booking_store::InMemoryBookingStore,
    routes,
    services::{maintenance, sse_events},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    start_storage(&app_state).await;
    tokio::spawn(relay_degraded_status(app_state.clone()));
    maintenance::spawn(&app_state);

    let app = routes::router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Use MongoDB when `MONGO_URI` is set, otherwise keep everything in memory.
async fn start_storage(state: &SharedState) {
    if let Ok(uri) = env::var("MONGO_URI") {
        if spawn_mongo_supervisor(state, uri) {
            return;
        }
    }

    info!("using in-memory storage");
    state
        .install_store(Arc::new(InMemoryBookingStore::new()))
        .await;
}

#[cfg(feature = "mongo-store")]
fn spawn_mongo_supervisor(state: &SharedState, uri: String) -> bool {
    use cinema_booking_back::{
        dao::{
            booking_store::{
                BookingStore,
                mongodb::{MongoBookingStore, connect, ensure_indexes},
            },
            storage::StorageError,
        },
        services::storage_supervisor,
    };

    let db_name = env::var("MONGO_DB").ok();
    info!("using MongoDB storage; degraded until connected");
    tokio::spawn(storage_supervisor::run(state.clone(), move || {
        let uri = uri.clone();
        let db_name = db_name.clone();
        async move {
            let manager = connect(&uri, db_name.as_deref()).await?;
            ensure_indexes(&manager.database().await).await?;
            let store: Arc<dyn BookingStore> = Arc::new(MongoBookingStore::new(manager));
            Ok::<_, StorageError>(store)
        }
    }));
    true
}

#[cfg(not(feature = "mongo-store"))]
fn spawn_mongo_supervisor(_state: &SharedState, _uri: String) -> bool {
    tracing::warn!("MONGO_URI is set but the `mongo-store` feature is disabled");
    false
}

/// Push degraded-mode transitions to SSE clients.
async fn relay_degraded_status(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        let degraded = *watcher.borrow_and_update();
        sse_events::broadcast_system_status(&state, degraded);
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
