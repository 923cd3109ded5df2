pub mod clock;
pub mod scheduling;
pub mod seat_ledger;
mod sse;

use std::{future::Future, sync::Arc, time::Duration};

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::{AppConfig, BookingRules},
    dao::booking_store::BookingStore,
    error::ServiceError,
};

pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

const PUBLIC_SSE_CAPACITY: usize = 64;

/// Central application state: storage handle, realtime hub, configuration and mutation gates.
pub struct AppState {
    booking_store: RwLock<Option<Arc<dyn BookingStore>>>,
    degraded: watch::Sender<bool>,
    public_sse: SseHub,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    /// One gate per showtime serializing every change to its seats.
    showtime_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    /// Serializes conflict detection with insertion of new showtimes.
    scheduling_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] running on the system clock.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let clock = Arc::new(SystemClock::new(config.utc_offset()));
        Self::with_clock(config, clock)
    }

    /// Construct a new [`AppState`] with an explicit time source.
    pub fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            booking_store: RwLock::new(None),
            degraded: degraded_tx,
            public_sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            config,
            clock,
            showtime_gates: DashMap::new(),
            scheduling_gate: Mutex::new(()),
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn booking_store(&self) -> Option<Arc<dyn BookingStore>> {
        let guard = self.booking_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store, or [`ServiceError::Degraded`] while none is installed.
    pub async fn require_store(&self) -> Result<Arc<dyn BookingStore>, ServiceError> {
        self.booking_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn BookingStore>) {
        {
            let mut guard = self.booking_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.booking_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.booking_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn rules(&self) -> &BookingRules {
        self.config.rules()
    }

    /// Current venue time.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Update and broadcast the degraded flag when the value changes.
    fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Run `work` while holding the gate of `showtime_id`.
    ///
    /// Waiting for the gate counts against the operation timeout.
    pub async fn run_gated<F, Fut, T>(&self, showtime_id: Uuid, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self
            .showtime_gates
            .entry(showtime_id)
            .or_default()
            .value()
            .clone();

        let guarded = async {
            let _guard = gate.lock().await;
            work().await
        };
        self.with_timeout(guarded, "showtime", showtime_id).await
    }

    /// Run `work` while holding the scheduling gate.
    pub async fn run_scheduling<F, Fut, T>(&self, work: F) -> Result<T, ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let guarded = async {
            let _guard = self.scheduling_gate.lock().await;
            work().await
        };
        self.with_timeout(guarded, "scheduling", Uuid::nil()).await
    }

    /// Drop the gate of a deleted showtime.
    pub fn forget_showtime_gate(&self, showtime_id: Uuid) {
        self.showtime_gates.remove(&showtime_id);
    }

    async fn with_timeout<T>(
        &self,
        work: impl Future<Output = Result<T, ServiceError>>,
        gate: &'static str,
        id: Uuid,
    ) -> Result<T, ServiceError> {
        let limit: Duration = self.rules().operation_timeout;
        match timeout(limit, work).await {
            Ok(result) => result,
            Err(_) => {
                warn!(gate, %id, timeout_ms = limit.as_millis(), "gated operation timed out");
                Err(ServiceError::Timeout)
            }
        }
    }
}
