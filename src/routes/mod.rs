use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::SharedState;

pub mod admin;
pub mod catalog;
pub mod docs;
pub mod health;
pub mod orders;
pub mod reports;
pub mod showtimes;
pub mod sse;

/// Compose every route tree with the shared state and cross-cutting layers.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(catalog::router())
        .merge(showtimes::router())
        .merge(orders::router())
        .merge(admin::router(state.clone()));

    api_router
        .merge(docs::router())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
