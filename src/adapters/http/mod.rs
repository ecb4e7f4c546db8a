//! HTTP adapters - REST API implementations.

pub mod connections;
pub mod health;

use axum::Router;

pub use connections::{connections_router, ConnectionsAppState};
pub use health::health_router;

/// Full API: `/health` plus `/api/connections`.
pub fn api_router(state: ConnectionsAppState) -> Router {
    Router::new()
        .nest("/api/connections", connections_router())
        .merge(health_router())
        .with_state(state)
}
