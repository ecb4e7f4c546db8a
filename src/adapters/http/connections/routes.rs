//! Axum router configuration for connection endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{analyze_connections, list_connections, ConnectionsAppState};

/// Create the connections API router.
///
/// # Routes
///
/// - `GET /` - List the caller's stored connections
/// - `POST /analyze` - Run analysis and replace the stored set
///
/// Suitable for mounting at `/api/connections`.
pub fn connections_router() -> Router<ConnectionsAppState> {
    Router::new()
        .route("/", get(list_connections))
        .route("/analyze", post(analyze_connections))
}
