//! Connections HTTP adapter - REST API for running and reading analyses.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{ConnectionsAppState, UserContext, USER_ID_HEADER};
pub use routes::connections_router;
