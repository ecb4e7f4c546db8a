//! Connection command and query handlers.

mod analyze_connections;
mod get_connections;

pub use analyze_connections::{
    AnalysisError, AnalyzeConnectionsCommand, AnalyzeConnectionsConfig, AnalyzeConnectionsHandler,
    AnalyzeConnectionsResult,
};
pub use get_connections::{GetConnectionsHandler, GetConnectionsQuery};
