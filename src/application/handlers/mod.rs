//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod connections;

pub use connections::{
    AnalysisError, AnalyzeConnectionsCommand, AnalyzeConnectionsConfig, AnalyzeConnectionsHandler,
    AnalyzeConnectionsResult, GetConnectionsHandler, GetConnectionsQuery,
};
