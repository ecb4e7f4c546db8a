//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Bind address is not host:port: {0}")]
    InvalidAddress(String),

    #[error("Request timeout must be positive")]
    InvalidTimeout,

    #[error("Request timeout must exceed the analysis run timeout")]
    RequestTimeoutBelowRunTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool max_connections must be between 1 and 100")]
    InvalidPoolSize,

    #[error("Invalid narrative base URL")]
    InvalidNarrativeUrl,

    #[error("Invalid narrative timeout")]
    InvalidNarrativeTimeout,

    #[error("Worker pool size must be between 1 and 64")]
    InvalidWorkerPoolSize,

    #[error("Invalid analysis run timeout")]
    InvalidRunTimeout,

    #[error("Invalid analysis defaults: {0}")]
    InvalidAnalysisDefaults(String),
}
