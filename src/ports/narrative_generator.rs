//! Narrative generator port.
//!
//! Turns the statistics of one connection into a title, a description and
//! an explanation. Output is treated as an opaque annotation; failures are
//! always recoverable and never block persistence.

use async_trait::async_trait;

use crate::domain::connections::{ConnectionSummary, Narrative};

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate_narrative(
        &self,
        summary: &ConnectionSummary,
    ) -> Result<Narrative, NarrativeError>;
}

/// Narrative generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarrativeError {
    /// Request timed out.
    #[error("narrative request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Provider is unavailable.
    #[error("narrative provider unavailable: {message}")]
    Unavailable { message: String },

    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// No provider configured.
    #[error("narrative generation is not configured")]
    NotConfigured,
}

impl NarrativeError {
    pub fn timeout(timeout_secs: u64) -> Self {
        Self::Timeout { timeout_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Whether a later attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Unavailable { .. } | Self::RateLimited { .. }
        )
    }
}
