//! Domain data source port.
//!
//! Abstracts whatever storage holds a user's raw life events. Adapters
//! deliver per-metric observations for one domain and one date range; the
//! engine does the bucketing.

use async_trait::async_trait;

use crate::domain::connections::MetricObservations;
use crate::domain::foundation::{DateRange, DomainError, DomainId, UserId};

/// Read-only access to per-domain observations.
#[async_trait]
pub trait DomainDataSource: Send + Sync {
    /// Domains the user has any data for.
    ///
    /// # Errors
    ///
    /// - `DataSourceUnavailable` when the backing store cannot be reached
    async fn list_domains(&self, user_id: &UserId) -> Result<Vec<DomainId>, DomainError>;

    /// Observations for every metric of `domain` within `range`.
    ///
    /// Binary metrics should carry an explicit `0` for tracked days without
    /// the activity; absent days are treated as unknown.
    ///
    /// # Errors
    ///
    /// - `DataSourceUnavailable` when the backing store cannot be reached
    async fn fetch_domain_series(
        &self,
        user_id: &UserId,
        domain: &DomainId,
        range: &DateRange,
    ) -> Result<Vec<MetricObservations>, DomainError>;
}
