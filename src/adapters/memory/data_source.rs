//! In-memory domain data source.
//!
//! Holds per-user metric observations in memory. Useful for development,
//! demos, and tests; supports simulated latency and outages.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::domain::connections::MetricObservations;
use crate::domain::foundation::{coerce_date, DateRange, DomainError, DomainId, ErrorCode, UserId};
use crate::ports::DomainDataSource;

#[derive(Debug, Default)]
pub struct InMemoryDomainDataSource {
    metrics: RwLock<HashMap<UserId, Vec<MetricObservations>>>,
    /// When set, every call fails with this message.
    failure: RwLock<Option<String>>,
    delay: Duration,
}

impl InMemoryDomainDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds observations for a user during setup.
    pub fn with_metrics(mut self, user_id: &UserId, metrics: Vec<MetricObservations>) -> Self {
        self.metrics
            .get_mut()
            .entry(user_id.clone())
            .or_default()
            .extend(metrics);
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces everything stored for a user.
    pub async fn set_metrics(&self, user_id: &UserId, metrics: Vec<MetricObservations>) {
        self.metrics.write().await.insert(user_id.clone(), metrics);
    }

    /// Makes subsequent calls fail (`Some`) or succeed again (`None`).
    pub async fn set_failure(&self, message: Option<String>) {
        *self.failure.write().await = message;
    }

    async fn simulate(&self) -> Result<(), DomainError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        match self.failure.read().await.as_ref() {
            Some(message) => Err(DomainError::new(
                ErrorCode::DataSourceUnavailable,
                message.clone(),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DomainDataSource for InMemoryDomainDataSource {
    async fn list_domains(&self, user_id: &UserId) -> Result<Vec<DomainId>, DomainError> {
        self.simulate().await?;
        let metrics = self.metrics.read().await;
        let domains: BTreeSet<DomainId> = metrics
            .get(user_id)
            .map(|m| m.iter().map(|metric| metric.domain_id.clone()).collect())
            .unwrap_or_default();
        Ok(domains.into_iter().collect())
    }

    async fn fetch_domain_series(
        &self,
        user_id: &UserId,
        domain: &DomainId,
        range: &DateRange,
    ) -> Result<Vec<MetricObservations>, DomainError> {
        self.simulate().await?;
        let metrics = self.metrics.read().await;
        let Some(all) = metrics.get(user_id) else {
            return Ok(Vec::new());
        };

        // Unparseable dates are passed through so the builder can count them.
        Ok(all
            .iter()
            .filter(|metric| &metric.domain_id == domain)
            .map(|metric| {
                let mut metric = metric.clone();
                metric
                    .observations
                    .retain(|o| coerce_date(&o.date).map_or(true, |d| range.contains(d)));
                metric
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connections::ValueType;
    use chrono::NaiveDate;

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn source() -> InMemoryDomainDataSource {
        InMemoryDomainDataSource::new().with_metrics(
            &user(),
            vec![
                MetricObservations::new(DomainId::new("sleep").unwrap(), "hours", ValueType::Continuous)
                    .with_observation(day(1), 7.0)
                    .with_observation(day(20), 8.0),
                MetricObservations::new(DomainId::new("mood").unwrap(), "score", ValueType::Continuous)
                    .with_observation(day(2), 3.0),
                MetricObservations::new(DomainId::new("sleep").unwrap(), "quality", ValueType::Continuous)
                    .with_observation(day(2), 3.0),
            ],
        )
    }

    #[tokio::test]
    async fn lists_distinct_domains_in_order() {
        let domains = source().list_domains(&user()).await.unwrap();
        let names: Vec<&str> = domains.iter().map(DomainId::as_str).collect();
        assert_eq!(names, vec!["mood", "sleep"]);
    }

    #[tokio::test]
    async fn fetch_returns_metrics_of_the_domain_within_range() {
        let range = DateRange::new(day(1), day(10)).unwrap();
        let metrics = source()
            .fetch_domain_series(&user(), &DomainId::new("sleep").unwrap(), &range)
            .await
            .unwrap();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[0].observations.len(), 1);
    }

    #[tokio::test]
    async fn unknown_user_has_no_data() {
        let other = UserId::new("other").unwrap();
        assert!(source().list_domains(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failure_is_data_source_unavailable() {
        let source = source();
        source.set_failure(Some("offline".to_string())).await;

        let err = source.list_domains(&user()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DataSourceUnavailable);

        source.set_failure(None).await;
        assert!(source.list_domains(&user()).await.is_ok());
    }
}
