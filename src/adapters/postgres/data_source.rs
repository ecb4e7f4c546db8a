//! PostgreSQL implementation of DomainDataSource.
//!
//! Reads the `daily_metrics` table, one row per observation:
//! `(user_id, domain_id, metric_name, value_type, unit, display_name,
//! observed_on, value)`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::connections::{MetricObservations, Observation, ValueType};
use crate::domain::foundation::{DateRange, DomainError, DomainId, ErrorCode, UserId};
use crate::ports::DomainDataSource;

#[derive(Clone)]
pub struct PostgresDomainDataSource {
    pool: PgPool,
}

impl PostgresDomainDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn source_error(context: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DataSourceUnavailable, format!("{}: {}", context, e))
}

#[async_trait]
impl DomainDataSource for PostgresDomainDataSource {
    async fn list_domains(&self, user_id: &UserId) -> Result<Vec<DomainId>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT domain_id FROM daily_metrics
            WHERE user_id = $1
            ORDER BY domain_id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| source_error("Failed to list domains", e))?;

        rows.into_iter()
            .map(|row| {
                let raw: String = row
                    .try_get("domain_id")
                    .map_err(|e| source_error("Failed to read domain_id", e))?;
                DomainId::new(raw).map_err(DomainError::from)
            })
            .collect()
    }

    async fn fetch_domain_series(
        &self,
        user_id: &UserId,
        domain: &DomainId,
        range: &DateRange,
    ) -> Result<Vec<MetricObservations>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT metric_name, value_type, unit, display_name, observed_on, value
            FROM daily_metrics
            WHERE user_id = $1 AND domain_id = $2 AND observed_on BETWEEN $3 AND $4
            ORDER BY metric_name, observed_on
            "#,
        )
        .bind(user_id.as_str())
        .bind(domain.as_str())
        .bind(range.start())
        .bind(range.end())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| source_error("Failed to fetch daily metrics", e))?;

        let mut metrics: Vec<MetricObservations> = Vec::new();
        for row in rows {
            let observation = MetricRow::from_row(&row)?;
            let starts_metric = metrics
                .last()
                .map_or(true, |m| m.metric_name != observation.metric_name);
            if starts_metric {
                let value_type: ValueType = observation.value_type.parse()?;
                let mut metric =
                    MetricObservations::new(domain.clone(), observation.metric_name.clone(), value_type);
                metric.unit = observation.unit.clone();
                metric.display_name = observation.display_name.clone();
                metrics.push(metric);
            }
            if let Some(current) = metrics.last_mut() {
                current
                    .observations
                    .push(Observation::new(observation.observed_on, observation.value));
            }
        }
        Ok(metrics)
    }
}

struct MetricRow {
    metric_name: String,
    value_type: String,
    unit: Option<String>,
    display_name: Option<String>,
    observed_on: NaiveDate,
    value: f64,
}

impl MetricRow {
    fn from_row(row: &PgRow) -> Result<Self, DomainError> {
        let read = |e: sqlx::Error| source_error("Failed to read daily metric row", e);
        Ok(Self {
            metric_name: row.try_get("metric_name").map_err(read)?,
            value_type: row.try_get("value_type").map_err(read)?,
            unit: row.try_get("unit").map_err(read)?,
            display_name: row.try_get("display_name").map_err(read)?,
            observed_on: row.try_get("observed_on").map_err(read)?,
            value: row.try_get("value").map_err(read)?,
        })
    }
}
