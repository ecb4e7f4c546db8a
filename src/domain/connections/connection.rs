//! Connection - the persisted unit of one analysis run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConnectionId, DomainId, Timestamp};

use super::analyzer::CorrelationResult;
use super::filter::{Direction, Strength};
use super::series::{DomainSeries, ValueType};
use super::with_without::WithWithoutStats;

/// One side of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainRef {
    #[serde(rename = "type")]
    pub domain_type: DomainId,
    pub metric: String,
    pub display_name: String,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl From<&DomainSeries> for DomainRef {
    fn from(series: &DomainSeries) -> Self {
        Self {
            domain_type: series.domain_id.clone(),
            metric: series.metric_name.clone(),
            display_name: series.display_name.clone(),
            value_type: series.value_type,
            unit: series.unit.clone(),
        }
    }
}

/// Paired values for charting. `value_b` is read `timeLagDays` after `date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value_a: f64,
    pub value_b: f64,
}

/// Text supplied by the narrative generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub title: String,
    pub description: String,
    pub explanation: String,
}

/// A statistically supported relationship between two metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub domain_a: DomainRef,
    pub domain_b: DomainRef,
    pub metrics: CorrelationResult,
    pub direction: Direction,
    pub strength: Strength,
    pub survives_confounder_control: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confounder_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confounder_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_without: Option<WithWithoutStats>,
    pub data_points: Vec<DataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub created_at: Timestamp,
}

impl Connection {
    pub fn with_narrative(mut self, narrative: Narrative) -> Self {
        self.title = Some(narrative.title);
        self.description = Some(narrative.description);
        self.explanation = Some(narrative.explanation);
        self
    }

    pub fn has_narrative(&self) -> bool {
        self.title.is_some()
    }

    /// Statistical context handed to the narrative generator.
    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            domain_a: self.domain_a.display_name.clone(),
            domain_b: self.domain_b.display_name.clone(),
            unit_a: self.domain_a.unit.clone(),
            unit_b: self.domain_b.unit.clone(),
            coefficient: self.metrics.coefficient,
            adjusted_p_value: self.metrics.adjusted_p_value,
            sample_size: self.metrics.sample_size,
            time_lag_days: self.metrics.time_lag_days,
            direction: self.direction,
            strength: self.strength,
            survives_confounder_control: self.survives_confounder_control,
            confounder_note: self.confounder_note.clone(),
            with_without: self.with_without.clone(),
        }
    }
}

/// What the narrative generator sees about a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub domain_a: String,
    pub domain_b: String,
    pub unit_a: Option<String>,
    pub unit_b: Option<String>,
    pub coefficient: f64,
    pub adjusted_p_value: f64,
    pub sample_size: usize,
    pub time_lag_days: i32,
    pub direction: Direction,
    pub strength: Strength,
    pub survives_confounder_control: bool,
    pub confounder_note: Option<String>,
    pub with_without: Option<WithWithoutStats>,
}
