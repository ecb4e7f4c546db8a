//! Per-day metric series and the raw observations they are built from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainId, RawDate, ValidationError};

/// How a metric's daily value is interpreted.
///
/// Decided once at ingestion; every later stage dispatches on this tag
/// instead of re-inspecting values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Measured quantity; absent days stay absent (sleep hours, mood score).
    Continuous,
    /// Presence flag stored as 0/1 (did badminton happen that day).
    Binary,
    /// Tally of events; absent days mean zero (photos taken).
    Count,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Continuous => "continuous",
            ValueType::Binary => "binary",
            ValueType::Count => "count",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continuous" | "numeric" | "score" => Ok(ValueType::Continuous),
            "binary" | "boolean" | "presence" => Ok(ValueType::Binary),
            "count" | "counter" => Ok(ValueType::Count),
            other => Err(ValidationError::invalid_format(
                "value_type",
                format!("unknown value type '{}'", other),
            )),
        }
    }
}

/// Identifies one metric of one domain, e.g. `sleep.hours`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub domain_id: DomainId,
    pub metric_name: String,
}

impl SeriesKey {
    pub fn new(domain_id: DomainId, metric_name: impl Into<String>) -> Self {
        Self {
            domain_id,
            metric_name: metric_name.into(),
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain_id, self.metric_name)
    }
}

/// A single dated value as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: RawDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: impl Into<RawDate>, value: f64) -> Self {
        Self {
            date: date.into(),
            value,
        }
    }
}

/// Everything the data source knows about one metric of one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricObservations {
    pub domain_id: DomainId,
    pub metric_name: String,
    pub value_type: ValueType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    pub observations: Vec<Observation>,
}

impl MetricObservations {
    pub fn new(domain_id: DomainId, metric_name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            domain_id,
            metric_name: metric_name.into(),
            value_type,
            unit: None,
            display_name: None,
            observations: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_observation(mut self, date: impl Into<RawDate>, value: f64) -> Self {
        self.observations.push(Observation::new(date, value));
        self
    }

    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.domain_id.clone(), self.metric_name.clone())
    }
}

/// One metric from one domain, bucketed to one value per day.
///
/// `values` is ordered by date and only holds days inside the analysis
/// window. Continuous and binary series omit days without data; count
/// series carry an explicit zero for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSeries {
    pub domain_id: DomainId,
    pub metric_name: String,
    pub value_type: ValueType,
    pub unit: Option<String>,
    pub display_name: String,
    pub values: BTreeMap<NaiveDate, f64>,
}

impl DomainSeries {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.domain_id.clone(), self.metric_name.clone())
    }

    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.values.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_binary(&self) -> bool {
        self.value_type == ValueType::Binary
    }
}

/// Human-readable label used when the source supplies none.
pub fn default_display_name(domain_id: &DomainId, metric_name: &str) -> String {
    let raw = format!("{} {}", domain_id.as_str(), metric_name);
    raw.split(|c: char| c == ' ' || c == '_' || c == '-' || c == ':')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
