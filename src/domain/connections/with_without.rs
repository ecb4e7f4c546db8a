//! With/Without Comparator - contrasts a metric on days with and without a
//! binary activity.

use serde::{Deserialize, Serialize};

use super::pairs::{AlignedValues, CandidatePair};
use super::stats::{mean, sample_std_dev, VARIANCE_FLOOR};

/// Descriptive statistics for one side of the partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionStats {
    pub mean: f64,
    pub std_dev: f64,
    pub n: usize,
}

impl PartitionStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            std_dev: sample_std_dev(values)?,
            n: values.len(),
        })
    }
}

/// "Sleep is 1.8h longer on days with badminton."
///
/// `absolute_difference` is `with - without` in the metric's own unit.
/// `percent_difference` is relative to the without-activity mean and is
/// omitted when that mean is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithWithoutStats {
    pub with_activity: PartitionStats,
    pub without_activity: PartitionStats,
    pub absolute_difference: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent_difference: Option<f64>,
}

impl WithWithoutStats {
    /// Mean difference converted to the correlation scale.
    ///
    /// Cohen's d with a pooled standard deviation, then
    /// `r = d / sqrt(d² + (n1 + n0)² / (n1 · n0))`. Returns `None` when
    /// there are too few days to pool a variance.
    pub fn r_equivalent(&self) -> Option<f64> {
        let n1 = self.with_activity.n as f64;
        let n0 = self.without_activity.n as f64;
        let df = n1 + n0 - 2.0;
        if df <= 0.0 {
            return None;
        }

        let pooled_var = ((n1 - 1.0) * self.with_activity.std_dev.powi(2)
            + (n0 - 1.0) * self.without_activity.std_dev.powi(2))
            / df;
        let diff = self.absolute_difference.abs();

        if pooled_var <= VARIANCE_FLOOR {
            return Some(if diff > VARIANCE_FLOOR { 1.0 } else { 0.0 });
        }

        let d = diff / pooled_var.sqrt();
        let correction = (n1 + n0).powi(2) / (n1 * n0);
        Some((d / (d * d + correction).sqrt()).clamp(0.0, 1.0))
    }
}

/// Which side of a pair holds the binary activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinarySide {
    A,
    B,
}

/// Builds [`WithWithoutStats`] for pairs with exactly one binary side.
pub struct WithWithoutComparator;

impl WithWithoutComparator {
    /// Partitions the non-binary values by the binary flag on the same
    /// aligned day.
    ///
    /// Returns `None` when neither or both sides are binary, or when either
    /// partition is empty.
    pub fn compare(pair: &CandidatePair, aligned: &AlignedValues) -> Option<WithWithoutStats> {
        let side = match (pair.series_a.is_binary(), pair.series_b.is_binary()) {
            (true, false) => BinarySide::A,
            (false, true) => BinarySide::B,
            _ => return None,
        };
        let (flags, values) = match side {
            BinarySide::A => (&aligned.a, &aligned.b),
            BinarySide::B => (&aligned.b, &aligned.a),
        };

        let mut with = Vec::new();
        let mut without = Vec::new();
        for (&flag, &value) in flags.iter().zip(values.iter()) {
            if flag > 0.0 {
                with.push(value);
            } else {
                without.push(value);
            }
        }

        let with_activity = PartitionStats::from_values(&with)?;
        let without_activity = PartitionStats::from_values(&without)?;
        let absolute_difference = with_activity.mean - without_activity.mean;
        let percent_difference = if without_activity.mean.abs() > VARIANCE_FLOOR {
            Some(absolute_difference / without_activity.mean.abs() * 100.0)
        } else {
            None
        };

        Some(WithWithoutStats {
            with_activity,
            without_activity,
            absolute_difference,
            percent_difference,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connections::series::{DomainSeries, ValueType};
    use crate::domain::foundation::DomainId;
    use chrono::{Duration, NaiveDate};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn series(domain: &str, value_type: ValueType, values: &[f64]) -> Arc<DomainSeries> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let values: BTreeMap<NaiveDate, f64> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + Duration::days(i as i64), *v))
            .collect();
        Arc::new(DomainSeries {
            domain_id: DomainId::new(domain).unwrap(),
            metric_name: "value".to_string(),
            value_type,
            unit: None,
            display_name: domain.to_string(),
            values,
        })
    }

    fn pair(a: Arc<DomainSeries>, b: Arc<DomainSeries>) -> CandidatePair {
        let overlap_dates = a.values.keys().copied().collect();
        CandidatePair {
            series_a: a,
            series_b: b,
            overlap_dates,
        }
    }

    #[test]
    fn partitions_the_continuous_side_by_the_binary_flag() {
        let pair = pair(
            series("badminton", ValueType::Binary, &[1.0, 0.0, 1.0, 0.0]),
            series("sleep", ValueType::Continuous, &[8.0, 6.0, 8.0, 6.0]),
        );
        let stats = WithWithoutComparator::compare(&pair, &pair.align(0)).unwrap();

        assert_eq!(stats.with_activity.n, 2);
        assert_eq!(stats.with_activity.mean, 8.0);
        assert_eq!(stats.without_activity.mean, 6.0);
        assert_eq!(stats.absolute_difference, 2.0);
        let percent = stats.percent_difference.unwrap();
        assert!((percent - 33.333).abs() < 0.01);
    }

    #[test]
    fn binary_side_may_be_b() {
        let pair = pair(
            series("mood", ValueType::Continuous, &[3.0, 5.0, 3.0]),
            series("yoga", ValueType::Binary, &[0.0, 1.0, 0.0]),
        );
        let stats = WithWithoutComparator::compare(&pair, &pair.align(0)).unwrap();
        assert_eq!(stats.absolute_difference, 2.0);
    }

    #[test]
    fn not_applicable_without_exactly_one_binary_side() {
        let both = pair(
            series("a", ValueType::Binary, &[1.0, 0.0]),
            series("b", ValueType::Binary, &[1.0, 0.0]),
        );
        assert!(WithWithoutComparator::compare(&both, &both.align(0)).is_none());

        let neither = pair(
            series("a", ValueType::Continuous, &[1.0, 0.0]),
            series("b", ValueType::Count, &[1.0, 0.0]),
        );
        assert!(WithWithoutComparator::compare(&neither, &neither.align(0)).is_none());
    }

    #[test]
    fn empty_partition_yields_nothing() {
        let pair = pair(
            series("badminton", ValueType::Binary, &[1.0, 1.0, 1.0]),
            series("sleep", ValueType::Continuous, &[8.0, 7.0, 9.0]),
        );
        assert!(WithWithoutComparator::compare(&pair, &pair.align(0)).is_none());
    }

    #[test]
    fn zero_baseline_omits_percent_difference() {
        let pair = pair(
            series("badminton", ValueType::Binary, &[1.0, 0.0, 1.0, 0.0]),
            series("soreness", ValueType::Continuous, &[2.0, 0.0, 3.0, 0.0]),
        );
        let stats = WithWithoutComparator::compare(&pair, &pair.align(0)).unwrap();
        assert_eq!(stats.percent_difference, None);
    }

    #[test]
    fn r_equivalent_is_bounded_and_tracks_separation() {
        let separated = WithWithoutStats {
            with_activity: PartitionStats { mean: 8.0, std_dev: 0.3, n: 17 },
            without_activity: PartitionStats { mean: 6.0, std_dev: 0.3, n: 18 },
            absolute_difference: 2.0,
            percent_difference: None,
        };
        let overlapping = WithWithoutStats {
            absolute_difference: 0.1,
            ..separated.clone()
        };

        let strong = separated.r_equivalent().unwrap();
        let weak = overlapping.r_equivalent().unwrap();
        assert!(strong > 0.9 && strong <= 1.0);
        assert!(weak < 0.2);
    }

    #[test]
    fn r_equivalent_handles_zero_spread() {
        let constant = WithWithoutStats {
            with_activity: PartitionStats { mean: 8.0, std_dev: 0.0, n: 3 },
            without_activity: PartitionStats { mean: 6.0, std_dev: 0.0, n: 3 },
            absolute_difference: 2.0,
            percent_difference: None,
        };
        assert_eq!(constant.r_equivalent(), Some(1.0));

        let tiny = WithWithoutStats {
            with_activity: PartitionStats { mean: 8.0, std_dev: 0.0, n: 1 },
            without_activity: PartitionStats { mean: 6.0, std_dev: 0.0, n: 1 },
            absolute_difference: 2.0,
            percent_difference: None,
        };
        assert_eq!(tiny.r_equivalent(), None);
    }
}
