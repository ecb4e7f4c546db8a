//! Domain Series Builder - raw per-domain observations to uniform daily series.
//!
//! Pure transform: dates go through [`coerce_date`], values are bucketed to
//! one per day according to the metric's [`ValueType`], and metrics with too
//! few observed days are dropped before pairing.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::domain::foundation::{coerce_date, DateRange};

use super::series::{default_display_name, DomainSeries, MetricObservations, SeriesKey, ValueType};

/// A metric that did not make it into the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSeries {
    pub key: SeriesKey,
    pub present_days: usize,
}

/// Result of building series for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    /// Series ordered by key.
    pub series: Vec<DomainSeries>,
    /// Metrics below the present-day minimum.
    pub dropped: Vec<DroppedSeries>,
    /// Observations discarded for bad dates, non-finite values, or falling
    /// outside the window.
    pub rejected_observations: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct DayBucket {
    sum: f64,
    count: usize,
    max: f64,
}

impl DayBucket {
    fn push(&mut self, value: f64) {
        if self.count == 0 || value > self.max {
            self.max = value;
        }
        self.sum += value;
        self.count += 1;
    }

    fn resolve(&self, value_type: ValueType) -> f64 {
        match value_type {
            ValueType::Binary => {
                if self.max > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ValueType::Count => self.sum,
            ValueType::Continuous => self.sum / self.count as f64,
        }
    }
}

/// Turns [`MetricObservations`] into [`DomainSeries`] for one window.
#[derive(Debug, Clone)]
pub struct SeriesBuilder {
    window: DateRange,
    min_present_days: usize,
}

impl SeriesBuilder {
    pub fn new(window: DateRange, min_present_days: usize) -> Self {
        Self {
            window,
            min_present_days,
        }
    }

    pub fn window(&self) -> &DateRange {
        &self.window
    }

    /// Builds one series per (domain, metric).
    ///
    /// Inputs sharing a key are merged; the first value type seen wins.
    pub fn build(&self, metrics: Vec<MetricObservations>) -> BuildOutcome {
        let mut merged: BTreeMap<SeriesKey, MetricObservations> = BTreeMap::new();
        for metric in metrics {
            let key = metric.key();
            match merged.get_mut(&key) {
                Some(existing) => {
                    if existing.value_type != metric.value_type {
                        warn!(
                            series = %key,
                            kept = %existing.value_type,
                            ignored = %metric.value_type,
                            "Conflicting value types for one metric"
                        );
                    }
                    existing.observations.extend(metric.observations);
                    if existing.unit.is_none() {
                        existing.unit = metric.unit;
                    }
                    if existing.display_name.is_none() {
                        existing.display_name = metric.display_name;
                    }
                }
                None => {
                    merged.insert(key, metric);
                }
            }
        }

        let mut outcome = BuildOutcome::default();
        for (key, metric) in merged {
            let (buckets, rejected) = self.bucket(&metric);
            outcome.rejected_observations += rejected;

            let present_days = buckets.len();
            if present_days < self.min_present_days {
                debug!(
                    series = %key,
                    present_days,
                    min_present_days = self.min_present_days,
                    "Dropping sparse series"
                );
                outcome.dropped.push(DroppedSeries { key, present_days });
                continue;
            }

            let values = self.resolve(&buckets, metric.value_type);
            let display_name = metric
                .display_name
                .clone()
                .unwrap_or_else(|| default_display_name(&metric.domain_id, &metric.metric_name));

            outcome.series.push(DomainSeries {
                domain_id: metric.domain_id,
                metric_name: metric.metric_name,
                value_type: metric.value_type,
                unit: metric.unit,
                display_name,
                values,
            });
        }

        if outcome.rejected_observations > 0 {
            warn!(
                rejected = outcome.rejected_observations,
                "Observations rejected while building series"
            );
        }

        outcome
    }

    fn bucket(&self, metric: &MetricObservations) -> (BTreeMap<NaiveDate, DayBucket>, usize) {
        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        let mut rejected = 0;

        for observation in &metric.observations {
            let date = match coerce_date(&observation.date) {
                Ok(date) => date,
                Err(e) => {
                    debug!(series = %metric.key(), error = %e, "Unparseable observation date");
                    rejected += 1;
                    continue;
                }
            };
            if !self.window.contains(date) {
                rejected += 1;
                continue;
            }
            let value = observation.value;
            if !value.is_finite() || (metric.value_type == ValueType::Count && value < 0.0) {
                rejected += 1;
                continue;
            }
            buckets.entry(date).or_default().push(value);
        }

        (buckets, rejected)
    }

    fn resolve(
        &self,
        buckets: &BTreeMap<NaiveDate, DayBucket>,
        value_type: ValueType,
    ) -> BTreeMap<NaiveDate, f64> {
        match value_type {
            ValueType::Count => self
                .window
                .days()
                .map(|day| {
                    let value = buckets.get(&day).map(|b| b.resolve(value_type)).unwrap_or(0.0);
                    (day, value)
                })
                .collect(),
            _ => buckets
                .iter()
                .map(|(day, bucket)| (*day, bucket.resolve(value_type)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainId, RawDate};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn window() -> DateRange {
        DateRange::new(day(1), day(10)).unwrap()
    }

    fn metric(domain: &str, name: &str, value_type: ValueType) -> MetricObservations {
        MetricObservations::new(DomainId::new(domain).unwrap(), name, value_type)
    }

    #[test]
    fn continuous_series_leaves_missing_days_absent() {
        let sleep = metric("sleep", "hours", ValueType::Continuous)
            .with_observation(day(1), 7.0)
            .with_observation(day(3), 8.0)
            .with_observation(day(5), 6.0);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![sleep]);

        assert_eq!(outcome.series.len(), 1);
        let series = &outcome.series[0];
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(day(2)), None);
        assert_eq!(series.display_name, "Sleep Hours");
    }

    #[test]
    fn count_series_fills_the_whole_window_with_zeros() {
        let photos = metric("photos", "taken", ValueType::Count)
            .with_observation(day(2), 2.0)
            .with_observation(day(2), 3.0)
            .with_observation(day(4), 1.0)
            .with_observation(day(9), 4.0);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![photos]);

        let series = &outcome.series[0];
        assert_eq!(series.len(), 10);
        assert_eq!(series.get(day(1)), Some(0.0));
        assert_eq!(series.get(day(2)), Some(5.0));
    }

    #[test]
    fn binary_series_collapses_to_presence_flags() {
        let badminton = metric("badminton", "played", ValueType::Binary)
            .with_observation(day(1), 2.0)
            .with_observation(day(1), 0.0)
            .with_observation(day(2), 0.0)
            .with_observation(day(3), 1.0);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![badminton]);

        let series = &outcome.series[0];
        assert_eq!(series.get(day(1)), Some(1.0));
        assert_eq!(series.get(day(2)), Some(0.0));
        assert_eq!(series.get(day(4)), None);
    }

    #[test]
    fn continuous_duplicates_are_averaged() {
        let mood = metric("mood", "score", ValueType::Continuous)
            .with_observation(day(1), 4.0)
            .with_observation(day(1), 6.0)
            .with_observation(day(2), 5.0)
            .with_observation(day(3), 5.0);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![mood]);
        assert_eq!(outcome.series[0].get(day(1)), Some(5.0));
    }

    #[test]
    fn sparse_series_are_dropped_not_errors() {
        let sparse = metric("mood", "score", ValueType::Continuous)
            .with_observation(day(1), 4.0)
            .with_observation(day(2), 6.0);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![sparse]);

        assert!(outcome.series.is_empty());
        assert_eq!(outcome.dropped.len(), 1);
        assert_eq!(outcome.dropped[0].present_days, 2);
    }

    #[test]
    fn sparse_count_series_are_judged_on_observed_days() {
        let photos = metric("photos", "taken", ValueType::Count).with_observation(day(2), 1.0);
        let outcome = SeriesBuilder::new(window(), 3).build(vec![photos]);
        assert!(outcome.series.is_empty());
    }

    #[test]
    fn heterogeneous_dates_land_on_the_same_day() {
        let sleep = metric("sleep", "hours", ValueType::Continuous)
            .with_observation(RawDate::Text("2024-05-01".into()), 6.0)
            .with_observation(RawDate::Text("2024-05-01T22:00:00Z".into()), 8.0)
            .with_observation(
                RawDate::EpochParts {
                    seconds: 1_714_608_000, // 2024-05-02T00:00:00Z
                    nanoseconds: 0,
                },
                7.0,
            )
            .with_observation(RawDate::EpochMillis(1_714_694_400_000), 9.0); // 2024-05-03

        let outcome = SeriesBuilder::new(window(), 3).build(vec![sleep]);

        let series = &outcome.series[0];
        assert_eq!(series.get(day(1)), Some(7.0));
        assert_eq!(series.get(day(2)), Some(7.0));
        assert_eq!(series.get(day(3)), Some(9.0));
        assert_eq!(outcome.rejected_observations, 0);
    }

    #[test]
    fn rejects_bad_dates_out_of_window_and_non_finite_values() {
        let sleep = metric("sleep", "hours", ValueType::Continuous)
            .with_observation(day(1), 7.0)
            .with_observation(day(2), 7.5)
            .with_observation(day(3), 8.0)
            .with_observation(RawDate::Text("not a date".into()), 7.0)
            .with_observation(day(20), 7.0)
            .with_observation(day(4), f64::NAN);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![sleep]);

        assert_eq!(outcome.rejected_observations, 3);
        assert_eq!(outcome.series[0].len(), 3);
    }

    #[test]
    fn metrics_with_the_same_key_are_merged_and_output_is_sorted() {
        let a = metric("sleep", "hours", ValueType::Continuous)
            .with_observation(day(1), 7.0)
            .with_observation(day(2), 7.0);
        let b = metric("sleep", "hours", ValueType::Continuous)
            .with_unit("h")
            .with_observation(day(3), 7.0);
        let mood = metric("mood", "score", ValueType::Continuous)
            .with_observation(day(1), 3.0)
            .with_observation(day(2), 3.0)
            .with_observation(day(3), 4.0);

        let outcome = SeriesBuilder::new(window(), 3).build(vec![a, mood, b]);

        assert_eq!(outcome.series.len(), 2);
        assert_eq!(outcome.series[0].domain_id.as_str(), "mood");
        assert_eq!(outcome.series[1].len(), 3);
        assert_eq!(outcome.series[1].unit.as_deref(), Some("h"));
    }
}
