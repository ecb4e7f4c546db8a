//! Pair Generator - enumerates cross-domain metric pairs worth testing.

use chrono::{Datelike, Duration, NaiveDate};
use std::sync::Arc;
use tracing::debug;

use super::series::DomainSeries;

/// Two series from different domains plus the days both have data.
///
/// `series_a` always sorts before `series_b` by key, so a pair has one
/// canonical orientation.
#[derive(Debug, Clone)]
pub struct CandidatePair {
    pub series_a: Arc<DomainSeries>,
    pub series_b: Arc<DomainSeries>,
    /// Ascending days present in both series. Computed once.
    pub overlap_dates: Vec<NaiveDate>,
}

/// Paired value vectors for one alignment of a pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignedValues {
    /// Days of the `a` values.
    pub dates: Vec<NaiveDate>,
    pub a: Vec<f64>,
    /// For lag `k`, `b[i]` was observed `k` days after `dates[i]`.
    pub b: Vec<f64>,
}

impl AlignedValues {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Day numbers of `dates`, for adjacency checks.
    pub fn day_numbers(&self) -> Vec<i64> {
        self.dates
            .iter()
            .map(|d| i64::from(d.num_days_from_ce()))
            .collect()
    }
}

impl CandidatePair {
    pub fn overlap_len(&self) -> usize {
        self.overlap_dates.len()
    }

    /// `"sleep.hours ~ mood.score"`, for logs.
    pub fn label(&self) -> String {
        format!("{} ~ {}", self.series_a.key(), self.series_b.key())
    }

    /// Aligns B shifted by `lag_days` against A.
    ///
    /// Positive lags pair A on day `d` with B on day `d + lag`.
    pub fn align(&self, lag_days: i32) -> AlignedValues {
        let mut aligned = AlignedValues::default();

        if lag_days == 0 {
            for &date in &self.overlap_dates {
                if let (Some(a), Some(b)) = (self.series_a.get(date), self.series_b.get(date)) {
                    aligned.dates.push(date);
                    aligned.a.push(a);
                    aligned.b.push(b);
                }
            }
            return aligned;
        }

        let shift = Duration::days(i64::from(lag_days));
        for (&date, &a) in &self.series_a.values {
            if let Some(b) = self.series_b.get(date + shift) {
                aligned.dates.push(date);
                aligned.a.push(a);
                aligned.b.push(b);
            }
        }
        aligned
    }
}

/// Enumerates unordered cross-domain pairs with enough overlap.
#[derive(Debug, Clone)]
pub struct PairGenerator {
    min_sample_size: usize,
}

impl PairGenerator {
    pub fn new(min_sample_size: usize) -> Self {
        Self { min_sample_size }
    }

    /// Pairs in deterministic key order. Same-domain pairs are never
    /// produced; pairs below `min_sample_size` overlapping days are dropped
    /// before any statistic is computed.
    pub fn generate(&self, series: &[Arc<DomainSeries>]) -> Vec<CandidatePair> {
        let mut ordered: Vec<Arc<DomainSeries>> = series.to_vec();
        ordered.sort_by_key(|s| s.key());

        let mut pairs = Vec::new();
        for (i, a) in ordered.iter().enumerate() {
            for b in &ordered[i + 1..] {
                if a.domain_id == b.domain_id {
                    continue;
                }

                let overlap_dates: Vec<NaiveDate> = a
                    .values
                    .keys()
                    .filter(|date| b.values.contains_key(date))
                    .copied()
                    .collect();

                if overlap_dates.len() < self.min_sample_size {
                    debug!(
                        series_a = %a.key(),
                        series_b = %b.key(),
                        overlap = overlap_dates.len(),
                        min_sample_size = self.min_sample_size,
                        "Skipping pair with insufficient overlap"
                    );
                    continue;
                }

                pairs.push(CandidatePair {
                    series_a: Arc::clone(a),
                    series_b: Arc::clone(b),
                    overlap_dates,
                });
            }
        }
        pairs
    }
}
