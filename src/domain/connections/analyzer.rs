//! Correlation Analyzer - rank correlation, significance, and effect size per
//! candidate pair.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::pairs::{AlignedValues, CandidatePair};
use super::stats::{correlation_p_value, effective_sample_size, lag1_autocorrelation, spearman};
use super::with_without::{WithWithoutComparator, WithWithoutStats};

/// Correlation method recorded on every result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationType {
    #[default]
    Spearman,
}

/// Statistics for one pair at its chosen lag.
///
/// `adjusted_p_value` equals `p_value` until the run-wide correction has
/// been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub coefficient: f64,
    pub p_value: f64,
    pub adjusted_p_value: f64,
    pub effective_sample_size: f64,
    pub autocorrelation: f64,
    pub correlation_type: CorrelationType,
    pub time_lag_days: i32,
    pub sample_size: usize,
    pub effect_size: f64,
}

/// Everything the later stages need about one analyzed pair.
#[derive(Debug, Clone)]
pub struct PairAnalysis {
    pub pair: CandidatePair,
    pub result: CorrelationResult,
    /// Values at the chosen lag.
    pub aligned: AlignedValues,
    pub with_without: Option<WithWithoutStats>,
}

/// Analyzes one candidate pair at a time. Stateless and `Sync`, so the
/// application layer may fan pairs out across workers.
#[derive(Debug, Clone)]
pub struct CorrelationAnalyzer {
    min_sample_size: usize,
    include_time_lag: bool,
    max_time_lag_days: u32,
}

impl CorrelationAnalyzer {
    pub fn new(min_sample_size: usize, include_time_lag: bool, max_time_lag_days: u32) -> Self {
        Self {
            min_sample_size,
            include_time_lag,
            max_time_lag_days,
        }
    }

    /// Lags to try, nearest first: `0, -1, 1, -2, 2, ...`.
    pub fn lags(&self) -> Vec<i32> {
        let mut lags = vec![0];
        if self.include_time_lag {
            let max = i32::try_from(self.max_time_lag_days).unwrap_or(i32::MAX);
            for k in 1..=max {
                lags.push(-k);
                lags.push(k);
            }
        }
        lags
    }

    /// Returns `None` when no lag yields a defined coefficient over at
    /// least `min_sample_size` aligned days (constant series, for one).
    ///
    /// Among lags, the largest `|coefficient|` wins; ties keep the lag
    /// tried first, so same-day alignment is preferred.
    pub fn analyze(&self, pair: &CandidatePair) -> Option<PairAnalysis> {
        let mut best: Option<(i32, f64, AlignedValues)> = None;

        for lag in self.lags() {
            let aligned = pair.align(lag);
            if aligned.len() < self.min_sample_size {
                continue;
            }
            let Some(coefficient) = spearman(&aligned.a, &aligned.b) else {
                continue;
            };
            let better = match &best {
                Some((_, current, _)) => coefficient.abs() > current.abs(),
                None => true,
            };
            if better {
                best = Some((lag, coefficient, aligned));
            }
        }

        let Some((time_lag_days, coefficient, aligned)) = best else {
            debug!(pair = %pair.label(), "Correlation undefined, pair excluded");
            return None;
        };

        let sample_size = aligned.len();
        let autocorrelation = lag1_autocorrelation(&aligned.a, &aligned.day_numbers());
        let n_eff = effective_sample_size(sample_size, autocorrelation);
        let p_value = correlation_p_value(coefficient, n_eff);

        let with_without = WithWithoutComparator::compare(pair, &aligned);
        let mut effect_size = coefficient.abs();
        if let Some(r_equivalent) = with_without.as_ref().and_then(WithWithoutStats::r_equivalent) {
            effect_size = effect_size.min(r_equivalent);
        }

        if time_lag_days != 0 {
            debug!(pair = %pair.label(), time_lag_days, coefficient, "Lagged alignment chosen");
        }

        Some(PairAnalysis {
            pair: pair.clone(),
            result: CorrelationResult {
                coefficient,
                p_value,
                adjusted_p_value: p_value,
                effective_sample_size: n_eff,
                autocorrelation,
                correlation_type: CorrelationType::Spearman,
                time_lag_days,
                sample_size,
                effect_size,
            },
            aligned,
            with_without,
        })
    }
}
