//! Confounder Checker - re-tests surviving pairs after removing nuisance
//! structure shared by both series.
//!
//! Two nuisance variables are checked for every pair:
//!
//! - **Day of week**: each series minus its weekday means (weekly routines).
//! - **Linear trend**: each series minus its least-squares line over time
//!   (both metrics drifting in the same direction over the window).
//!
//! Residual Spearman correlations get their own effective sample size and
//! a Benjamini–Hochberg adjustment across every residual test of the run,
//! then face the same thresholds as the raw results.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::analyzer::PairAnalysis;
use super::correction::benjamini_hochberg;
use super::filter::SignificanceFilter;
use super::stats::{
    correlation_p_value, effective_sample_size, lag1_autocorrelation, residualize_by_group,
    residualize_linear, spearman,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Confounder {
    DayOfWeek,
    LinearTrend,
}

impl Confounder {
    pub const ALL: [Confounder; 2] = [Confounder::DayOfWeek, Confounder::LinearTrend];

    pub fn label(&self) -> &'static str {
        match self {
            Confounder::DayOfWeek => "day-of-week",
            Confounder::LinearTrend => "linear time trend",
        }
    }

    fn explanation(&self) -> &'static str {
        match self {
            Confounder::DayOfWeek => {
                "Both metrics follow the same weekly routine; the link disappears once weekday effects are removed."
            }
            Confounder::LinearTrend => {
                "Both metrics drift over the analysis window; the link disappears once the time trend is removed."
            }
        }
    }

    /// Removes this confounder from `values` observed on `dates`.
    pub fn residualize(&self, values: &[f64], dates: &[NaiveDate]) -> Vec<f64> {
        match self {
            Confounder::DayOfWeek => {
                let groups: Vec<usize> = dates
                    .iter()
                    .map(|d| d.weekday().num_days_from_monday() as usize)
                    .collect();
                residualize_by_group(values, &groups)
            }
            Confounder::LinearTrend => {
                let Some(&origin) = dates.first() else {
                    return Vec::new();
                };
                let positions: Vec<f64> = dates
                    .iter()
                    .map(|d| (*d - origin).num_days() as f64)
                    .collect();
                residualize_linear(values, &positions)
            }
        }
    }
}

impl fmt::Display for Confounder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One residual re-test of one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualTest {
    pub confounder: Confounder,
    /// `None` when a residual series is constant (the confounder explains
    /// all of its variation).
    pub coefficient: Option<f64>,
    pub p_value: f64,
    pub adjusted_p_value: f64,
    pub effective_sample_size: f64,
}

impl ResidualTest {
    fn passes(&self, filter: &SignificanceFilter) -> bool {
        match self.coefficient {
            Some(coefficient) => {
                filter.passes_values(self.adjusted_p_value, self.effective_sample_size, coefficient)
            }
            None => false,
        }
    }
}

/// Verdict for one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfounderOutcome {
    pub survives: bool,
    /// Which nuisance variable explains the relationship, when it does not
    /// survive.
    pub note: Option<String>,
    /// Weakest residual coefficient across confounders; undefined residual
    /// correlations count as zero.
    pub adjusted_coefficient: f64,
    pub tests: Vec<ResidualTest>,
}

#[derive(Debug, Clone)]
pub struct ConfounderChecker {
    filter: SignificanceFilter,
}

impl ConfounderChecker {
    pub fn new(filter: SignificanceFilter) -> Self {
        Self { filter }
    }

    /// One outcome per analysis, in input order.
    pub fn check(&self, analyses: &[PairAnalysis]) -> Vec<ConfounderOutcome> {
        let mut tests: Vec<Vec<ResidualTest>> = analyses
            .iter()
            .map(|analysis| {
                Confounder::ALL
                    .iter()
                    .map(|confounder| Self::residual_test(analysis, *confounder))
                    .collect()
            })
            .collect();

        let raw: Vec<f64> = tests.iter().flatten().map(|t| t.p_value).collect();
        let adjusted = benjamini_hochberg(&raw);
        for (test, adjusted) in tests.iter_mut().flatten().zip(adjusted) {
            test.adjusted_p_value = adjusted;
        }

        tests
            .into_iter()
            .map(|tests| self.verdict(tests))
            .collect()
    }

    fn verdict(&self, tests: Vec<ResidualTest>) -> ConfounderOutcome {
        let failed: Vec<Confounder> = tests
            .iter()
            .filter(|t| !t.passes(&self.filter))
            .map(|t| t.confounder)
            .collect();

        let adjusted_coefficient = tests
            .iter()
            .map(|t| t.coefficient.unwrap_or(0.0))
            .min_by(|a, b| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);

        let note = if failed.is_empty() {
            None
        } else {
            Some(
                failed
                    .iter()
                    .map(Confounder::explanation)
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        };

        ConfounderOutcome {
            survives: failed.is_empty(),
            note,
            adjusted_coefficient,
            tests,
        }
    }

    fn residual_test(analysis: &PairAnalysis, confounder: Confounder) -> ResidualTest {
        let aligned = &analysis.aligned;
        let shift = Duration::days(i64::from(analysis.result.time_lag_days));
        let dates_b: Vec<NaiveDate> = aligned.dates.iter().map(|d| *d + shift).collect();

        let residual_a = confounder.residualize(&aligned.a, &aligned.dates);
        let residual_b = confounder.residualize(&aligned.b, &dates_b);

        let coefficient = spearman(&residual_a, &residual_b);
        let r1 = lag1_autocorrelation(&residual_a, &aligned.day_numbers());
        let n_eff = effective_sample_size(residual_a.len(), r1);
        let p_value = coefficient.map_or(1.0, |r| correlation_p_value(r, n_eff));

        ResidualTest {
            confounder,
            coefficient,
            p_value,
            adjusted_p_value: p_value,
            effective_sample_size: n_eff,
        }
    }
}
