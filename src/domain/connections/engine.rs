//! Correlation Engine - the pure pipeline from observations to connections.
//!
//! Builder → pairs → analyzer (per pair) → BH correction → filter →
//! confounder check → assembler. Per-pair analysis is exposed separately so
//! callers can fan it out; [`CorrelationEngine::finalize`] is the barrier
//! that needs every pair's raw p-value.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

use crate::domain::foundation::{DateRange, Timestamp, ValidationError};

use super::analyzer::{CorrelationAnalyzer, PairAnalysis};
use super::assembler::ConnectionAssembler;
use super::builder::{BuildOutcome, SeriesBuilder};
use super::confounder::ConfounderChecker;
use super::connection::Connection;
use super::correction::apply_benjamini_hochberg;
use super::filter::SignificanceFilter;
use super::options::AnalysisOptions;
use super::pairs::{CandidatePair, PairGenerator};
use super::series::{DomainSeries, MetricObservations};

/// Numbers and connections produced by one run.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    /// Pairs that produced a correlation result.
    pub pairs_analyzed: usize,
    /// Pairs that cleared every threshold.
    pub significant_pairs: usize,
    /// Ordered by `|coefficient|`, strongest first.
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone)]
pub struct CorrelationEngine {
    options: AnalysisOptions,
    pair_generator: PairGenerator,
    analyzer: CorrelationAnalyzer,
    filter: SignificanceFilter,
    checker: ConfounderChecker,
    assembler: ConnectionAssembler,
}

impl CorrelationEngine {
    pub fn new(options: AnalysisOptions) -> Result<Self, ValidationError> {
        options.validate()?;
        let filter = SignificanceFilter::new(
            options.min_p_value,
            options.min_sample_size,
            options.min_effect_size,
        );
        Ok(Self {
            pair_generator: PairGenerator::new(options.min_sample_size),
            analyzer: CorrelationAnalyzer::new(
                options.min_sample_size,
                options.include_time_lag,
                options.max_time_lag_days,
            ),
            checker: ConfounderChecker::new(filter),
            assembler: ConnectionAssembler::new(options.max_data_points),
            filter,
            options,
        })
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Lookback window ending on `today`.
    pub fn window_ending(&self, today: NaiveDate) -> Result<DateRange, ValidationError> {
        DateRange::ending_on(today, self.options.lookback_days)
    }

    pub fn build_series(&self, window: DateRange, metrics: Vec<MetricObservations>) -> BuildOutcome {
        SeriesBuilder::new(window, self.options.min_present_days).build(metrics)
    }

    pub fn candidate_pairs(&self, series: Vec<DomainSeries>) -> Vec<CandidatePair> {
        let shared: Vec<Arc<DomainSeries>> = series.into_iter().map(Arc::new).collect();
        self.pair_generator.generate(&shared)
    }

    pub fn analyze_pair(&self, pair: &CandidatePair) -> Option<PairAnalysis> {
        self.analyzer.analyze(pair)
    }

    /// Corrects, filters, checks, and assembles. Needs every analysis of
    /// the run at once.
    pub fn finalize(&self, mut analyses: Vec<PairAnalysis>, created_at: Timestamp) -> EngineOutput {
        analyses.sort_by(|x, y| {
            (x.pair.series_a.key(), x.pair.series_b.key())
                .cmp(&(y.pair.series_a.key(), y.pair.series_b.key()))
        });

        let pairs_analyzed = analyses.len();
        apply_benjamini_hochberg(analyses.iter_mut().map(|a| &mut a.result));

        let significant: Vec<PairAnalysis> = analyses
            .into_iter()
            .filter(|analysis| {
                let passes = self.filter.passes(&analysis.result);
                if !passes {
                    debug!(
                        pair = %analysis.pair.label(),
                        coefficient = analysis.result.coefficient,
                        adjusted_p_value = analysis.result.adjusted_p_value,
                        effective_sample_size = analysis.result.effective_sample_size,
                        "Pair below significance thresholds"
                    );
                }
                passes
            })
            .collect();

        let outcomes = self.checker.check(&significant);
        let mut connections: Vec<Connection> = significant
            .iter()
            .zip(outcomes.iter())
            .map(|(analysis, outcome)| self.assembler.assemble(analysis, outcome, created_at))
            .collect();
        connections.sort_by(|x, y| {
            y.metrics
                .coefficient
                .abs()
                .total_cmp(&x.metrics.coefficient.abs())
        });

        EngineOutput {
            pairs_analyzed,
            significant_pairs: connections.len(),
            connections,
        }
    }

    /// Whole pipeline on the current thread.
    pub fn run(
        &self,
        window: DateRange,
        metrics: Vec<MetricObservations>,
        created_at: Timestamp,
    ) -> EngineOutput {
        let built = self.build_series(window, metrics);
        let analyses: Vec<PairAnalysis> = self
            .candidate_pairs(built.series)
            .iter()
            .filter_map(|pair| self.analyze_pair(pair))
            .collect();
        self.finalize(analyses, created_at)
    }
}
