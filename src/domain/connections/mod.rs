//! Connections Module - Cross-domain correlation engine.
//!
//! Discovers which pairs of personal metrics (sleep hours, activity
//! presence, mood scores, photo counts, ...) move together, corrects for
//! multiple comparisons and serial autocorrelation, checks the survivors
//! against common confounders, and packages them as [`Connection`] records.
//!
//! # Components
//!
//! - `SeriesBuilder` - Raw observations to one value per day per metric
//! - `PairGenerator` - Cross-domain pairs with enough overlapping days
//! - `CorrelationAnalyzer` - Spearman, effective sample size, optional lag search
//! - `benjamini_hochberg` - False discovery rate adjustment across one run
//! - `SignificanceFilter` - Thresholds, strength and direction
//! - `ConfounderChecker` - Day-of-week and linear-trend re-tests
//! - `WithWithoutComparator` - Descriptive contrast for binary activities
//! - `ConnectionAssembler` - Final records with capped data points
//! - `CorrelationEngine` - The above chained together
//!
//! Everything here is pure and stateless; fetching, narrative text and
//! persistence live behind ports.

mod analyzer;
mod assembler;
mod builder;
mod confounder;
mod connection;
mod correction;
mod engine;
mod filter;
mod options;
mod pairs;
mod series;
pub mod stats;
mod with_without;

pub use analyzer::{CorrelationAnalyzer, CorrelationResult, CorrelationType, PairAnalysis};
pub use assembler::ConnectionAssembler;
pub use builder::{BuildOutcome, DroppedSeries, SeriesBuilder};
pub use confounder::{Confounder, ConfounderChecker, ConfounderOutcome, ResidualTest};
pub use connection::{Connection, ConnectionSummary, DataPoint, DomainRef, Narrative};
pub use correction::{apply_benjamini_hochberg, benjamini_hochberg};
pub use engine::{CorrelationEngine, EngineOutput};
pub use filter::{Direction, SignificanceFilter, Strength};
pub use options::{
    AnalysisOptions, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_DATA_POINTS, DEFAULT_MAX_TIME_LAG_DAYS,
    DEFAULT_MIN_EFFECT_SIZE, DEFAULT_MIN_PRESENT_DAYS, DEFAULT_MIN_P_VALUE,
    DEFAULT_MIN_SAMPLE_SIZE, MAX_LOOKBACK_DAYS,
};
pub use pairs::{AlignedValues, CandidatePair, PairGenerator};
pub use series::{
    default_display_name, DomainSeries, MetricObservations, Observation, SeriesKey, ValueType,
};
pub use with_without::{PartitionStats, WithWithoutComparator, WithWithoutStats};
