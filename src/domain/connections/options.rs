//! Analysis options - thresholds and window size for one run.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

pub const DEFAULT_LOOKBACK_DAYS: u32 = 35;
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 14;
pub const DEFAULT_MIN_P_VALUE: f64 = 0.05;
pub const DEFAULT_MIN_EFFECT_SIZE: f64 = 0.3;
pub const DEFAULT_MAX_TIME_LAG_DAYS: u32 = 3;
pub const DEFAULT_MIN_PRESENT_DAYS: usize = 3;
pub const DEFAULT_MAX_DATA_POINTS: usize = 90;
/// One year plus a leap day; longer windows are rejected before any fetch.
pub const MAX_LOOKBACK_DAYS: u32 = 366;

/// Correlations on fewer points than this are never meaningful.
const MIN_SAMPLE_SIZE_FLOOR: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub lookback_days: u32,
    pub min_sample_size: usize,
    pub min_p_value: f64,
    pub min_effect_size: f64,
    pub include_time_lag: bool,
    pub max_time_lag_days: u32,
    /// Series with fewer observed days are dropped before pairing.
    pub min_present_days: usize,
    /// Cap on stored data points per connection.
    pub max_data_points: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            min_p_value: DEFAULT_MIN_P_VALUE,
            min_effect_size: DEFAULT_MIN_EFFECT_SIZE,
            include_time_lag: false,
            max_time_lag_days: DEFAULT_MAX_TIME_LAG_DAYS,
            min_present_days: DEFAULT_MIN_PRESENT_DAYS,
            max_data_points: DEFAULT_MAX_DATA_POINTS,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.min_sample_size < MIN_SAMPLE_SIZE_FLOOR {
            return Err(ValidationError::out_of_range(
                "min_sample_size",
                MIN_SAMPLE_SIZE_FLOOR as f64,
                f64::from(self.lookback_days),
                self.min_sample_size as f64,
            ));
        }
        if (self.lookback_days as usize) < self.min_sample_size
            || self.lookback_days > MAX_LOOKBACK_DAYS
        {
            return Err(ValidationError::out_of_range(
                "lookback_days",
                self.min_sample_size as f64,
                f64::from(MAX_LOOKBACK_DAYS),
                f64::from(self.lookback_days),
            ));
        }
        if !(self.min_p_value > 0.0 && self.min_p_value <= 1.0) {
            return Err(ValidationError::out_of_range("min_p_value", 0.0, 1.0, self.min_p_value));
        }
        if !(0.0..=1.0).contains(&self.min_effect_size) {
            return Err(ValidationError::out_of_range(
                "min_effect_size",
                0.0,
                1.0,
                self.min_effect_size,
            ));
        }
        if self.max_time_lag_days >= self.lookback_days {
            return Err(ValidationError::out_of_range(
                "max_time_lag_days",
                0.0,
                f64::from(self.lookback_days.saturating_sub(1)),
                f64::from(self.max_time_lag_days),
            ));
        }
        if self.max_data_points == 0 {
            return Err(ValidationError::out_of_range(
                "max_data_points",
                1.0,
                f64::from(u32::MAX),
                0.0,
            ));
        }
        Ok(())
    }
}
