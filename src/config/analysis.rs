//! Analysis defaults and worker limits

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::connections::{
    AnalysisOptions, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_DATA_POINTS, DEFAULT_MAX_TIME_LAG_DAYS,
    DEFAULT_MIN_EFFECT_SIZE, DEFAULT_MIN_PRESENT_DAYS, DEFAULT_MIN_P_VALUE,
    DEFAULT_MIN_SAMPLE_SIZE,
};

const MAX_WORKER_POOL_SIZE: usize = 64;

/// Defaults applied to options a request leaves out, plus run limits
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,

    #[serde(default = "default_min_p_value")]
    pub min_p_value: f64,

    #[serde(default = "default_min_effect_size")]
    pub min_effect_size: f64,

    #[serde(default)]
    pub include_time_lag: bool,

    #[serde(default = "default_max_time_lag_days")]
    pub max_time_lag_days: u32,

    #[serde(default = "default_min_present_days")]
    pub min_present_days: usize,

    #[serde(default = "default_max_data_points")]
    pub max_data_points: usize,

    /// Pairs analyzed concurrently
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    /// Budget for one whole run, in seconds
    #[serde(default = "default_run_timeout")]
    pub run_timeout_secs: u64,
}

impl AnalysisConfig {
    /// Options used when a request supplies none.
    pub fn to_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            lookback_days: self.lookback_days,
            min_sample_size: self.min_sample_size,
            min_p_value: self.min_p_value,
            min_effect_size: self.min_effect_size,
            include_time_lag: self.include_time_lag,
            max_time_lag_days: self.max_time_lag_days,
            min_present_days: self.min_present_days,
            max_data_points: self.max_data_points,
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    /// Validate analysis configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.worker_pool_size == 0 || self.worker_pool_size > MAX_WORKER_POOL_SIZE {
            return Err(ValidationError::InvalidWorkerPoolSize);
        }
        if self.run_timeout_secs == 0 || self.run_timeout_secs > 600 {
            return Err(ValidationError::InvalidRunTimeout);
        }
        self.to_options()
            .validate()
            .map_err(|e| ValidationError::InvalidAnalysisDefaults(e.to_string()))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            min_sample_size: default_min_sample_size(),
            min_p_value: default_min_p_value(),
            min_effect_size: default_min_effect_size(),
            include_time_lag: false,
            max_time_lag_days: default_max_time_lag_days(),
            min_present_days: default_min_present_days(),
            max_data_points: default_max_data_points(),
            worker_pool_size: default_worker_pool_size(),
            run_timeout_secs: default_run_timeout(),
        }
    }
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_min_sample_size() -> usize {
    DEFAULT_MIN_SAMPLE_SIZE
}

fn default_min_p_value() -> f64 {
    DEFAULT_MIN_P_VALUE
}

fn default_min_effect_size() -> f64 {
    DEFAULT_MIN_EFFECT_SIZE
}

fn default_max_time_lag_days() -> u32 {
    DEFAULT_MAX_TIME_LAG_DAYS
}

fn default_min_present_days() -> usize {
    DEFAULT_MIN_PRESENT_DAYS
}

fn default_max_data_points() -> usize {
    DEFAULT_MAX_DATA_POINTS
}

fn default_worker_pool_size() -> usize {
    4
}

fn default_run_timeout() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.to_options(), AnalysisOptions::default());
        assert_eq!(config.worker_pool_size, 4);
        assert_eq!(config.run_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_worker_pool_bounds() {
        let config = AnalysisConfig {
            worker_pool_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AnalysisConfig {
            worker_pool_size: 65,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_defaults() {
        let config = AnalysisConfig {
            min_p_value: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidAnalysisDefaults(_))
        ));
    }
}
