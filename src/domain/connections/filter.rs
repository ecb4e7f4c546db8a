//! Significance & Noise Filter - thresholds, strength and direction.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::analyzer::CorrelationResult;

/// Magnitude bucket of a coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl Strength {
    /// `< 0.3` weak, `0.3..=0.6` moderate, `> 0.6` strong.
    pub fn from_coefficient(coefficient: f64) -> Self {
        let magnitude = coefficient.abs();
        if magnitude < 0.3 {
            Strength::Weak
        } else if magnitude <= 0.6 {
            Strength::Moderate
        } else {
            Strength::Strong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Weak => "weak",
            Strength::Moderate => "moderate",
            Strength::Strong => "strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    /// Zero counts as negative.
    pub fn from_coefficient(coefficient: f64) -> Self {
        if coefficient > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decides which analyzed pairs are worth reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignificanceFilter {
    pub min_p_value: f64,
    pub min_sample_size: usize,
    pub min_effect_size: f64,
}

impl SignificanceFilter {
    pub fn new(min_p_value: f64, min_sample_size: usize, min_effect_size: f64) -> Self {
        Self {
            min_p_value,
            min_sample_size,
            min_effect_size,
        }
    }

    /// All of: adjusted p at or below the ceiling, effective sample size at
    /// or above the floor, effect size at or above the floor.
    pub fn passes(&self, result: &CorrelationResult) -> bool {
        self.passes_values(
            result.adjusted_p_value,
            result.effective_sample_size,
            result.effect_size,
        )
    }

    /// Same thresholds applied to loose values, for residual re-tests.
    pub fn passes_values(&self, adjusted_p_value: f64, effective_sample_size: f64, effect_size: f64) -> bool {
        adjusted_p_value <= self.min_p_value
            && effective_sample_size >= self.min_sample_size as f64
            && effect_size.abs() >= self.min_effect_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connections::analyzer::CorrelationType;

    fn result(adjusted_p_value: f64, effective_sample_size: f64, effect_size: f64) -> CorrelationResult {
        CorrelationResult {
            coefficient: effect_size,
            p_value: adjusted_p_value,
            adjusted_p_value,
            effective_sample_size,
            autocorrelation: 0.0,
            correlation_type: CorrelationType::Spearman,
            time_lag_days: 0,
            sample_size: 30,
            effect_size,
        }
    }

    #[test]
    fn strength_buckets() {
        assert_eq!(Strength::from_coefficient(0.29), Strength::Weak);
        assert_eq!(Strength::from_coefficient(-0.3), Strength::Moderate);
        assert_eq!(Strength::from_coefficient(0.6), Strength::Moderate);
        assert_eq!(Strength::from_coefficient(-0.61), Strength::Strong);
    }

    #[test]
    fn direction_follows_sign() {
        assert_eq!(Direction::from_coefficient(0.4), Direction::Positive);
        assert_eq!(Direction::from_coefficient(-0.4), Direction::Negative);
        assert_eq!(Direction::from_coefficient(0.0), Direction::Negative);
        assert_eq!(serde_json::to_string(&Direction::Positive).unwrap(), "\"positive\"");
    }

    #[test]
    fn passes_only_when_every_threshold_holds() {
        let filter = SignificanceFilter::new(0.05, 14, 0.3);

        assert!(filter.passes(&result(0.05, 14.0, 0.3)));
        assert!(!filter.passes(&result(0.051, 30.0, 0.8)));
        assert!(!filter.passes(&result(0.001, 13.9, 0.8)));
        assert!(!filter.passes(&result(0.001, 30.0, 0.29)));
    }

    #[test]
    fn negative_effects_are_judged_by_magnitude() {
        let filter = SignificanceFilter::new(0.05, 14, 0.3);
        assert!(filter.passes_values(0.01, 20.0, -0.5));
    }
}
