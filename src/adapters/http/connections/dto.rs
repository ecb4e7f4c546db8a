//! HTTP DTOs (Data Transfer Objects) for connection endpoints.
//!
//! Wire names are camelCase to match the persisted `Connection` shape.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::application::AnalyzeConnectionsResult;
use crate::domain::connections::{AnalysisOptions, Connection};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/connections/analyze`. Every field is optional; absent
/// fields fall back to the server's configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalyzeConnectionsRequest {
    pub lookback_days: Option<u32>,
    pub min_sample_size: Option<usize>,
    pub min_p_value: Option<f64>,
    pub min_effect_size: Option<f64>,
    pub include_time_lag: Option<bool>,
    pub max_time_lag_days: Option<u32>,
    pub min_present_days: Option<usize>,
    pub max_data_points: Option<usize>,
    /// Last day of the window; defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
}

impl AnalyzeConnectionsRequest {
    /// Overlays the supplied fields on `defaults`.
    pub fn to_options(&self, defaults: &AnalysisOptions) -> AnalysisOptions {
        AnalysisOptions {
            lookback_days: self.lookback_days.unwrap_or(defaults.lookback_days),
            min_sample_size: self.min_sample_size.unwrap_or(defaults.min_sample_size),
            min_p_value: self.min_p_value.unwrap_or(defaults.min_p_value),
            min_effect_size: self.min_effect_size.unwrap_or(defaults.min_effect_size),
            include_time_lag: self.include_time_lag.unwrap_or(defaults.include_time_lag),
            max_time_lag_days: self.max_time_lag_days.unwrap_or(defaults.max_time_lag_days),
            min_present_days: self.min_present_days.unwrap_or(defaults.min_present_days),
            max_data_points: self.max_data_points.unwrap_or(defaults.max_data_points),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Outcome of an analysis run. On failure `success` is false, `reason` says
/// why, and the stored connection set is unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeConnectionsResponse {
    pub success: bool,
    pub pairs_analyzed: usize,
    pub significant_pairs: usize,
    pub connections: Vec<Connection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AnalyzeConnectionsResponse {
    pub fn failure(error_code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            pairs_analyzed: 0,
            significant_pairs: 0,
            connections: Vec::new(),
            error_code: Some(error_code.into()),
            reason: Some(reason.into()),
        }
    }
}

impl From<AnalyzeConnectionsResult> for AnalyzeConnectionsResponse {
    fn from(result: AnalyzeConnectionsResult) -> Self {
        Self {
            success: true,
            pairs_analyzed: result.pairs_analyzed,
            significant_pairs: result.significant_pairs,
            connections: result.connections,
            error_code: None,
            reason: None,
        }
    }
}

/// Stored connections for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionListResponse {
    pub total: usize,
    pub connections: Vec<Connection>,
}

impl From<Vec<Connection>> for ConnectionListResponse {
    fn from(connections: Vec<Connection>) -> Self {
        Self {
            total: connections.len(),
            connections,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
