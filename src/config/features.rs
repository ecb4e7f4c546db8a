//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureFlags {
    /// Attach generated narratives to connections
    #[serde(default)]
    pub enable_narratives: bool,

    /// Include failure detail in analysis responses (disable in production!)
    #[serde(default)]
    pub verbose_errors: bool,
}
