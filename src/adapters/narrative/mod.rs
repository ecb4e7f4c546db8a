//! Narrative Generator Adapters.
//!
//! - `AnthropicNarrativeGenerator` - Anthropic Messages API over reqwest
//! - `MockNarrativeGenerator` - Configurable mock for testing

mod anthropic_generator;
mod mock_generator;

pub use anthropic_generator::{AnthropicNarrativeConfig, AnthropicNarrativeGenerator};
pub use mock_generator::MockNarrativeGenerator;
