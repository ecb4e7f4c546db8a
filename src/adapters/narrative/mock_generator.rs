//! Mock Narrative Generator for testing.
//!
//! Returns queued narratives or errors in order, can simulate latency, and
//! records every summary it was asked about.
//!
//! # Example
//!
//! ```ignore
//! let generator = MockNarrativeGenerator::new()
//!     .with_error(NarrativeError::unavailable("down"))
//!     .with_delay(Duration::from_millis(100));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::connections::{ConnectionSummary, Narrative};
use crate::ports::{NarrativeError, NarrativeGenerator};

#[derive(Debug, Clone, Default)]
pub struct MockNarrativeGenerator {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<Result<Narrative, NarrativeError>>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ConnectionSummary>>>,
}

impl MockNarrativeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_narrative(self, narrative: Narrative) -> Self {
        self.responses.lock().unwrap().push_back(Ok(narrative));
        self
    }

    pub fn with_error(self, error: NarrativeError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<ConnectionSummary> {
        self.calls.lock().unwrap().clone()
    }

    /// Next queued response, or a narrative derived from the summary.
    fn next_response(&self, summary: &ConnectionSummary) -> Result<Narrative, NarrativeError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(Narrative {
                    title: format!("{} and {}", summary.domain_a, summary.domain_b),
                    description: format!(
                        "{} and {} show a {} {} relationship.",
                        summary.domain_a, summary.domain_b, summary.strength, summary.direction
                    ),
                    explanation: "This is a correlation, not proof of cause.".to_string(),
                })
            })
    }
}

#[async_trait]
impl NarrativeGenerator for MockNarrativeGenerator {
    async fn generate_narrative(
        &self,
        summary: &ConnectionSummary,
    ) -> Result<Narrative, NarrativeError> {
        self.calls.lock().unwrap().push(summary.clone());

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        self.next_response(summary)
    }
}
