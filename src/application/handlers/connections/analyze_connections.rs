//! AnalyzeConnectionsHandler - Runs the correlation engine for one user and
//! replaces their stored connection set.
//!
//! # Flow
//!
//! 1. Validate options (nothing is fetched for invalid input)
//! 2. Fetch every domain's observations for the lookback window
//! 3. Build series and candidate pairs
//! 4. Analyze pairs on a bounded pool of blocking workers
//! 5. Barrier: BH correction, filter, confounder check, assembly
//! 6. Best-effort narratives, each under its own timeout
//! 7. Atomically replace the stored set
//!
//! Steps 2-7 share one overall time budget. Nothing is written unless every
//! step succeeds, so callers see either the new complete set or the old one.
//! A write cut off by the budget is dropped before it commits.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::connections::{AnalysisOptions, Connection, CorrelationEngine, PairAnalysis};
use crate::domain::foundation::{
    DateRange, DomainError, ErrorCode, Timestamp, UserId, ValidationError,
};
use crate::ports::{ConnectionStore, DomainDataSource, NarrativeGenerator};

/// Command to analyze a user's data.
#[derive(Debug, Clone)]
pub struct AnalyzeConnectionsCommand {
    pub user_id: UserId,
    pub options: AnalysisOptions,
    /// Last day of the lookback window; today (UTC) when `None`.
    pub as_of: Option<NaiveDate>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct AnalyzeConnectionsResult {
    pub pairs_analyzed: usize,
    pub significant_pairs: usize,
    pub connections: Vec<Connection>,
}

/// Run-level failures. None of them leaves a partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("invalid analysis options: {0}")]
    InvalidOptions(#[from] ValidationError),

    #[error("domain data source unavailable: {0}")]
    DataSource(DomainError),

    #[error("analysis exceeded its {timeout_secs}s budget")]
    Timeout { timeout_secs: u64 },

    #[error("failed to persist connections: {0}")]
    Persistence(DomainError),

    #[error("analysis worker failed: {0}")]
    Worker(String),
}

impl AnalysisError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::InvalidOptions(_) => ErrorCode::ValidationFailed,
            AnalysisError::DataSource(_) => ErrorCode::DataSourceUnavailable,
            AnalysisError::Timeout { .. } => ErrorCode::AnalysisTimeout,
            AnalysisError::Persistence(_) => ErrorCode::DatabaseError,
            AnalysisError::Worker(_) => ErrorCode::InternalError,
        }
    }
}

/// Runtime limits for the handler.
#[derive(Debug, Clone)]
pub struct AnalyzeConnectionsConfig {
    /// Pairs analyzed concurrently; also bounds concurrent narrative calls.
    pub worker_pool_size: usize,
    /// Budget for fetching, analysis, narratives and the final write together.
    pub run_timeout: Duration,
    /// Budget for one narrative request.
    pub narrative_timeout: Duration,
}

impl Default for AnalyzeConnectionsConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 4,
            run_timeout: Duration::from_secs(60),
            narrative_timeout: Duration::from_secs(10),
        }
    }
}

/// Handler for analysis runs.
pub struct AnalyzeConnectionsHandler {
    data_source: Arc<dyn DomainDataSource>,
    store: Arc<dyn ConnectionStore>,
    narrative: Option<Arc<dyn NarrativeGenerator>>,
    config: AnalyzeConnectionsConfig,
}

impl AnalyzeConnectionsHandler {
    pub fn new(
        data_source: Arc<dyn DomainDataSource>,
        store: Arc<dyn ConnectionStore>,
        config: AnalyzeConnectionsConfig,
    ) -> Self {
        Self {
            data_source,
            store,
            narrative: None,
            config,
        }
    }

    /// Attaches a narrative generator; without one connections carry no text.
    pub fn with_narrative_generator(mut self, generator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrative = Some(generator);
        self
    }

    pub async fn handle(
        &self,
        cmd: AnalyzeConnectionsCommand,
    ) -> Result<AnalyzeConnectionsResult, AnalysisError> {
        let engine = Arc::new(CorrelationEngine::new(cmd.options)?);
        let as_of = cmd.as_of.unwrap_or_else(|| Timestamp::now().date());
        let window = engine.window_ending(as_of)?;

        info!(
            user_id = %cmd.user_id,
            as_of = %as_of,
            lookback_days = engine.options().lookback_days,
            "Starting connection analysis"
        );

        let deadline = Instant::now() + self.config.run_timeout;
        let timeout_secs = self.config.run_timeout.as_secs();
        let result = tokio::time::timeout_at(
            deadline,
            self.compute(&cmd.user_id, engine, window),
        )
        .await
        .map_err(|_| AnalysisError::Timeout { timeout_secs })
        .and_then(|inner| inner);

        let result = match result {
            Ok(result) => result,
            Err(err) => {
                warn!(user_id = %cmd.user_id, error = %err, "Connection analysis failed");
                return Err(err);
            }
        };

        tokio::time::timeout_at(
            deadline,
            self.store.replace_connections(&cmd.user_id, &result.connections),
        )
        .await
        .map_err(|_| AnalysisError::Timeout { timeout_secs })
        .and_then(|written| written.map_err(AnalysisError::Persistence))
        .map_err(|err| {
            warn!(user_id = %cmd.user_id, error = %err, "Failed to persist connections");
            err
        })?;

        info!(
            user_id = %cmd.user_id,
            pairs_analyzed = result.pairs_analyzed,
            significant_pairs = result.significant_pairs,
            "Connection analysis complete"
        );

        Ok(result)
    }

    async fn compute(
        &self,
        user_id: &UserId,
        engine: Arc<CorrelationEngine>,
        window: DateRange,
    ) -> Result<AnalyzeConnectionsResult, AnalysisError> {
        let domains = self
            .data_source
            .list_domains(user_id)
            .await
            .map_err(AnalysisError::DataSource)?;

        let mut metrics = Vec::new();
        for domain in &domains {
            let fetched = self
                .data_source
                .fetch_domain_series(user_id, domain, &window)
                .await
                .map_err(AnalysisError::DataSource)?;
            metrics.extend(fetched);
        }

        let built = engine.build_series(window, metrics);
        debug!(
            user_id = %user_id,
            domains = domains.len(),
            series = built.series.len(),
            dropped = built.dropped.len(),
            "Series built"
        );

        let pairs = engine.candidate_pairs(built.series);
        let analyses = self.analyze_pairs(&engine, pairs).await?;
        let output = engine.finalize(analyses, Timestamp::now());
        let connections = self.attach_narratives(output.connections).await;

        Ok(AnalyzeConnectionsResult {
            pairs_analyzed: output.pairs_analyzed,
            significant_pairs: output.significant_pairs,
            connections,
        })
    }

    /// Fans pairs out to blocking workers, at most `worker_pool_size` at a
    /// time, and waits for all of them. Dropping the future stops dispatch;
    /// pairs already on a worker run to completion and are discarded.
    async fn analyze_pairs(
        &self,
        engine: &Arc<CorrelationEngine>,
        pairs: Vec<crate::domain::connections::CandidatePair>,
    ) -> Result<Vec<PairAnalysis>, AnalysisError> {
        let permits = Arc::new(Semaphore::new(self.config.worker_pool_size.max(1)));
        let mut handles = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|e| AnalysisError::Worker(e.to_string()))?;
            let engine = Arc::clone(engine);
            handles.push(tokio::task::spawn_blocking(move || {
                let _permit = permit;
                engine.analyze_pair(&pair)
            }));
        }

        let mut analyses = Vec::with_capacity(handles.len());
        for handle in handles {
            let analysis = handle
                .await
                .map_err(|e| AnalysisError::Worker(e.to_string()))?;
            analyses.extend(analysis);
        }
        Ok(analyses)
    }

    /// Best effort: a failed or slow narrative leaves the connection without
    /// text.
    async fn attach_narratives(&self, connections: Vec<Connection>) -> Vec<Connection> {
        let Some(generator) = self.narrative.as_ref() else {
            return connections;
        };

        let permits = Arc::new(Semaphore::new(self.config.worker_pool_size.max(1)));
        let narrative_timeout = self.config.narrative_timeout;

        let tasks = connections.into_iter().map(|connection| {
            let generator = Arc::clone(generator);
            let permits = Arc::clone(&permits);
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return connection;
                };
                let summary = connection.summary();
                match tokio::time::timeout(narrative_timeout, generator.generate_narrative(&summary)).await {
                    Ok(Ok(narrative)) => connection.with_narrative(narrative),
                    Ok(Err(e)) => {
                        warn!(
                            connection_id = %connection.id,
                            domain_a = %connection.domain_a.domain_type,
                            domain_b = %connection.domain_b.domain_type,
                            error = %e,
                            "Narrative generation failed"
                        );
                        connection
                    }
                    Err(_) => {
                        warn!(
                            connection_id = %connection.id,
                            timeout_secs = narrative_timeout.as_secs(),
                            "Narrative generation timed out"
                        );
                        connection
                    }
                }
            }
        });

        futures::future::join_all(tasks).await
    }
}
