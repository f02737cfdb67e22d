//! Optimization report — the persisted record of one pipeline run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sigweight_core::{ConfigId, ConfigStore, StoreError, WeightConfig};

use crate::comparator::ComparisonReport;
use crate::metrics::PerformanceMetrics;
use crate::settings::OptimizerSettings;
use crate::threshold::ThresholdCandidate;

/// Current report schema version. Newer versions are rejected on load.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

/// Which optimization produced the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Threshold sweep on raw ML confidence.
    Threshold,
    /// Differential-evolution search for component weights.
    Weights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub generations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    /// Where the trades came from.
    pub source: String,
    pub mode: SearchMode,
    pub settings: OptimizerSettings,
    pub train_size: usize,
    pub test_size: usize,
    pub candidate_id: ConfigId,
    pub candidate: WeightConfig,
    pub baseline: WeightConfig,
    /// In-sample metrics of the candidate on the train split.
    pub train_metrics: PerformanceMetrics,
    pub train_score: f64,
    /// Every sweep candidate (empty for a weight search).
    #[serde(default)]
    pub threshold_candidates: Vec<ThresholdCandidate>,
    #[serde(default)]
    pub evolution: Option<EvolutionSummary>,
    /// Candidate vs baseline on the held-out test split.
    pub holdout: ComparisonReport,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl OptimizationReport {
    /// Propose the candidate and attach its holdout metrics. Does not activate.
    pub fn record_in(&self, store: &dyn ConfigStore) -> Result<ConfigId, StoreError> {
        let id = store.propose(self.candidate.clone())?;
        store.record_backtest(&id, self.holdout.candidate.metrics.summary())?;
        tracing::info!(config = %id.short(), "candidate recorded as backtested");
        Ok(id)
    }
}
