//! Sigweight Runner — optimization and backtest replay over historical trades.
//!
//! This crate contains everything that turns labeled trades into a proposed config:
//! - Performance metrics and the composite objective
//! - Confidence-threshold sweep (optionally rayon-parallel)
//! - Differential-evolution search for component weights
//! - Candidate vs baseline comparison with direction and tier breakdowns
//! - Chronological holdout pipeline and its persisted report
//! - TOML settings, JSONL trade sources, JSON/CSV/Markdown export

pub mod comparator;
pub mod error;
pub mod evolution;
pub mod export;
pub mod holdout;
pub mod metrics;
pub mod objective;
pub mod optimizer;
pub mod replay;
pub mod report;
pub mod settings;
pub mod source;
pub mod threshold;
pub mod weight_search;

pub use comparator::{compare, compare_scored, Comparator, ComparisonReport, MetricDeltas};
pub use error::OptimizeError;
pub use evolution::{DifferentialEvolution, EvolutionOutcome};
pub use holdout::{HoldoutError, HoldoutSplit};
pub use metrics::{performance_warnings, PerformanceMetrics, PROFIT_FACTOR_SENTINEL};
pub use objective::{ObjectiveKind, ObjectiveWeights};
pub use optimizer::{OptimizationPipeline, Optimizer};
pub use replay::{replay, score_trades, Breakdown, ReplayOutcome, ScoredTrade};
pub use report::{EvolutionSummary, OptimizationReport, SearchMode, REPORT_SCHEMA_VERSION};
pub use settings::{EvolutionSettings, OptimizerSettings, SettingsError};
pub use source::{InMemoryTradeSource, JsonlTradeSource, SourceError, TradeSource};
pub use threshold::{ThresholdCandidate, ThresholdSweep, ThresholdSweepResult};
pub use weight_search::{WeightSearch, WeightSearchResult};
