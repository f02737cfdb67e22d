//! Optimizer and pipeline — wire a trade source to the sweep, the search, and the holdout.
//!
//! `Optimizer` runs a single optimization mode over everything the source
//! supplies. `OptimizationPipeline` is the leakage-free path: it splits the
//! trades chronologically, optimizes on the earlier part, and compares the
//! candidate against a baseline on the later part only. Neither activates a
//! config; that is always a separate explicit call on a `ConfigStore`.

use chrono::Utc;
use sigweight_core::{SignalWeightCalculator, WeightConfig};

use crate::comparator::compare_scored;
use crate::error::{require_trades, OptimizeError};
use crate::holdout::HoldoutSplit;
use crate::replay::{score_trades, ScoredTrade};
use crate::report::{EvolutionSummary, OptimizationReport, SearchMode, REPORT_SCHEMA_VERSION};
use crate::settings::OptimizerSettings;
use crate::source::TradeSource;
use crate::threshold::{ThresholdSweep, ThresholdSweepResult};
use crate::weight_search::{WeightSearch, WeightSearchResult};

// ─── Optimizer ───────────────────────────────────────────────────────

pub struct Optimizer<S: TradeSource> {
    source: S,
    settings: OptimizerSettings,
    calculator: SignalWeightCalculator,
}

impl<S: TradeSource> Optimizer<S> {
    /// Validates settings up front so a bad file fails before any data is loaded.
    pub fn new(source: S, settings: OptimizerSettings) -> Result<Self, OptimizeError> {
        settings.validate()?;
        let calculator = SignalWeightCalculator::new(settings.risk_tiers.clone());
        Ok(Self {
            source,
            settings,
            calculator,
        })
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    fn load_scored(&self) -> Result<Vec<ScoredTrade>, OptimizeError> {
        let trades = self.source.load_trades()?;
        require_trades(trades.len(), self.settings.min_total_trades)?;
        Ok(score_trades(&self.calculator, &trades))
    }

    /// Threshold sweep on raw ML confidence.
    pub fn sweep_thresholds(&self) -> Result<ThresholdSweepResult, OptimizeError> {
        let scored = self.load_scored()?;
        ThresholdSweep::new(&self.settings).run(&scored)
    }

    /// Differential-evolution search for component weights.
    pub fn search_weights(&self) -> Result<WeightSearchResult, OptimizeError> {
        let scored = self.load_scored()?;
        WeightSearch::new(&self.settings).run(&scored)
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────

pub struct OptimizationPipeline<S: TradeSource> {
    source: S,
    settings: OptimizerSettings,
    calculator: SignalWeightCalculator,
}

impl<S: TradeSource> OptimizationPipeline<S> {
    pub fn new(source: S, settings: OptimizerSettings) -> Result<Self, OptimizeError> {
        settings.validate()?;
        let calculator = SignalWeightCalculator::new(settings.risk_tiers.clone());
        Ok(Self {
            source,
            settings,
            calculator,
        })
    }

    /// Optimize on the train split, then compare against `baseline` on the test split.
    pub fn run(
        &self,
        mode: SearchMode,
        baseline: &WeightConfig,
    ) -> Result<OptimizationReport, OptimizeError> {
        let trades = self.source.load_trades()?;
        // The minimum applies to the whole history; the train split is not re-checked.
        require_trades(trades.len(), self.settings.min_total_trades)?;

        let split = HoldoutSplit::chronological(trades, self.settings.holdout_fraction)?;
        let train = score_trades(&self.calculator, &split.train);
        let test = score_trades(&self.calculator, &split.test);
        tracing::info!(
            ?mode,
            train = train.len(),
            test = test.len(),
            "optimizing on train split"
        );

        let (candidate, train_metrics, train_score, threshold_candidates, evolution, mut warnings) =
            match mode {
                SearchMode::Threshold => {
                    let r = ThresholdSweep::new(&self.settings).sweep(&train)?;
                    let score = r.best.score.unwrap_or(f64::NEG_INFINITY);
                    (r.config, r.best.metrics, score, r.candidates, None, r.warnings)
                }
                SearchMode::Weights => {
                    let r = WeightSearch::new(&self.settings).search(&train)?;
                    let evolution = EvolutionSummary {
                        generations: r.generations,
                        evaluations: r.evaluations,
                        converged: r.converged,
                    };
                    (r.config, r.metrics, r.score, Vec::new(), Some(evolution), r.warnings)
                }
            };

        let holdout = compare_scored(&test, &candidate, baseline);
        let holdout_warning = if holdout.candidate.qualifying() == 0 {
            Some("candidate qualifies no trades on the holdout set".to_string())
        } else if !holdout.candidate_wins() {
            Some(format!(
                "candidate does not beat the baseline on the holdout set \
                 ({:+.1} pips, {:+.1}% win rate)",
                holdout.improvement.total_pips, holdout.improvement.win_rate
            ))
        } else {
            None
        };
        if let Some(w) = holdout_warning {
            tracing::warn!("{w}");
            warnings.push(w);
        }

        Ok(OptimizationReport {
            schema_version: REPORT_SCHEMA_VERSION,
            generated_at: Utc::now(),
            source: self.source.describe(),
            mode,
            settings: self.settings.clone(),
            train_size: train.len(),
            test_size: test.len(),
            candidate_id: candidate.fingerprint(),
            candidate,
            baseline: baseline.clone(),
            train_metrics,
            train_score,
            threshold_candidates,
            evolution,
            holdout,
            warnings,
        })
    }
}
