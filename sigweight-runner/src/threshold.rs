//! Threshold sweep — pick the qualifying threshold that maximizes the objective.
//!
//! Each candidate threshold filters the scored trades (on raw ML confidence by
//! default, or on total weight) and the qualifying set is measured. Candidates
//! with fewer than `min_trades_per_candidate` qualifying trades are excluded
//! from selection entirely, not scored as zero. Among the rest the highest
//! score wins; ties go to the lowest threshold.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sigweight_core::{ComponentWeights, SignalDirection, ThresholdBasis, WeightConfig};

use crate::error::OptimizeError;
use crate::metrics::{performance_warnings, PerformanceMetrics};
use crate::replay::{breakdown_by, Breakdown, ScoredTrade};
use crate::settings::OptimizerSettings;

/// One evaluated threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCandidate {
    pub threshold: f64,
    pub qualifying: usize,
    pub metrics: PerformanceMetrics,
    /// `None` when the candidate was excluded for too few trades.
    pub score: Option<f64>,
}

impl ThresholdCandidate {
    pub fn is_eligible(&self) -> bool {
        self.score.is_some()
    }
}

/// Output of a sweep: every candidate plus the chosen one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSweepResult {
    pub basis: ThresholdBasis,
    /// Ascending by threshold.
    pub candidates: Vec<ThresholdCandidate>,
    pub best: ThresholdCandidate,
    /// Proposed config: the base weights with the chosen threshold.
    pub config: WeightConfig,
    pub by_direction: BTreeMap<SignalDirection, Breakdown>,
    pub sample_size: usize,
    pub warnings: Vec<String>,
}

/// Configured sweep over a fixed candidate set.
#[derive(Debug, Clone)]
pub struct ThresholdSweep<'a> {
    settings: &'a OptimizerSettings,
    basis: ThresholdBasis,
    weights: ComponentWeights,
}

impl<'a> ThresholdSweep<'a> {
    /// Sweep on raw ML confidence with default component weights.
    pub fn new(settings: &'a OptimizerSettings) -> Self {
        Self {
            settings,
            basis: ThresholdBasis::Confidence,
            weights: ComponentWeights::default(),
        }
    }

    pub fn with_basis(mut self, basis: ThresholdBasis) -> Self {
        self.basis = basis;
        self
    }

    /// Weights used for the total-weight basis and carried into the proposed config.
    pub fn with_weights(mut self, weights: ComponentWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Evaluate a single threshold.
    pub fn evaluate(&self, scored: &[ScoredTrade], threshold: f64) -> ThresholdCandidate {
        let pips: Vec<f64> = scored
            .iter()
            .filter(|t| t.filter_value(self.basis, &self.weights) >= threshold)
            .map(|t| t.pips)
            .collect();
        let metrics = PerformanceMetrics::from_pips(&pips);
        let score = (pips.len() >= self.settings.min_trades_per_candidate).then(|| {
            self.settings
                .objective_kind
                .extract(&metrics, &self.settings.objective)
        });
        tracing::debug!(threshold, qualifying = pips.len(), ?score, "threshold candidate");
        ThresholdCandidate {
            threshold,
            qualifying: pips.len(),
            metrics,
            score,
        }
    }

    /// Evaluate every candidate and select the best.
    ///
    /// Refuses samples smaller than `min_total_trades`.
    pub fn run(&self, scored: &[ScoredTrade]) -> Result<ThresholdSweepResult, OptimizeError> {
        self.settings.validate()?;
        crate::error::require_trades(scored.len(), self.settings.min_total_trades)?;
        self.sweep(scored)
    }

    /// Sweep without the sample-size guard. The pipeline checks
    /// `min_total_trades` against the full source before splitting.
    pub(crate) fn sweep(
        &self,
        scored: &[ScoredTrade],
    ) -> Result<ThresholdSweepResult, OptimizeError> {
        let thresholds = self.settings.sorted_thresholds();
        let candidates: Vec<ThresholdCandidate> = if self.settings.parallel {
            thresholds
                .par_iter()
                .map(|t| self.evaluate(scored, *t))
                .collect()
        } else {
            thresholds.iter().map(|t| self.evaluate(scored, *t)).collect()
        };

        let best = select_best(&candidates, self.settings)
            .cloned()
            .ok_or_else(|| OptimizeError::NoQualifyingCandidate {
                stage: "threshold sweep",
                min_trades: self.settings.min_trades_per_candidate,
            })?;

        let by_direction = breakdown_by(
            scored
                .iter()
                .filter(|t| t.filter_value(self.basis, &self.weights) >= best.threshold)
                .map(|t| (t.direction, t.pips)),
        );
        let warnings =
            performance_warnings(&best.metrics, scored.len(), self.settings.min_total_trades);

        tracing::info!(
            threshold = best.threshold,
            qualifying = best.qualifying,
            win_rate = best.metrics.win_rate,
            total_pips = best.metrics.total_pips,
            "threshold sweep selected"
        );

        Ok(ThresholdSweepResult {
            basis: self.basis,
            config: WeightConfig::new(self.weights, best.threshold, self.basis),
            best,
            candidates,
            by_direction,
            sample_size: scored.len(),
            warnings,
        })
    }
}

/// First maximum among eligible candidates in ascending threshold order.
fn select_best<'c>(
    candidates: &'c [ThresholdCandidate],
    settings: &OptimizerSettings,
) -> Option<&'c ThresholdCandidate> {
    let mut best: Option<(&ThresholdCandidate, f64)> = None;
    for c in candidates {
        let Some(score) = c.score else { continue };
        match best {
            Some((_, incumbent)) if !settings.objective_kind.is_better(score, incumbent) => {}
            _ => best = Some((c, score)),
        }
    }
    best.map(|(c, _)| c)
}
