//! Component-weight search — differential evolution over the weight simplex.
//!
//! Each individual is a point in [0, 1]^5, projected onto the simplex by
//! dividing by its sum before evaluation. Trades qualify when their total weight
//! under the projected weights reaches the fixed search threshold. A point with
//! fewer than `min_trades_per_candidate` qualifying trades (or an all-zero
//! vector) is infeasible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sigweight_core::{ComponentWeights, SignalDirection, ThresholdBasis, WeightConfig};

use crate::error::{require_trades, OptimizeError};
use crate::evolution::DifferentialEvolution;
use crate::metrics::{performance_warnings, PerformanceMetrics};
use crate::replay::{breakdown_by, Breakdown, ScoredTrade};
use crate::settings::OptimizerSettings;

const DIMS: usize = 5;

/// Output of a weight search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSearchResult {
    /// Proposed config: optimized weights, search threshold, weight basis.
    pub config: WeightConfig,
    pub metrics: PerformanceMetrics,
    pub score: f64,
    pub generations: usize,
    pub evaluations: usize,
    pub converged: bool,
    pub by_direction: BTreeMap<SignalDirection, Breakdown>,
    pub sample_size: usize,
    pub warnings: Vec<String>,
}

pub struct WeightSearch<'a> {
    settings: &'a OptimizerSettings,
}

impl<'a> WeightSearch<'a> {
    pub fn new(settings: &'a OptimizerSettings) -> Self {
        Self { settings }
    }

    /// Score of the trades qualifying under `weights`, or `None` when too few qualify.
    pub fn evaluate(
        &self,
        scored: &[ScoredTrade],
        weights: &ComponentWeights,
    ) -> Option<(f64, PerformanceMetrics)> {
        let pips: Vec<f64> = qualifying(scored, weights, self.settings.weight_search_threshold)
            .map(|t| t.pips)
            .collect();
        if pips.len() < self.settings.min_trades_per_candidate {
            return None;
        }
        let metrics = PerformanceMetrics::from_pips(&pips);
        let score = self
            .settings
            .objective_kind
            .extract(&metrics, &self.settings.objective);
        Some((score, metrics))
    }

    /// Refuses samples smaller than `min_total_trades`.
    pub fn run(&self, scored: &[ScoredTrade]) -> Result<WeightSearchResult, OptimizeError> {
        self.settings.validate()?;
        require_trades(scored.len(), self.settings.min_total_trades)?;
        self.search(scored)
    }

    /// Search without the sample-size guard; the pipeline checks the full source instead.
    pub(crate) fn search(
        &self,
        scored: &[ScoredTrade],
    ) -> Result<WeightSearchResult, OptimizeError> {
        let de = DifferentialEvolution::new(self.settings.evolution.clone())
            .with_parallelism(self.settings.parallel);
        let outcome = de.maximize(&[(0.0, 1.0); DIMS], |x| {
            let Some(weights) = to_weights(x) else {
                return f64::NEG_INFINITY;
            };
            self.evaluate(scored, &weights)
                .map_or(f64::NEG_INFINITY, |(score, _)| score)
        });

        let infeasible = || OptimizeError::NoQualifyingCandidate {
            stage: "weight search",
            min_trades: self.settings.min_trades_per_candidate,
        };
        if !outcome.is_feasible() {
            return Err(infeasible());
        }
        let weights = to_weights(&outcome.best).ok_or_else(infeasible)?;
        let (score, metrics) = self.evaluate(scored, &weights).ok_or_else(infeasible)?;

        let config = WeightConfig::new(
            weights,
            self.settings.weight_search_threshold,
            ThresholdBasis::Weight,
        );
        config.validate()?;

        let by_direction = breakdown_by(
            qualifying(scored, &weights, self.settings.weight_search_threshold)
                .map(|t| (t.direction, t.pips)),
        );
        let warnings =
            performance_warnings(&metrics, scored.len(), self.settings.min_total_trades);

        tracing::info!(
            weights = ?weights.as_array(),
            score,
            qualifying = metrics.trade_count,
            generations = outcome.generations,
            converged = outcome.converged,
            "weight search finished"
        );

        Ok(WeightSearchResult {
            config,
            metrics,
            score,
            generations: outcome.generations,
            evaluations: outcome.evaluations,
            converged: outcome.converged,
            by_direction,
            sample_size: scored.len(),
            warnings,
        })
    }
}

fn to_weights(x: &[f64]) -> Option<ComponentWeights> {
    let arr: [f64; DIMS] = x.try_into().ok()?;
    ComponentWeights::from_array(arr).normalized()
}

fn qualifying<'s>(
    scored: &'s [ScoredTrade],
    weights: &'s ComponentWeights,
    threshold: f64,
) -> impl Iterator<Item = &'s ScoredTrade> + 's {
    scored
        .iter()
        .filter(move |t| t.total_weight(weights) >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objective::ObjectiveKind;
    use crate::settings::EvolutionSettings;
    use sigweight_core::ComponentScores;

    /// Trades where only the technical score predicts the outcome.
    fn technical_driven_sample(n: usize) -> Vec<ScoredTrade> {
        (0..n)
            .map(|i| {
                let tech = (i * 37 % 100) as f64;
                let noise = (i * 53 % 100) as f64;
                let win = tech >= 60.0;
                ScoredTrade {
                    ml_confidence: noise,
                    direction: SignalDirection::Buy,
                    components: ComponentScores {
                        ml_confidence: noise,
                        technical_quality: tech,
                        market_conditions: (i * 71 % 100) as f64,
                        mtf_confirmation: (i * 29 % 100) as f64,
                        risk_factors: (i * 89 % 100) as f64,
                    },
                    pips: if win { 10.0 } else { -10.0 },
                }
            })
            .collect()
    }

    fn fast_settings(seed: u64) -> OptimizerSettings {
        OptimizerSettings {
            weight_search_threshold: 60.0,
            parallel: false,
            evolution: EvolutionSettings {
                max_generations: 40,
                seed,
                ..EvolutionSettings::default()
            },
            ..OptimizerSettings::default()
        }
    }

    #[test]
    fn result_lies_on_simplex() {
        let s = fast_settings(42);
        let result = WeightSearch::new(&s).run(&technical_driven_sample(300)).unwrap();
        assert!(result.config.validate().is_ok());
        assert!((result.config.component_weights.sum() - 1.0).abs() < 1e-9);
        assert_eq!(result.config.threshold_basis, ThresholdBasis::Weight);
        assert_eq!(result.config.confidence_threshold, 60.0);
    }

    #[test]
    fn improves_win_rate_over_default_weights() {
        let mut s = fast_settings(42);
        s.objective_kind = ObjectiveKind::WinRate;
        let trades = technical_driven_sample(300);
        let result = WeightSearch::new(&s).run(&trades).unwrap();

        let (default_win_rate, _) = WeightSearch::new(&s)
            .evaluate(&trades, &ComponentWeights::default())
            .unwrap_or((0.0, PerformanceMetrics::default()));
        assert!(result.score >= default_win_rate);
        // Base rate of winners is 40%.
        assert!(result.metrics.win_rate > 40.0, "{:?}", result.metrics);
        assert!(result.metrics.trade_count >= s.min_trades_per_candidate);
    }

    #[test]
    fn same_seed_same_weights() {
        let s = fast_settings(5);
        let trades = technical_driven_sample(200);
        let a = WeightSearch::new(&s).run(&trades).unwrap();
        let b = WeightSearch::new(&s).run(&trades).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut s = fast_settings(8);
        let trades = technical_driven_sample(200);
        let seq = WeightSearch::new(&s).run(&trades).unwrap();
        s.parallel = true;
        let par = WeightSearch::new(&s).run(&trades).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn unreachable_threshold_is_non_convergence() {
        let mut s = fast_settings(1);
        s.weight_search_threshold = 100.0;
        s.evolution.max_generations = 3;
        let err = WeightSearch::new(&s).run(&technical_driven_sample(150)).unwrap_err();
        assert!(matches!(
            err,
            OptimizeError::NoQualifyingCandidate { stage: "weight search", .. }
        ));
    }

    #[test]
    fn too_few_trades_is_insufficient_data() {
        let s = fast_settings(1);
        let err = WeightSearch::new(&s).run(&technical_driven_sample(99)).unwrap_err();
        assert!(matches!(err, OptimizeError::InsufficientData { available: 99, .. }));
    }

    #[test]
    fn zero_vector_is_infeasible() {
        assert!(to_weights(&[0.0; 5]).is_none());
        assert!(to_weights(&[1.0; 4]).is_none());
    }
}
