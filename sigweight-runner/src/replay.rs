//! Replay — score historical trades once, then filter and measure them under any config.
//!
//! Component scores do not depend on the component weights, so each trade is
//! scored once up front. Every sweep candidate and every differential-evolution
//! individual then only re-forms the weighted sum, which keeps the optimizer's
//! inner loop allocation-light.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sigweight_core::{
    position_multiplier, ComponentScores, ComponentWeights, HistoricalTrade, Recommendation,
    SignalDirection, SignalWeightCalculator, ThresholdBasis, WeightConfig,
};

use crate::metrics::{win_rate, PerformanceMetrics};

/// A historical trade reduced to what filtering and measuring need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTrade {
    pub ml_confidence: f64,
    pub direction: SignalDirection,
    pub components: ComponentScores,
    pub pips: f64,
}

impl ScoredTrade {
    pub fn total_weight(&self, weights: &ComponentWeights) -> f64 {
        self.components.weighted_total(weights)
    }

    /// The value a threshold of `basis` is compared against.
    pub fn filter_value(&self, basis: ThresholdBasis, weights: &ComponentWeights) -> f64 {
        match basis {
            ThresholdBasis::Confidence => self.ml_confidence,
            ThresholdBasis::Weight => self.total_weight(weights),
        }
    }
}

/// Score every trade with `calculator`, preserving input order.
pub fn score_trades(
    calculator: &SignalWeightCalculator,
    trades: &[HistoricalTrade],
) -> Vec<ScoredTrade> {
    trades
        .iter()
        .map(|t| ScoredTrade {
            ml_confidence: t.ml_confidence(),
            direction: t.direction(),
            components: calculator.score_components(&t.signal),
            pips: t.pips(),
        })
        .collect()
}

/// Count, win rate, and pips for one slice of the qualifying set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub count: usize,
    pub win_rate: f64,
    pub total_pips: f64,
    pub avg_pips: f64,
}

impl Breakdown {
    pub fn from_pips(pips: &[f64]) -> Self {
        let total_pips: f64 = pips.iter().sum();
        Self {
            count: pips.len(),
            win_rate: win_rate(pips),
            total_pips,
            avg_pips: if pips.is_empty() {
                0.0
            } else {
                total_pips / pips.len() as f64
            },
        }
    }
}

/// Group pips by key into per-key breakdowns.
pub fn breakdown_by<K: Ord>(items: impl IntoIterator<Item = (K, f64)>) -> BTreeMap<K, Breakdown> {
    let mut grouped: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for (key, pips) in items {
        grouped.entry(key).or_default().push(pips);
    }
    grouped
        .into_iter()
        .map(|(k, pips)| (k, Breakdown::from_pips(&pips)))
        .collect()
}

/// Everything measured when a config is replayed over a trade set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayOutcome {
    pub config: WeightConfig,
    /// Trades offered to the filter.
    pub offered: usize,
    /// Metrics on raw pips of qualifying trades.
    pub metrics: PerformanceMetrics,
    /// Metrics with each trade's pips scaled by its position multiplier.
    pub weighted_metrics: PerformanceMetrics,
    pub by_direction: BTreeMap<SignalDirection, Breakdown>,
    pub by_recommendation: BTreeMap<Recommendation, Breakdown>,
}

impl ReplayOutcome {
    pub fn qualifying(&self) -> usize {
        self.metrics.trade_count
    }
}

/// Filter `scored` through `config` and measure the qualifying trades in order.
pub fn replay(scored: &[ScoredTrade], config: &WeightConfig) -> ReplayOutcome {
    let weights = &config.component_weights;
    let mut pips = Vec::new();
    let mut weighted = Vec::new();
    let mut directions = Vec::new();
    let mut tiers = Vec::new();

    for trade in scored {
        let total = trade.total_weight(weights);
        if !config.qualifies(trade.ml_confidence, total) {
            continue;
        }
        pips.push(trade.pips);
        weighted.push(trade.pips * position_multiplier(total));
        directions.push((trade.direction, trade.pips));
        tiers.push((Recommendation::from_weight(total), trade.pips));
    }

    ReplayOutcome {
        config: config.clone(),
        offered: scored.len(),
        metrics: PerformanceMetrics::from_pips(&pips),
        weighted_metrics: PerformanceMetrics::from_pips(&weighted),
        by_direction: breakdown_by(directions),
        by_recommendation: breakdown_by(tiers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(conf: f64, dir: SignalDirection, score: f64, pips: f64) -> ScoredTrade {
        ScoredTrade {
            ml_confidence: conf,
            direction: dir,
            components: ComponentScores {
                ml_confidence: score,
                technical_quality: score,
                market_conditions: score,
                mtf_confirmation: score,
                risk_factors: score,
            },
            pips,
        }
    }

    fn sample() -> Vec<ScoredTrade> {
        vec![
            scored(80.0, SignalDirection::Buy, 85.0, 10.0),
            scored(72.0, SignalDirection::Sell, 72.0, -5.0),
            scored(65.0, SignalDirection::Buy, 55.0, 4.0),
            scored(50.0, SignalDirection::Sell, 30.0, -8.0),
        ]
    }

    #[test]
    fn confidence_basis_filters_on_raw_confidence() {
        let cfg = WeightConfig::new(ComponentWeights::default(), 70.0, ThresholdBasis::Confidence);
        let out = replay(&sample(), &cfg);
        assert_eq!(out.offered, 4);
        assert_eq!(out.qualifying(), 2);
        assert!((out.metrics.total_pips - 5.0).abs() < 1e-10);
    }

    #[test]
    fn weight_basis_filters_on_total_weight() {
        let cfg = WeightConfig::new(ComponentWeights::default(), 50.0, ThresholdBasis::Weight);
        let out = replay(&sample(), &cfg);
        assert_eq!(out.qualifying(), 3);
    }

    #[test]
    fn position_weighting_scales_pips() {
        let cfg = WeightConfig::new(ComponentWeights::default(), 80.0, ThresholdBasis::Weight);
        let out = replay(&sample(), &cfg);
        // single trade at weight 85 → multiplier 2.0
        assert_eq!(out.qualifying(), 1);
        assert!((out.weighted_metrics.total_pips - 20.0).abs() < 1e-10);
    }

    #[test]
    fn breakdowns_by_direction_and_tier() {
        let cfg = WeightConfig::new(ComponentWeights::default(), 0.0, ThresholdBasis::Weight);
        let out = replay(&sample(), &cfg);

        let buy = &out.by_direction[&SignalDirection::Buy];
        assert_eq!(buy.count, 2);
        assert!((buy.win_rate - 100.0).abs() < 1e-10);
        let sell = &out.by_direction[&SignalDirection::Sell];
        assert!((sell.avg_pips + 6.5).abs() < 1e-10);

        assert_eq!(out.by_recommendation[&Recommendation::StrongBuy].count, 1);
        assert_eq!(out.by_recommendation[&Recommendation::Avoid].count, 1);
    }

    #[test]
    fn empty_qualifying_set_is_all_zero_metrics() {
        let cfg = WeightConfig::new(ComponentWeights::default(), 100.0, ThresholdBasis::Confidence);
        let out = replay(&sample(), &cfg);
        assert_eq!(out.metrics, PerformanceMetrics::default());
        assert!(out.by_direction.is_empty());
    }
}
