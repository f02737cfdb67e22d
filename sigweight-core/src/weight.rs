//! Weight aggregation — blend the five component scores into one 0–100 weight.
//!
//! `SignalWeightCalculator::calculate_weight` is pure and deterministic: it
//! scores the components, forms the weighted sum under the given component
//! weights, and derives the recommendation tier and position multiplier from
//! fixed step functions of the total.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ComponentWeights;
use crate::domain::{SignalDirection, SignalInput};
use crate::scoring::{
    score_market_conditions, score_ml_confidence, score_mtf_confirmation, score_risk_factors,
    score_technical_quality, SymbolRiskTiers,
};

/// The five component sub-scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub ml_confidence: f64,
    pub technical_quality: f64,
    pub market_conditions: f64,
    pub mtf_confirmation: f64,
    pub risk_factors: f64,
}

impl ComponentScores {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.ml_confidence,
            self.technical_quality,
            self.market_conditions,
            self.mtf_confirmation,
            self.risk_factors,
        ]
    }

    /// Weighted sum of the scores. Stays in [0, 100] for simplex weights.
    pub fn weighted_total(&self, weights: &ComponentWeights) -> f64 {
        self.as_array()
            .iter()
            .zip(weights.as_array())
            .map(|(score, w)| score * w)
            .sum()
    }

    fn rounded(&self) -> Self {
        Self {
            ml_confidence: round2(self.ml_confidence),
            technical_quality: round2(self.technical_quality),
            market_conditions: round2(self.market_conditions),
            mtf_confirmation: round2(self.mtf_confirmation),
            risk_factors: round2(self.risk_factors),
        }
    }
}

/// Discretized signal strength, ordered AVOID < WEAK < BUY < STRONG_BUY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Avoid,
    Weak,
    Buy,
    StrongBuy,
}

impl Recommendation {
    pub const ALL: [Recommendation; 4] = [Self::Avoid, Self::Weak, Self::Buy, Self::StrongBuy];

    /// ≥ 75 → STRONG_BUY, ≥ 60 → BUY, ≥ 40 → WEAK, else AVOID.
    pub fn from_weight(total_weight: f64) -> Self {
        if total_weight >= 75.0 {
            Self::StrongBuy
        } else if total_weight >= 60.0 {
            Self::Buy
        } else if total_weight >= 40.0 {
            Self::Weak
        } else {
            Self::Avoid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avoid => "AVOID",
            Self::Weak => "WEAK",
            Self::Buy => "BUY",
            Self::StrongBuy => "STRONG_BUY",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position-size scaling, a non-decreasing step function of total weight.
///
/// ≥ 80 → 2.0, ≥ 70 → 1.5, ≥ 60 → 1.0, ≥ 50 → 0.75, ≥ 40 → 0.5, else 0.25.
pub fn position_multiplier(total_weight: f64) -> f64 {
    if total_weight >= 80.0 {
        2.0
    } else if total_weight >= 70.0 {
        1.5
    } else if total_weight >= 60.0 {
        1.0
    } else if total_weight >= 50.0 {
        0.75
    } else if total_weight >= 40.0 {
        0.5
    } else {
        0.25
    }
}

/// Output of the aggregator. Recomputed on demand, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightResult {
    pub total_weight: f64,
    pub components: ComponentScores,
    pub recommendation: Recommendation,
    pub position_size_multiplier: f64,
}

impl WeightResult {
    /// Build the tier and multiplier from a total weight.
    pub fn from_components(components: ComponentScores, weights: &ComponentWeights) -> Self {
        let total_weight = components.weighted_total(weights);
        Self {
            total_weight,
            components,
            recommendation: Recommendation::from_weight(total_weight),
            position_size_multiplier: position_multiplier(total_weight),
        }
    }

    /// Record handed to the signal-publishing collaborator.
    ///
    /// Scores are rounded to two decimals here only.
    pub fn to_signal_payload(
        &self,
        direction: SignalDirection,
        ml_confidence: f64,
    ) -> SignalPayload {
        SignalPayload {
            direction,
            ml_confidence,
            signal_weight: round2(self.total_weight),
            recommendation: self.recommendation,
            position_multiplier: self.position_size_multiplier,
            components: self.components.rounded(),
        }
    }
}

/// Published form of a weighted signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPayload {
    pub direction: SignalDirection,
    pub ml_confidence: f64,
    pub signal_weight: f64,
    pub recommendation: Recommendation,
    pub position_multiplier: f64,
    pub components: ComponentScores,
}

/// Stateless calculator; holds only the symbol risk tiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalWeightCalculator {
    pub risk_tiers: SymbolRiskTiers,
}

impl SignalWeightCalculator {
    pub fn new(risk_tiers: SymbolRiskTiers) -> Self {
        Self { risk_tiers }
    }

    /// Compute the five component scores for one signal.
    pub fn score_components(&self, input: &SignalInput) -> ComponentScores {
        ComponentScores {
            ml_confidence: score_ml_confidence(input.ml_confidence),
            technical_quality: score_technical_quality(&input.snapshot, input.direction),
            market_conditions: score_market_conditions(&input.snapshot),
            mtf_confirmation: score_mtf_confirmation(input.direction, &input.mtf_signals),
            risk_factors: score_risk_factors(&input.snapshot.symbol, &input.risk, &self.risk_tiers),
        }
    }

    /// Score, aggregate, and classify one signal.
    pub fn calculate_weight(
        &self,
        input: &SignalInput,
        weights: &ComponentWeights,
    ) -> WeightResult {
        WeightResult::from_components(self.score_components(input), weights)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IndicatorSnapshot, RiskMetrics, Timeframe, TimeframeSignal};

    fn sample_input() -> SignalInput {
        let snapshot = IndicatorSnapshot {
            timeframe: Some(Timeframe::M15),
            rsi: Some(35.0),
            ema12: Some(1.0855),
            ema21: Some(1.0850),
            adx: Some(28.0),
            ..IndicatorSnapshot::from_ohlc("EURUSD", 1.0850, 1.0865, 1.0845, 1.0860)
        };
        SignalInput::new(68.0, SignalDirection::Buy, snapshot)
            .with_mtf_signals(vec![
                TimeframeSignal::new(Timeframe::H1, SignalDirection::Buy),
                TimeframeSignal::new(Timeframe::M5, SignalDirection::Buy),
            ])
            .with_risk(RiskMetrics {
                current_drawdown_pct: Some(3.0),
                symbol_win_rate: Some(58.0),
            })
    }

    #[test]
    fn worked_example() {
        let calc = SignalWeightCalculator::default();
        let result = calc.calculate_weight(&sample_input(), &ComponentWeights::default());

        assert_eq!(result.components.ml_confidence, 67.0);
        // RSI 35 (+10), bullish EMA (+20), ADX 28 (+15)
        assert_eq!(result.components.technical_quality, 95.0);
        // range 0.184% (+10), M15 (+15)
        assert_eq!(result.components.market_conditions, 75.0);
        assert_eq!(result.components.mtf_confirmation, 90.0);
        assert_eq!(result.components.risk_factors, 70.0);

        let expected = 67.0 * 0.30 + 95.0 * 0.25 + 75.0 * 0.20 + 90.0 * 0.15 + 70.0 * 0.10;
        assert!((result.total_weight - expected).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::StrongBuy);
        assert_eq!(result.position_size_multiplier, 1.5);
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let calc = SignalWeightCalculator::default();
        let a = calc.calculate_weight(&sample_input(), &ComponentWeights::default());
        let b = calc.calculate_weight(&sample_input(), &ComponentWeights::default());
        assert_eq!(a, b);
    }

    #[test]
    fn tier_scenarios() {
        assert_eq!(Recommendation::from_weight(82.0), Recommendation::StrongBuy);
        assert_eq!(position_multiplier(82.0), 2.0);
        assert_eq!(Recommendation::from_weight(45.0), Recommendation::Weak);
        assert_eq!(position_multiplier(45.0), 0.5);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(Recommendation::from_weight(75.0), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_weight(74.999), Recommendation::Buy);
        assert_eq!(Recommendation::from_weight(60.0), Recommendation::Buy);
        assert_eq!(Recommendation::from_weight(40.0), Recommendation::Weak);
        assert_eq!(Recommendation::from_weight(39.99), Recommendation::Avoid);
        assert_eq!(position_multiplier(0.0), 0.25);
        assert_eq!(position_multiplier(50.0), 0.75);
        assert_eq!(position_multiplier(100.0), 2.0);
    }

    #[test]
    fn recommendation_ordering() {
        assert!(Recommendation::Avoid < Recommendation::Weak);
        assert!(Recommendation::Weak < Recommendation::Buy);
        assert!(Recommendation::Buy < Recommendation::StrongBuy);
    }

    #[test]
    fn weights_shift_total() {
        let calc = SignalWeightCalculator::default();
        let ml_only = ComponentWeights::from_array([1.0, 0.0, 0.0, 0.0, 0.0]);
        let result = calc.calculate_weight(&sample_input(), &ml_only);
        assert_eq!(result.total_weight, 67.0);
        assert_eq!(result.recommendation, Recommendation::Buy);
    }

    #[test]
    fn payload_rounds_and_serializes() {
        let calc = SignalWeightCalculator::default();
        let input = sample_input();
        let result = calc.calculate_weight(&input, &ComponentWeights::default());
        let payload = result.to_signal_payload(input.direction, input.ml_confidence);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["direction"], "BUY");
        assert_eq!(json["recommendation"], "STRONG_BUY");
        assert_eq!(json["signal_weight"], round2(result.total_weight));
        assert_eq!(json["components"]["mtf_confirmation"], 90.0);
    }

    #[test]
    fn missing_everything_still_produces_a_result() {
        let calc = SignalWeightCalculator::default();
        let input = SignalInput::new(
            f64::NAN,
            SignalDirection::Sell,
            IndicatorSnapshot::from_ohlc("AUDNZD", 0.0, 0.0, 0.0, 0.0),
        );
        let result = calc.calculate_weight(&input, &ComponentWeights::default());
        assert!((0.0..=100.0).contains(&result.total_weight));
        assert_eq!(result.components.ml_confidence, 50.0);
    }
}
