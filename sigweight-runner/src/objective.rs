//! Objective — composite score and single-metric selectors used to rank candidates.

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// Coefficients of the composite objective.
///
/// `score = win_rate·w + avg_pips·a + sharpe·s + min(profit_factor, cap)·p`
/// with win rate in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub win_rate: f64,
    pub avg_pips: f64,
    pub sharpe: f64,
    pub profit_factor: f64,
    pub profit_factor_cap: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            win_rate: 0.4,
            avg_pips: 0.3,
            sharpe: 5.0,
            profit_factor: 2.0,
            profit_factor_cap: 10.0,
        }
    }
}

impl ObjectiveWeights {
    pub fn composite(&self, m: &PerformanceMetrics) -> f64 {
        m.win_rate * self.win_rate
            + m.avg_pips * self.avg_pips
            + m.sharpe * self.sharpe
            + m.profit_factor.min(self.profit_factor_cap) * self.profit_factor
    }
}

/// Which value to maximize when ranking candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKind {
    #[default]
    Composite,
    WinRate,
    TotalPips,
    AvgPips,
    Sharpe,
    ProfitFactor,
}

impl ObjectiveKind {
    /// Extract the score for this objective.
    pub fn extract(&self, metrics: &PerformanceMetrics, weights: &ObjectiveWeights) -> f64 {
        match self {
            Self::Composite => weights.composite(metrics),
            Self::WinRate => metrics.win_rate,
            Self::TotalPips => metrics.total_pips,
            Self::AvgPips => metrics.avg_pips,
            Self::Sharpe => metrics.sharpe,
            Self::ProfitFactor => metrics.profit_factor,
        }
    }

    /// Strict improvement. Ties keep the incumbent.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        a > b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> PerformanceMetrics {
        PerformanceMetrics {
            trade_count: 40,
            wins: 24,
            losses: 16,
            win_rate: 60.0,
            total_pips: 200.0,
            avg_pips: 5.0,
            sharpe: 0.5,
            max_drawdown_pips: 30.0,
            profit_factor: 1.8,
            max_consecutive_wins: 4,
            max_consecutive_losses: 3,
        }
    }

    #[test]
    fn default_composite_matches_documented_formula() {
        let m = sample_metrics();
        let expected = 60.0 * 0.4 + 5.0 * 0.3 + 0.5 * 5.0 + 1.8 * 2.0;
        assert!((ObjectiveWeights::default().composite(&m) - expected).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_is_capped() {
        let mut m = sample_metrics();
        m.profit_factor = 999.0;
        let w = ObjectiveWeights::default();
        let capped = 60.0 * 0.4 + 5.0 * 0.3 + 0.5 * 5.0 + 10.0 * 2.0;
        assert!((w.composite(&m) - capped).abs() < 1e-10);
    }

    #[test]
    fn coefficients_are_overridable() {
        let w = ObjectiveWeights {
            win_rate: 1.0,
            avg_pips: 0.0,
            sharpe: 0.0,
            profit_factor: 0.0,
            profit_factor_cap: 10.0,
        };
        assert_eq!(w.composite(&sample_metrics()), 60.0);
    }

    #[test]
    fn extract_single_metrics() {
        let m = sample_metrics();
        let w = ObjectiveWeights::default();
        assert_eq!(ObjectiveKind::TotalPips.extract(&m, &w), 200.0);
        assert_eq!(ObjectiveKind::Sharpe.extract(&m, &w), 0.5);
    }

    #[test]
    fn ties_are_not_better() {
        assert!(!ObjectiveKind::Composite.is_better(1.0, 1.0));
        assert!(ObjectiveKind::Composite.is_better(1.1, 1.0));
    }

    #[test]
    fn partial_table_fills_defaults() {
        let w: ObjectiveWeights = serde_json::from_str(r#"{"sharpe": 3.0}"#).unwrap();
        assert_eq!(w.sharpe, 3.0);
        assert_eq!(w.win_rate, 0.4);
    }
}
