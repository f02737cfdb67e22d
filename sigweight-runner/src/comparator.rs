//! Backtest comparator — replay a candidate and a baseline config over the same trades.

use serde::{Deserialize, Serialize};
use sigweight_core::{HistoricalTrade, SignalWeightCalculator, WeightConfig};

use crate::replay::{replay, score_trades, ReplayOutcome, ScoredTrade};
use crate::source::{SourceError, TradeSource};

/// Candidate minus baseline, per metric.
///
/// Positive is better for every field except `max_drawdown_pips`, where a
/// negative delta means the candidate draws down less.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDeltas {
    pub trade_count: i64,
    pub win_rate: f64,
    pub total_pips: f64,
    pub avg_pips: f64,
    pub max_drawdown_pips: f64,
    pub profit_factor: f64,
    pub sharpe: f64,
    pub weighted_total_pips: f64,
}

impl MetricDeltas {
    pub fn between(candidate: &ReplayOutcome, baseline: &ReplayOutcome) -> Self {
        let (c, b) = (&candidate.metrics, &baseline.metrics);
        Self {
            trade_count: c.trade_count as i64 - b.trade_count as i64,
            win_rate: c.win_rate - b.win_rate,
            total_pips: c.total_pips - b.total_pips,
            avg_pips: c.avg_pips - b.avg_pips,
            max_drawdown_pips: c.max_drawdown_pips - b.max_drawdown_pips,
            profit_factor: c.profit_factor - b.profit_factor,
            sharpe: c.sharpe - b.sharpe,
            weighted_total_pips: candidate.weighted_metrics.total_pips
                - baseline.weighted_metrics.total_pips,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub candidate: ReplayOutcome,
    pub baseline: ReplayOutcome,
    pub improvement: MetricDeltas,
}

impl ComparisonReport {
    /// Candidate earns more pips without a worse win rate.
    pub fn candidate_wins(&self) -> bool {
        self.improvement.total_pips > 0.0 && self.improvement.win_rate >= 0.0
    }
}

/// Compare two configs over already-scored trades.
pub fn compare_scored(
    scored: &[ScoredTrade],
    candidate: &WeightConfig,
    baseline: &WeightConfig,
) -> ComparisonReport {
    let candidate = replay(scored, candidate);
    let baseline = replay(scored, baseline);
    let improvement = MetricDeltas::between(&candidate, &baseline);
    tracing::info!(
        candidate_trades = candidate.qualifying(),
        baseline_trades = baseline.qualifying(),
        delta_pips = improvement.total_pips,
        delta_win_rate = improvement.win_rate,
        "comparison complete"
    );
    ComparisonReport {
        candidate,
        baseline,
        improvement,
    }
}

/// Compare two configs over the same historical trades.
pub fn compare(
    calculator: &SignalWeightCalculator,
    trades: &[HistoricalTrade],
    candidate: &WeightConfig,
    baseline: &WeightConfig,
) -> ComparisonReport {
    compare_scored(&score_trades(calculator, trades), candidate, baseline)
}

/// Comparator bound to an injected trade source.
pub struct Comparator<S: TradeSource> {
    source: S,
    calculator: SignalWeightCalculator,
}

impl<S: TradeSource> Comparator<S> {
    pub fn new(source: S, calculator: SignalWeightCalculator) -> Self {
        Self { source, calculator }
    }

    pub fn run(
        &self,
        candidate: &WeightConfig,
        baseline: &WeightConfig,
    ) -> Result<ComparisonReport, SourceError> {
        let trades = self.source.load_trades()?;
        Ok(compare(&self.calculator, &trades, candidate, baseline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemoryTradeSource;
    use sigweight_core::{
        ComponentWeights, IndicatorSnapshot, SignalDirection, SignalInput, ThresholdBasis,
    };

    fn trade(conf: f64, pips: f64) -> HistoricalTrade {
        let signal = SignalInput::new(
            conf,
            SignalDirection::Buy,
            IndicatorSnapshot::from_ohlc("EURUSD", 1.08, 1.081, 1.079, 1.0805),
        );
        if pips > 0.0 {
            HistoricalTrade::win(signal, pips)
        } else {
            HistoricalTrade::loss(signal, -pips)
        }
    }

    fn by_conf(threshold: f64) -> WeightConfig {
        WeightConfig::new(ComponentWeights::default(), threshold, ThresholdBasis::Confidence)
    }

    fn sample() -> Vec<HistoricalTrade> {
        vec![
            trade(85.0, 12.0),
            trade(78.0, 8.0),
            trade(66.0, -10.0),
            trade(62.0, -7.0),
            trade(55.0, 3.0),
        ]
    }

    #[test]
    fn stricter_threshold_improves_this_sample() {
        let report = compare(
            &SignalWeightCalculator::default(),
            &sample(),
            &by_conf(75.0),
            &by_conf(50.0),
        );
        assert_eq!(report.candidate.qualifying(), 2);
        assert_eq!(report.baseline.qualifying(), 5);
        assert_eq!(report.improvement.trade_count, -3);
        assert!((report.improvement.total_pips - 14.0).abs() < 1e-10);
        assert!(report.improvement.win_rate > 0.0);
        assert!(report.improvement.max_drawdown_pips < 0.0);
        assert!(report.candidate_wins());
    }

    #[test]
    fn identical_configs_have_zero_deltas() {
        let report = compare(
            &SignalWeightCalculator::default(),
            &sample(),
            &by_conf(60.0),
            &by_conf(60.0),
        );
        assert_eq!(report.improvement, MetricDeltas::default());
        assert!(!report.candidate_wins());
    }

    #[test]
    fn comparator_loads_from_source() {
        let cmp = Comparator::new(
            InMemoryTradeSource::new(sample()),
            SignalWeightCalculator::default(),
        );
        let report = cmp.run(&by_conf(80.0), &by_conf(0.0)).unwrap();
        assert_eq!(report.candidate.offered, 5);
        assert_eq!(report.candidate.qualifying(), 1);
    }

    #[test]
    fn report_serializes_with_breakdowns() {
        let report = compare(
            &SignalWeightCalculator::default(),
            &sample(),
            &by_conf(50.0),
            &by_conf(70.0),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["candidate"]["by_direction"]["BUY"]["count"], 5);
        assert!(json["improvement"]["weighted_total_pips"].is_number());
    }
}
