//! Market conditions: candle-range volatility and timeframe liquidity.

use super::{clamp_score, NEUTRAL_SCORE};
use crate::domain::{IndicatorSnapshot, Timeframe};

/// Score how favourable the market is to trade, independent of direction.
///
/// Starting from 50, candle range as a percent of close:
/// - 0.05–0.15% → +20 (optimal)
/// - 0.03–0.20% → +10
/// - > 0.30% → −15 (too volatile)
/// - < 0.02% → −10 (too tight)
///
/// Timeframe liquidity: M5/M15/H1 → +15, H4 → +10, M1 → −5, others 0.
pub fn score_market_conditions(snapshot: &IndicatorSnapshot) -> f64 {
    let mut score = NEUTRAL_SCORE;

    match snapshot.range_pct() {
        Some(pct) => score += volatility_adjustment(pct),
        None => tracing::debug!(
            symbol = %snapshot.symbol,
            "candle range unavailable, skipping volatility"
        ),
    }

    match snapshot.timeframe {
        Some(tf) => score += timeframe_adjustment(tf),
        None => tracing::debug!(symbol = %snapshot.symbol, "timeframe missing, skipping liquidity"),
    }

    clamp_score(score)
}

fn volatility_adjustment(pct: f64) -> f64 {
    if (0.05..=0.15).contains(&pct) {
        20.0
    } else if (0.03..=0.20).contains(&pct) {
        10.0
    } else if pct > 0.30 {
        -15.0
    } else if pct < 0.02 {
        -10.0
    } else {
        0.0
    }
}

fn timeframe_adjustment(tf: Timeframe) -> f64 {
    match tf {
        Timeframe::M5 | Timeframe::M15 | Timeframe::H1 => 15.0,
        Timeframe::H4 => 10.0,
        Timeframe::M1 => -5.0,
        Timeframe::M30 | Timeframe::D1 => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Snapshot with close = 100 so range in price units equals range percent.
    fn with_range(range_pct: f64, timeframe: Option<Timeframe>) -> IndicatorSnapshot {
        let close = 100.0;
        IndicatorSnapshot {
            timeframe,
            ..IndicatorSnapshot::from_ohlc("EURUSD", close, close + range_pct, close, close)
        }
    }

    #[test]
    fn optimal_range_on_liquid_timeframe() {
        let snap = with_range(0.10, Some(Timeframe::M15));
        assert_eq!(score_market_conditions(&snap), 85.0);
    }

    #[test]
    fn acceptable_range_bands() {
        assert_eq!(score_market_conditions(&with_range(0.04, None)), 60.0);
        assert_eq!(score_market_conditions(&with_range(0.18, None)), 60.0);
    }

    #[test]
    fn dead_zone_between_bands_is_neutral() {
        assert_eq!(score_market_conditions(&with_range(0.25, None)), NEUTRAL_SCORE);
        assert_eq!(score_market_conditions(&with_range(0.025, None)), NEUTRAL_SCORE);
    }

    #[test]
    fn too_volatile_and_too_tight() {
        assert_eq!(score_market_conditions(&with_range(0.5, None)), 35.0);
        assert_eq!(score_market_conditions(&with_range(0.0, None)), 40.0);
    }

    #[test]
    fn timeframe_adjustments() {
        let base = |tf| score_market_conditions(&with_range(0.25, Some(tf)));
        assert_eq!(base(Timeframe::M1), 45.0);
        assert_eq!(base(Timeframe::M5), 65.0);
        assert_eq!(base(Timeframe::H1), 65.0);
        assert_eq!(base(Timeframe::H4), 60.0);
        assert_eq!(base(Timeframe::D1), 50.0);
    }

    #[test]
    fn missing_close_skips_volatility() {
        let mut snap = with_range(0.10, Some(Timeframe::M15));
        snap.close = 0.0;
        assert_eq!(score_market_conditions(&snap), 65.0);
    }
}
