//! Technical quality: RSI alignment, EMA trend alignment, ADX strength.

use super::{clamp_score, NEUTRAL_SCORE};
use crate::domain::snapshot::finite;
use crate::domain::{IndicatorSnapshot, SignalDirection};

/// Score how well the snapshot's indicators support `direction`.
///
/// Starting from 50:
/// - RSI (±15): BUY favours oversold (< 30 → +15, < 50 → +10, > 70 → −15);
///   SELL mirrors it (> 70 → +15, > 50 → +10, < 30 → −15).
/// - EMA12 vs EMA21 (+20 / −10): with-trend earns 20, counter-trend loses 10.
/// - ADX: > 25 → +15, > 20 → +10, < 15 → −10.
///
/// HOLD has no direction to align with, so only ADX applies. An absent or
/// non-finite indicator contributes 0.
pub fn score_technical_quality(snapshot: &IndicatorSnapshot, direction: SignalDirection) -> f64 {
    let mut score = NEUTRAL_SCORE;

    match finite(snapshot.rsi) {
        Some(rsi) => score += rsi_adjustment(rsi, direction),
        None => tracing::debug!(symbol = %snapshot.symbol, "rsi missing, skipping RSI alignment"),
    }

    match snapshot.ema_bullish() {
        Some(bullish) => score += ema_adjustment(bullish, direction),
        None => tracing::debug!(
            symbol = %snapshot.symbol,
            "ema12/ema21 missing, skipping trend alignment"
        ),
    }

    match finite(snapshot.adx) {
        Some(adx) => score += adx_adjustment(adx),
        None => tracing::debug!(symbol = %snapshot.symbol, "adx missing, skipping trend strength"),
    }

    clamp_score(score)
}

fn rsi_adjustment(rsi: f64, direction: SignalDirection) -> f64 {
    match direction {
        SignalDirection::Buy => {
            if rsi < 30.0 {
                15.0
            } else if rsi < 50.0 {
                10.0
            } else if rsi > 70.0 {
                -15.0
            } else {
                0.0
            }
        }
        SignalDirection::Sell => {
            if rsi > 70.0 {
                15.0
            } else if rsi > 50.0 {
                10.0
            } else if rsi < 30.0 {
                -15.0
            } else {
                0.0
            }
        }
        SignalDirection::Hold => 0.0,
    }
}

fn ema_adjustment(bullish: bool, direction: SignalDirection) -> f64 {
    match (direction, bullish) {
        (SignalDirection::Buy, true) | (SignalDirection::Sell, false) => 20.0,
        (SignalDirection::Hold, _) => 0.0,
        _ => -10.0,
    }
}

fn adx_adjustment(adx: f64) -> f64 {
    if adx > 25.0 {
        15.0
    } else if adx > 20.0 {
        10.0
    } else if adx < 15.0 {
        -10.0
    } else {
        0.0
    }
}
