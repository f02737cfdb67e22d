//! Multi-timeframe confirmation.

use super::{clamp_score, NEUTRAL_SCORE};
use crate::domain::{SignalDirection, TimeframeSignal};

/// Points per agreeing timeframe.
const AGREE_POINTS: f64 = 15.0;
/// Points lost per disagreeing timeframe.
const DISAGREE_POINTS: f64 = 10.0;
/// One-off bonus when H4 or H1 agrees.
const HIGHER_ORDER_BONUS: f64 = 10.0;

/// Score agreement between `direction` and signals from other timeframes.
///
/// Neutral (50) when no other timeframe is available. Otherwise +15 per
/// agreeing timeframe, −10 per disagreeing one, and +10 once if either H4 or
/// H1 agrees.
pub fn score_mtf_confirmation(direction: SignalDirection, signals: &[TimeframeSignal]) -> f64 {
    if signals.is_empty() {
        return NEUTRAL_SCORE;
    }

    let agreements = signals.iter().filter(|s| s.direction == direction).count();
    let disagreements = signals.len() - agreements;

    let mut score = NEUTRAL_SCORE;
    score += agreements as f64 * AGREE_POINTS;
    score -= disagreements as f64 * DISAGREE_POINTS;

    let higher_order_agrees = signals.iter().any(|s| {
        s.direction == direction && s.timeframe.is_some_and(|tf| tf.is_higher_order())
    });
    if higher_order_agrees {
        score += HIGHER_ORDER_BONUS;
    }

    clamp_score(score)
}
