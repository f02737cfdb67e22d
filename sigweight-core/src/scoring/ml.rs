//! ML confidence remap.

use super::{clamp_score, NEUTRAL_SCORE};

/// Piecewise-linear remap of raw model confidence (0–100).
///
/// | confidence | score                     |
/// |------------|---------------------------|
/// | [0, 50)    | x × 0.8                   |
/// | [50, 70)   | 40 + (x − 50) × 1.5       |
/// | [70, 85)   | 70 + (x − 70) × 1.33      |
/// | [85, 100]  | 90 + (x − 85) × 0.67      |
///
/// Input is clamped to [0, 100] first; a non-finite input scores neutral.
pub fn score_ml_confidence(confidence: f64) -> f64 {
    if !confidence.is_finite() {
        tracing::debug!(confidence, "non-finite ML confidence, using neutral score");
        return NEUTRAL_SCORE;
    }
    let x = confidence.clamp(0.0, 100.0);
    let score = if x < 50.0 {
        x * 0.8
    } else if x < 70.0 {
        40.0 + (x - 50.0) * 1.5
    } else if x < 85.0 {
        70.0 + (x - 70.0) * 1.33
    } else {
        90.0 + (x - 85.0) * 0.67
    };
    clamp_score(score)
}
