//! Component scorers — five pure functions, each mapping part of a signal's
//! context to a 0–100 sub-score.
//!
//! Every scorer starts from (or falls back to) the neutral baseline of 50 and
//! clamps its output to [0, 100]. A missing input never fails a scorer; it is
//! logged at debug level and the affected adjustment is skipped.

pub mod market;
pub mod ml;
pub mod mtf;
pub mod risk;
pub mod technical;

pub use market::score_market_conditions;
pub use ml::score_ml_confidence;
pub use mtf::score_mtf_confirmation;
pub use risk::{score_risk_factors, SymbolRiskTiers};
pub use technical::score_technical_quality;

/// Score used whenever a scorer has nothing to say.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Clamp to the [0, 100] score range. NaN maps to neutral.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return NEUTRAL_SCORE;
    }
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(120.0), 100.0);
        assert_eq!(clamp_score(f64::INFINITY), 100.0);
        assert_eq!(clamp_score(42.0), 42.0);
    }

    #[test]
    fn clamp_nan_is_neutral() {
        assert_eq!(clamp_score(f64::NAN), NEUTRAL_SCORE);
    }
}
