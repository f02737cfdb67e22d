//! HistoricalTrade — a past directed signal with its realized outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::{SignalDirection, SignalInput};

/// Realized outcome of a historical trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeOutcome {
    Win,
    Loss,
}

/// Append-only record of a labeled signal and what it earned.
///
/// The signal fields are flattened so the wire shape is
/// `{direction, snapshot, ml_confidence, ..., outcome, win_pips | loss_pips}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTrade {
    #[serde(flatten)]
    pub signal: SignalInput,
    #[serde(alias = "trade_outcome")]
    pub outcome: TradeOutcome,
    #[serde(default)]
    pub win_pips: Option<f64>,
    #[serde(default)]
    pub loss_pips: Option<f64>,
}

impl HistoricalTrade {
    pub fn win(signal: SignalInput, pips: f64) -> Self {
        Self {
            signal,
            outcome: TradeOutcome::Win,
            win_pips: Some(pips),
            loss_pips: None,
        }
    }

    pub fn loss(signal: SignalInput, pips: f64) -> Self {
        Self {
            signal,
            outcome: TradeOutcome::Loss,
            win_pips: None,
            loss_pips: Some(pips),
        }
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == TradeOutcome::Win
    }

    /// Signed pip result: +win_pips for a win, −|loss_pips| for a loss.
    ///
    /// A missing or non-finite pip field counts as zero.
    pub fn pips(&self) -> f64 {
        match self.outcome {
            TradeOutcome::Win => self.win_pips.filter(|p| p.is_finite()).unwrap_or(0.0),
            TradeOutcome::Loss => -self
                .loss_pips
                .filter(|p| p.is_finite())
                .unwrap_or(0.0)
                .abs(),
        }
    }

    pub fn ml_confidence(&self) -> f64 {
        self.signal.ml_confidence
    }

    pub fn direction(&self) -> SignalDirection {
        self.signal.direction
    }

    pub fn symbol(&self) -> &str {
        &self.signal.snapshot.symbol
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.signal.snapshot.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndicatorSnapshot;

    fn sample_signal() -> SignalInput {
        SignalInput::new(
            72.0,
            SignalDirection::Buy,
            IndicatorSnapshot::from_ohlc("EURUSD", 1.0850, 1.0865, 1.0845, 1.0860),
        )
    }

    #[test]
    fn win_pips_are_positive() {
        let trade = HistoricalTrade::win(sample_signal(), 12.5);
        assert!(trade.is_winner());
        assert_eq!(trade.pips(), 12.5);
    }

    #[test]
    fn loss_pips_are_negative_regardless_of_sign_convention() {
        assert_eq!(HistoricalTrade::loss(sample_signal(), 8.0).pips(), -8.0);
        assert_eq!(HistoricalTrade::loss(sample_signal(), -8.0).pips(), -8.0);
    }

    #[test]
    fn missing_pips_count_as_zero() {
        let mut trade = HistoricalTrade::win(sample_signal(), 1.0);
        trade.win_pips = None;
        assert_eq!(trade.pips(), 0.0);
    }

    #[test]
    fn flattened_wire_shape() {
        let json = r#"{
            "ml_confidence": 72,
            "direction": "SELL",
            "snapshot": {"symbol":"USDCAD","open":1.36,"high":1.37,"low":1.35,"close":1.355},
            "trade_outcome": "LOSS",
            "loss_pips": 9.5
        }"#;
        let trade: HistoricalTrade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.direction(), SignalDirection::Sell);
        assert_eq!(trade.symbol(), "USDCAD");
        assert_eq!(trade.pips(), -9.5);

        let back = serde_json::to_value(&trade).unwrap();
        assert_eq!(back["outcome"], "LOSS");
        assert_eq!(back["ml_confidence"], 72.0);
    }
}
