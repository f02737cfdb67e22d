//! Directed signals and the context they are scored in.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::snapshot::IndicatorSnapshot;
use super::timeframe::Timeframe;

/// Direction of a signal, as produced by the upstream classifier.
///
/// The core never generates directions; it scores an already-directed signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
}

impl SignalDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for SignalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal computed independently on another timeframe for the same symbol.
///
/// Only the direction is scored; extra fields such as `label_confidence` are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSignal {
    #[serde(default, alias = "granularity")]
    pub timeframe: Option<Timeframe>,
    #[serde(alias = "label")]
    pub direction: SignalDirection,
}

impl TimeframeSignal {
    pub fn new(timeframe: Timeframe, direction: SignalDirection) -> Self {
        Self {
            timeframe: Some(timeframe),
            direction,
        }
    }
}

/// Account- and symbol-level risk context. Absent fields are neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Current account drawdown in percent (absent → 0).
    #[serde(default)]
    pub current_drawdown_pct: Option<f64>,
    /// Historical win rate on this symbol in percent (absent → 50).
    #[serde(default)]
    pub symbol_win_rate: Option<f64>,
}

/// Everything needed to weight one directed signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalInput {
    /// Model-reported confidence, 0–100.
    pub ml_confidence: f64,
    pub direction: SignalDirection,
    pub snapshot: IndicatorSnapshot,
    #[serde(default, alias = "multi_tf_signals")]
    pub mtf_signals: Vec<TimeframeSignal>,
    #[serde(default, alias = "risk_metrics")]
    pub risk: RiskMetrics,
}

impl SignalInput {
    pub fn new(
        ml_confidence: f64,
        direction: SignalDirection,
        snapshot: IndicatorSnapshot,
    ) -> Self {
        Self {
            ml_confidence,
            direction,
            snapshot,
            mtf_signals: Vec::new(),
            risk: RiskMetrics::default(),
        }
    }

    pub fn with_mtf_signals(mut self, signals: Vec<TimeframeSignal>) -> Self {
        self.mtf_signals = signals;
        self
    }

    pub fn with_risk(mut self, risk: RiskMetrics) -> Self {
        self.risk = risk;
        self
    }
}
