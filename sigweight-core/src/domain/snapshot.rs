//! IndicatorSnapshot — one candle plus its precomputed indicators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::timeframe::Timeframe;

/// OHLCV candle for one symbol/timeframe/timestamp with optional indicators.
///
/// Produced by the external indicator collaborator and consumed read-only.
/// OHLC close is always required; every indicator is optional. A missing (or
/// non-finite) indicator contributes 0 to its score: the scorer skips that
/// adjustment rather than substituting a default value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    #[serde(default, alias = "granularity")]
    pub timeframe: Option<Timeframe>,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,

    // ── OHLCV ──
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,

    // ── Trend / momentum ──
    #[serde(default)]
    pub rsi: Option<f64>,
    #[serde(default)]
    pub adx: Option<f64>,
    #[serde(default)]
    pub ema12: Option<f64>,
    #[serde(default)]
    pub ema21: Option<f64>,
    #[serde(default)]
    pub ema50: Option<f64>,
    #[serde(default)]
    pub macd_line: Option<f64>,
    #[serde(default)]
    pub macd_signal: Option<f64>,
    #[serde(default)]
    pub stoch_k: Option<f64>,
    #[serde(default)]
    pub stoch_d: Option<f64>,

    // ── Volatility ──
    #[serde(default)]
    pub atr: Option<f64>,
    #[serde(default)]
    pub bollinger_upper: Option<f64>,
    #[serde(default)]
    pub bollinger_lower: Option<f64>,

    // ── Derived ──
    #[serde(default)]
    pub volume_ma: Option<f64>,
    #[serde(default)]
    pub price_change_pct: Option<f64>,
    #[serde(default)]
    pub volatility: Option<f64>,
}

/// Why a snapshot failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("{symbol}: close must be finite and positive, got {close}")]
    InvalidClose { symbol: String, close: f64 },
    #[error("{symbol}: non-finite OHLC value")]
    NonFiniteOhlc { symbol: String },
    #[error("{symbol}: inconsistent OHLC (open {open}, high {high}, low {low}, close {close})")]
    InconsistentOhlc {
        symbol: String,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

impl IndicatorSnapshot {
    /// Minimal snapshot with OHLC only; indicators are left absent.
    pub fn from_ohlc(
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            open,
            high,
            low,
            close,
            ..Self::default()
        }
    }

    /// Check the OHLC invariant: high ≥ {open, close, low}, low ≤ {open, close, high},
    /// and close is a finite positive price.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if !self.close.is_finite() || self.close <= 0.0 {
            return Err(SnapshotError::InvalidClose {
                symbol: self.symbol.clone(),
                close: self.close,
            });
        }
        if ![self.open, self.high, self.low].iter().all(|v| v.is_finite()) {
            return Err(SnapshotError::NonFiniteOhlc {
                symbol: self.symbol.clone(),
            });
        }
        let sane = self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close;
        if !sane {
            return Err(SnapshotError::InconsistentOhlc {
                symbol: self.symbol.clone(),
                open: self.open,
                high: self.high,
                low: self.low,
                close: self.close,
            });
        }
        Ok(())
    }

    /// Candle range as a percentage of close: (high − low) / close × 100.
    ///
    /// `None` when any of high, low, close is missing (zero), non-finite, or
    /// when close is not positive.
    pub fn range_pct(&self) -> Option<f64> {
        let (high, low, close) = (self.high, self.low, self.close);
        if !(high.is_finite() && low.is_finite() && close.is_finite()) {
            return None;
        }
        if high == 0.0 || low == 0.0 || close <= 0.0 {
            return None;
        }
        Some((high - low) / close * 100.0)
    }

    /// EMA12 vs EMA21 trend: `Some(true)` bullish, `Some(false)` bearish or flat.
    pub fn ema_bullish(&self) -> Option<bool> {
        match (finite(self.ema12), finite(self.ema21)) {
            (Some(fast), Some(slow)) => Some(fast > slow),
            _ => None,
        }
    }
}

pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
