//! Performance metrics — pure functions over a sequence of signed pip results.
//!
//! Every metric is a pure function: pips in, scalar out. Win rate is reported
//! in percent (0–100) because the composite objective's coefficients are
//! calibrated on that scale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Finite stand-in for an infinite profit factor (no losing trades).
pub const PROFIT_FACTOR_SENTINEL: f64 = 999.0;

/// Aggregate statistics for one qualifying trade set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub trade_count: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent, 0–100.
    pub win_rate: f64,
    pub total_pips: f64,
    pub avg_pips: f64,
    pub sharpe: f64,
    /// Peak-to-trough on cumulative pips, non-negative.
    pub max_drawdown_pips: f64,
    pub profit_factor: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    /// Compute all metrics from signed pip results in trade order.
    ///
    /// A trade with strictly positive pips is a win.
    pub fn from_pips(pips: &[f64]) -> Self {
        let wins = pips.iter().filter(|p| **p > 0.0).count();
        let total_pips: f64 = pips.iter().sum();
        Self {
            trade_count: pips.len(),
            wins,
            losses: pips.len() - wins,
            win_rate: win_rate(pips),
            total_pips,
            avg_pips: mean(pips),
            sharpe: sharpe_ratio(pips),
            max_drawdown_pips: max_drawdown(pips),
            profit_factor: profit_factor(pips),
            max_consecutive_wins: max_streak(pips, |p| p > 0.0),
            max_consecutive_losses: max_streak(pips, |p| p <= 0.0),
        }
    }

    /// Flat name → value map, used for store metadata and reports.
    pub fn summary(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("trade_count".to_string(), self.trade_count as f64),
            ("win_rate".to_string(), self.win_rate),
            ("total_pips".to_string(), self.total_pips),
            ("avg_pips".to_string(), self.avg_pips),
            ("sharpe".to_string(), self.sharpe),
            ("max_drawdown_pips".to_string(), self.max_drawdown_pips),
            ("profit_factor".to_string(), self.profit_factor),
        ])
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Percentage of trades with positive pips. 0 for an empty slice.
pub fn win_rate(pips: &[f64]) -> f64 {
    if pips.is_empty() {
        return 0.0;
    }
    pips.iter().filter(|p| **p > 0.0).count() as f64 / pips.len() as f64 * 100.0
}

/// Mean pips per trade over population stdev.
///
/// Returns 0.0 for n ≤ 1 or zero stdev.
pub fn sharpe_ratio(pips: &[f64]) -> f64 {
    if pips.len() <= 1 {
        return 0.0;
    }
    let sd = population_std(pips);
    if sd == 0.0 || !sd.is_finite() {
        return 0.0;
    }
    mean(pips) / sd
}

/// Largest peak-to-trough fall in cumulative pips, as a positive number.
///
/// The running peak starts at zero, so an initial losing run counts.
pub fn max_drawdown(pips: &[f64]) -> f64 {
    let mut cumulative = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut max_dd = 0.0_f64;
    for p in pips {
        cumulative += p;
        peak = peak.max(cumulative);
        max_dd = max_dd.max(peak - cumulative);
    }
    max_dd
}

/// Gross profit / gross loss.
///
/// Zero gross loss gives `PROFIT_FACTOR_SENTINEL` when there is any profit, and
/// 0.0 when there is none.
pub fn profit_factor(pips: &[f64]) -> f64 {
    let gross_profit: f64 = pips.iter().filter(|p| **p > 0.0).sum();
    let gross_loss: f64 = pips.iter().filter(|p| **p < 0.0).map(|p| p.abs()).sum();
    if gross_loss == 0.0 {
        return if gross_profit > 0.0 {
            PROFIT_FACTOR_SENTINEL
        } else {
            0.0
        };
    }
    gross_profit / gross_loss
}

fn max_streak(pips: &[f64], pred: impl Fn(f64) -> bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for p in pips {
        if pred(*p) {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

// ─── Warnings ───────────────────────────────────────────────────────

/// Win rate above this is more likely a lucky sample than an edge.
pub const SUSPICIOUS_WIN_RATE: f64 = 75.0;
/// Win rate below this means the config is not worth deploying.
pub const POOR_WIN_RATE: f64 = 35.0;

/// Human-readable caveats about a chosen result, also emitted as `warn!` events.
///
/// `sample_size` is the number of trades the optimization ran on.
pub fn performance_warnings(
    metrics: &PerformanceMetrics,
    sample_size: usize,
    min_total_trades: usize,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if sample_size < 2 * min_total_trades {
        warnings.push(format!(
            "sample of {sample_size} trades is below the recommended {}",
            2 * min_total_trades
        ));
    }
    if metrics.win_rate > SUSPICIOUS_WIN_RATE {
        warnings.push(format!(
            "win rate {:.1}% is suspiciously high; the sample may be lucky",
            metrics.win_rate
        ));
    }
    if metrics.trade_count > 0 && metrics.win_rate < POOR_WIN_RATE {
        warnings.push(format!("win rate {:.1}% is poor", metrics.win_rate));
    }
    for w in &warnings {
        tracing::warn!("{w}");
    }
    warnings
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
