//! Risk factors: symbol tier, account drawdown, per-symbol win rate.

use serde::{Deserialize, Serialize};

use super::{clamp_score, NEUTRAL_SCORE};
use crate::domain::snapshot::finite;
use crate::domain::RiskMetrics;

/// Allow-lists of symbols by volatility tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRiskTiers {
    pub stable: Vec<String>,
    pub volatile: Vec<String>,
}

impl Default for SymbolRiskTiers {
    fn default() -> Self {
        Self {
            stable: vec!["EURUSD".into(), "USDCAD".into()],
            volatile: vec!["XAUUSD".into(), "GBPUSD".into()],
        }
    }
}

impl SymbolRiskTiers {
    pub fn is_stable(&self, symbol: &str) -> bool {
        self.stable.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }

    pub fn is_volatile(&self, symbol: &str) -> bool {
        self.volatile.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

/// Score the risk context of trading `symbol` now.
///
/// Starting from 50: stable symbol +20, volatile symbol +5; drawdown > 10%
/// −20, > 5% −10; symbol win rate > 60% +15, < 40% −15. Absent drawdown is
/// treated as 0 and absent win rate as 50.
pub fn score_risk_factors(symbol: &str, risk: &RiskMetrics, tiers: &SymbolRiskTiers) -> f64 {
    let mut score = NEUTRAL_SCORE;

    if tiers.is_stable(symbol) {
        score += 20.0;
    } else if tiers.is_volatile(symbol) {
        score += 5.0;
    }

    let drawdown = finite(risk.current_drawdown_pct).unwrap_or(0.0);
    if drawdown > 10.0 {
        score -= 20.0;
    } else if drawdown > 5.0 {
        score -= 10.0;
    }

    let win_rate = finite(risk.symbol_win_rate).unwrap_or(50.0);
    if win_rate > 60.0 {
        score += 15.0;
    } else if win_rate < 40.0 {
        score -= 15.0;
    }

    clamp_score(score)
}
