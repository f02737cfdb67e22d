//! Chart timeframes (granularities) a snapshot or signal was computed on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle granularity.
///
/// Variants are declared shortest to longest, so `Ord` orders by duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 7] = [
        Self::M1,
        Self::M5,
        Self::M15,
        Self::M30,
        Self::H1,
        Self::H4,
        Self::D1,
    ];

    /// The two timeframes whose agreement earns the multi-timeframe bonus.
    pub fn is_higher_order(&self) -> bool {
        matches!(self, Self::H4 | Self::H1)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::M30 => "M30",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown timeframe: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ord_is_shortest_to_longest() {
        for pair in Timeframe::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn higher_order_is_h1_and_h4_only() {
        let higher: Vec<_> = Timeframe::ALL
            .iter()
            .filter(|tf| tf.is_higher_order())
            .collect();
        assert_eq!(higher, vec![&Timeframe::H1, &Timeframe::H4]);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("m15".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert_eq!(" H4 ".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert!("W1".parse::<Timeframe>().is_err());
    }

    #[test]
    fn serializes_as_granularity_code() {
        assert_eq!(serde_json::to_string(&Timeframe::M15).unwrap(), "\"M15\"");
        let tf: Timeframe = serde_json::from_str("\"H1\"").unwrap();
        assert_eq!(tf, Timeframe::H1);
    }
}
