//! Out-of-sample holdout — chronological train/test split with no overlap.
//!
//! Trades are ordered by snapshot timestamp (stable, so equal timestamps keep
//! their input order). The earliest trades train, the latest `test_fraction`
//! validate. Optimizing and comparing on the same window leaks information, so
//! the pipeline always goes through this split.

use serde::{Deserialize, Serialize};
use sigweight_core::HistoricalTrade;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HoldoutError {
    #[error("holdout fraction {0} must lie strictly between 0 and 1")]
    InvalidFraction(f64),
    #[error("holdout split of {total} trades leaves an empty side (train {train}, test {test})")]
    EmptySide {
        total: usize,
        train: usize,
        test: usize,
    },
}

/// Train (earlier) and test (later) trade sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldoutSplit {
    pub train: Vec<HistoricalTrade>,
    pub test: Vec<HistoricalTrade>,
}

impl HoldoutSplit {
    /// Split chronologically, holding out the latest `test_fraction` of trades.
    pub fn chronological(
        mut trades: Vec<HistoricalTrade>,
        test_fraction: f64,
    ) -> Result<Self, HoldoutError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(HoldoutError::InvalidFraction(test_fraction));
        }
        let total = trades.len();
        let test_len = (total as f64 * test_fraction).round() as usize;
        let train_len = total.saturating_sub(test_len);
        if test_len == 0 || train_len == 0 {
            return Err(HoldoutError::EmptySide {
                total,
                train: train_len,
                test: test_len,
            });
        }

        trades.sort_by_key(|t| t.timestamp());
        let test = trades.split_off(train_len);
        tracing::debug!(train = trades.len(), test = test.len(), "chronological holdout");
        Ok(Self {
            train: trades,
            test,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use sigweight_core::{IndicatorSnapshot, SignalDirection, SignalInput};

    fn trade_at(minutes: i64) -> HistoricalTrade {
        let snapshot = IndicatorSnapshot {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::minutes(minutes),
            ..IndicatorSnapshot::from_ohlc("EURUSD", 1.08, 1.081, 1.079, 1.0805)
        };
        HistoricalTrade::win(SignalInput::new(70.0, SignalDirection::Buy, snapshot), 5.0)
    }

    #[test]
    fn test_set_is_strictly_later() {
        // Deliberately shuffled input order
        let trades: Vec<_> = [5, 1, 9, 3, 7, 0, 8, 2, 6, 4]
            .into_iter()
            .map(trade_at)
            .collect();
        let split = HoldoutSplit::chronological(trades, 0.3).unwrap();
        assert_eq!(split.train.len(), 7);
        assert_eq!(split.test.len(), 3);

        let last_train = split.train.iter().map(|t| t.timestamp()).max().unwrap();
        let first_test = split.test.iter().map(|t| t.timestamp()).min().unwrap();
        assert!(last_train < first_test);
    }

    #[test]
    fn no_trade_is_lost_or_duplicated() {
        let trades: Vec<_> = (0..37).map(trade_at).collect();
        let split = HoldoutSplit::chronological(trades, 0.25).unwrap();
        assert_eq!(split.train.len() + split.test.len(), 37);
    }

    #[test]
    fn empty_side_is_an_error() {
        let err = HoldoutSplit::chronological(vec![trade_at(0)], 0.3).unwrap_err();
        assert!(matches!(err, HoldoutError::EmptySide { total: 1, .. }));
        assert!(HoldoutSplit::chronological(Vec::new(), 0.5).is_err());
    }

    #[test]
    fn fraction_must_be_open_interval() {
        let trades: Vec<_> = (0..10).map(trade_at).collect();
        assert_eq!(
            HoldoutSplit::chronological(trades.clone(), 0.0).unwrap_err(),
            HoldoutError::InvalidFraction(0.0)
        );
        assert!(HoldoutSplit::chronological(trades, 1.0).is_err());
    }
}
