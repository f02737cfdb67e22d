//! Domain types for signal weighting

pub mod signal;
pub mod snapshot;
pub mod timeframe;
pub mod trade;

pub use signal::{RiskMetrics, SignalDirection, SignalInput, TimeframeSignal};
pub use snapshot::{IndicatorSnapshot, SnapshotError};
pub use timeframe::Timeframe;
pub use trade::{HistoricalTrade, TradeOutcome};
