//! Sigweight Core — domain types, component scorers, weight aggregation, config store.
//!
//! This crate contains the decision logic that turns an already-directed
//! signal into a single 0–100 weight:
//! - Domain types (indicator snapshots, timeframes, signals, historical trades)
//! - Five pure component scorers with neutral fallbacks
//! - Weight aggregation into a recommendation tier and position multiplier
//! - Weight configs with validation and content fingerprints
//! - The active-config store, the only stateful interface

pub mod config;
pub mod domain;
pub mod scoring;
pub mod store;
pub mod weight;

pub use config::{ComponentWeights, ConfigError, ConfigId, ThresholdBasis, WeightConfig};
pub use domain::{
    HistoricalTrade, IndicatorSnapshot, RiskMetrics, SignalDirection, SignalInput, SnapshotError,
    Timeframe, TimeframeSignal, TradeOutcome,
};
pub use scoring::SymbolRiskTiers;
pub use store::{
    ConfigStatus, ConfigStore, InMemoryConfigStore, JsonFileConfigStore, StoreError, StoredConfig,
};
pub use weight::{
    position_multiplier, ComponentScores, Recommendation, SignalPayload, SignalWeightCalculator,
    WeightResult,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: types shared with the runner's rayon workers are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<IndicatorSnapshot>();
        require_sync::<IndicatorSnapshot>();
        require_send::<SignalInput>();
        require_sync::<SignalInput>();
        require_send::<HistoricalTrade>();
        require_sync::<HistoricalTrade>();

        require_send::<WeightConfig>();
        require_sync::<WeightConfig>();
        require_send::<ComponentWeights>();
        require_sync::<ComponentWeights>();
        require_send::<WeightResult>();
        require_sync::<WeightResult>();
        require_send::<SignalWeightCalculator>();
        require_sync::<SignalWeightCalculator>();

        require_send::<InMemoryConfigStore>();
        require_sync::<InMemoryConfigStore>();
        require_send::<JsonFileConfigStore>();
        require_sync::<JsonFileConfigStore>();
    }

    /// The store trait is object-safe so callers can inject either backend.
    #[test]
    fn config_store_is_object_safe() {
        let store: Box<dyn ConfigStore> = Box::new(InMemoryConfigStore::new());
        assert_eq!(store.get_active_config().unwrap(), WeightConfig::default());
    }
}
