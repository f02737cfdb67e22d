//! Property tests for optimizer invariants.
//!
//! 1. Qualifying count never rises with the threshold
//! 2. Metrics stay finite for any pip series
//! 3. Sweep picks a candidate whose score no other eligible candidate beats
//! 4. Holdout sides are disjoint, chronological, and cover the input
//! 5. Weight search and the holdout pipeline return a result for any
//!    uniform random history of at least `min_total_trades` trades

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use sigweight_core::{
    ComponentScores, HistoricalTrade, IndicatorSnapshot, SignalDirection, SignalInput,
    WeightConfig,
};
use sigweight_runner::{
    EvolutionSettings, HoldoutSplit, InMemoryTradeSource, OptimizationPipeline,
    OptimizerSettings, PerformanceMetrics, ScoredTrade, SearchMode, ThresholdSweep,
    WeightSearch,
};

fn arb_scored() -> impl Strategy<Value = ScoredTrade> {
    (0.0..=100.0_f64, -30.0..30.0_f64).prop_map(|(conf, pips)| ScoredTrade {
        ml_confidence: conf,
        direction: SignalDirection::Buy,
        components: ComponentScores {
            ml_confidence: conf,
            technical_quality: 50.0,
            market_conditions: 50.0,
            mtf_confirmation: 50.0,
            risk_factors: 50.0,
        },
        pips,
    })
}

fn small_settings() -> OptimizerSettings {
    OptimizerSettings {
        min_total_trades: 20,
        min_trades_per_candidate: 3,
        parallel: false,
        ..OptimizerSettings::default()
    }
}

/// Uniform confidence, fair-coin outcome, hourly timestamps.
fn arb_history(
    len: impl Into<prop::collection::SizeRange>,
) -> impl Strategy<Value = Vec<HistoricalTrade>> {
    let row = (0.0..=100.0_f64, any::<bool>(), 1.0..20.0_f64);
    prop::collection::vec(row, len).prop_map(|rows| {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        rows.into_iter()
            .enumerate()
            .map(|(i, (conf, win, pips))| {
                let mut s = IndicatorSnapshot::from_ohlc("EURUSD", 1.085, 1.086, 1.084, 1.0855);
                s.timestamp = start + Duration::hours(i as i64);
                let signal = SignalInput::new(conf, SignalDirection::Buy, s);
                if win {
                    HistoricalTrade::win(signal, pips)
                } else {
                    HistoricalTrade::loss(signal, pips)
                }
            })
            .collect()
    })
}

/// Default sample-size rules with a short evolution run.
fn search_settings(weight_search_threshold: f64) -> OptimizerSettings {
    OptimizerSettings {
        weight_search_threshold,
        parallel: false,
        evolution: EvolutionSettings {
            population_multiplier: 4,
            max_generations: 5,
            ..EvolutionSettings::default()
        },
        ..OptimizerSettings::default()
    }
}

proptest! {
    #[test]
    fn qualifying_count_is_non_increasing(trades in prop::collection::vec(arb_scored(), 0..200)) {
        let settings = small_settings();
        let sweep = ThresholdSweep::new(&settings);
        let counts: Vec<usize> = settings
            .sorted_thresholds()
            .into_iter()
            .map(|t| sweep.evaluate(&trades, t).qualifying)
            .collect();
        for pair in counts.windows(2) {
            prop_assert!(pair[0] >= pair[1], "{:?}", counts);
        }
    }

    #[test]
    fn metrics_are_finite(pips in prop::collection::vec(-500.0..500.0_f64, 0..300)) {
        let m = PerformanceMetrics::from_pips(&pips);
        prop_assert!(m.win_rate.is_finite() && (0.0..=100.0).contains(&m.win_rate));
        prop_assert!(m.sharpe.is_finite());
        prop_assert!(m.profit_factor.is_finite() && m.profit_factor >= 0.0);
        prop_assert!(m.max_drawdown_pips >= 0.0);
        prop_assert_eq!(m.wins + m.losses, m.trade_count);
    }

    #[test]
    fn sweep_best_is_never_beaten(trades in prop::collection::vec(arb_scored(), 20..200)) {
        let settings = small_settings();
        if let Ok(result) = ThresholdSweep::new(&settings).run(&trades) {
            let best = result.best.score.unwrap_or(f64::NEG_INFINITY);
            for c in result.candidates.iter().filter(|c| c.is_eligible()) {
                let score = c.score.unwrap_or(f64::NEG_INFINITY);
                prop_assert!(score <= best);
                if score == best {
                    prop_assert!(c.threshold >= result.best.threshold);
                }
            }
        }
    }

    #[test]
    fn holdout_is_chronological_partition(
        hours in prop::collection::vec(0i64..10_000, 2..120),
        fraction in 0.1..0.9_f64,
    ) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let trades: Vec<HistoricalTrade> = hours
            .iter()
            .map(|h| {
                let mut s = IndicatorSnapshot::from_ohlc("USDJPY", 150.0, 150.2, 149.8, 150.1);
                s.timestamp = start + Duration::hours(*h);
                HistoricalTrade::win(SignalInput::new(60.0, SignalDirection::Sell, s), 5.0)
            })
            .collect();
        let n = trades.len();
        if let Ok(split) = HoldoutSplit::chronological(trades, fraction) {
            prop_assert_eq!(split.train.len() + split.test.len(), n);
            prop_assert!(!split.train.is_empty() && !split.test.is_empty());
            let last_train = split.train.iter().map(|t| t.timestamp()).max();
            let first_test = split.test.iter().map(|t| t.timestamp()).min();
            prop_assert!(last_train <= first_test);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn weight_search_accepts_the_minimum_sample(
        trades in prop::collection::vec(arb_scored(), 100),
    ) {
        let settings = search_settings(40.0);
        let result = WeightSearch::new(&settings).run(&trades);
        prop_assert!(result.is_ok(), "{:?}", result.as_ref().err());
        let result = result.unwrap();
        prop_assert!(result.config.validate().is_ok());
        prop_assert_eq!(result.sample_size, 100);
        prop_assert!(result.metrics.trade_count >= settings.min_trades_per_candidate);
    }

    #[test]
    fn weight_search_accepts_larger_samples(
        trades in prop::collection::vec(arb_scored(), 100..250),
    ) {
        let settings = search_settings(40.0);
        let result = WeightSearch::new(&settings).run(&trades);
        prop_assert!(result.is_ok(), "{:?}", result.as_ref().err());
        prop_assert_eq!(result.unwrap().sample_size, trades.len());
    }

    #[test]
    fn pipeline_accepts_the_minimum_sample(trades in arb_history(100)) {
        let settings = search_settings(0.0);
        let pipeline =
            OptimizationPipeline::new(InMemoryTradeSource::new(trades), settings).unwrap();
        for mode in [SearchMode::Threshold, SearchMode::Weights] {
            let report = pipeline.run(mode, &WeightConfig::default());
            prop_assert!(report.is_ok(), "{:?}: {:?}", mode, report.as_ref().err());
            let report = report.unwrap();
            prop_assert_eq!(report.train_size + report.test_size, 100);
            prop_assert!(report.candidate.validate().is_ok());
        }
    }

    #[test]
    fn pipeline_accepts_larger_samples(trades in arb_history(100..250)) {
        let n = trades.len();
        let settings = search_settings(0.0);
        let pipeline =
            OptimizationPipeline::new(InMemoryTradeSource::new(trades), settings).unwrap();
        for mode in [SearchMode::Threshold, SearchMode::Weights] {
            let report = pipeline.run(mode, &WeightConfig::default());
            prop_assert!(report.is_ok(), "{:?}: {:?}", mode, report.as_ref().err());
            let report = report.unwrap();
            prop_assert_eq!(report.train_size + report.test_size, n);
        }
    }
}
