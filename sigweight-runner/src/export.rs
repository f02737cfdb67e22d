//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: `OptimizationReport` round-trip with schema versioning
//! - **CSV**: one row per threshold-sweep candidate
//! - **Markdown**: side-by-side candidate vs baseline comparison

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use sigweight_core::{Recommendation, SignalDirection, ThresholdBasis, WeightConfig};

use crate::comparator::ComparisonReport;
use crate::replay::{Breakdown, ReplayOutcome};
use crate::report::{OptimizationReport, REPORT_SCHEMA_VERSION};
use crate::threshold::ThresholdCandidate;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_report_json(report: &OptimizationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize OptimizationReport to JSON")
}

/// Deserialize a report, rejecting unknown schema versions.
pub fn import_report_json(json: &str) -> Result<OptimizationReport> {
    let report: OptimizationReport =
        serde_json::from_str(json).context("failed to deserialize OptimizationReport from JSON")?;
    if report.schema_version > REPORT_SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            REPORT_SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: threshold, qualifying, eligible, score, win_rate, total_pips,
/// avg_pips, sharpe, max_drawdown_pips, profit_factor
pub fn export_threshold_sweep_csv(candidates: &[ThresholdCandidate]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "threshold",
        "qualifying",
        "eligible",
        "score",
        "win_rate",
        "total_pips",
        "avg_pips",
        "sharpe",
        "max_drawdown_pips",
        "profit_factor",
    ])?;

    for c in candidates {
        let m = &c.metrics;
        wtr.write_record([
            &format!("{:.1}", c.threshold),
            &c.qualifying.to_string(),
            &c.is_eligible().to_string(),
            &c.score.map(|s| format!("{s:.4}")).unwrap_or_default(),
            &format!("{:.2}", m.win_rate),
            &format!("{:.2}", m.total_pips),
            &format!("{:.4}", m.avg_pips),
            &format!("{:.4}", m.sharpe),
            &format!("{:.2}", m.max_drawdown_pips),
            &format!("{:.4}", m.profit_factor),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save `report.json`, `comparison.md`, and (for sweeps) `thresholds.csv`
/// into `output_dir/optimization_{timestamp}/`. Returns the created directory.
pub fn save_artifacts(report: &OptimizationReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "optimization_{}",
        report.generated_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_report_json(report)?)?;
    std::fs::write(
        run_dir.join("comparison.md"),
        export_comparison_markdown(&report.holdout),
    )?;
    if !report.threshold_candidates.is_empty() {
        std::fs::write(
            run_dir.join("thresholds.csv"),
            export_threshold_sweep_csv(&report.threshold_candidates)?,
        )?;
    }
    Ok(run_dir)
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Side-by-side comparison with per-direction and per-tier breakdowns.
pub fn export_comparison_markdown(report: &ComparisonReport) -> String {
    let mut md = String::with_capacity(2048);
    let (c, b, d) = (&report.candidate, &report.baseline, &report.improvement);

    md.push_str("# Backtest Comparison\n\n");

    md.push_str("## Configs\n\n");
    md.push_str("| | Candidate | Baseline |\n");
    md.push_str("| --- | --- | --- |\n");
    md.push_str(&format!(
        "| Id | {} | {} |\n",
        c.config.fingerprint().short(),
        b.config.fingerprint().short()
    ));
    md.push_str(&format!(
        "| Filter | {} | {} |\n",
        describe_filter(&c.config),
        describe_filter(&b.config)
    ));
    md.push_str(&format!(
        "| Weights | {} | {} |\n\n",
        describe_weights(&c.config),
        describe_weights(&b.config)
    ));

    md.push_str("## Performance\n\n");
    md.push_str("| Metric | Candidate | Baseline | Delta |\n");
    md.push_str("| --- | --- | --- | --- |\n");
    let (cm, bm) = (&c.metrics, &b.metrics);
    md.push_str(&format!(
        "| Trades | {} / {} | {} / {} | {:+} |\n",
        cm.trade_count, c.offered, bm.trade_count, b.offered, d.trade_count
    ));
    md.push_str(&format!(
        "| Win Rate | {:.1}% | {:.1}% | {:+.1} |\n",
        cm.win_rate, bm.win_rate, d.win_rate
    ));
    md.push_str(&format!(
        "| Total Pips | {:.1} | {:.1} | {:+.1} |\n",
        cm.total_pips, bm.total_pips, d.total_pips
    ));
    md.push_str(&format!(
        "| Avg Pips | {:.2} | {:.2} | {:+.2} |\n",
        cm.avg_pips, bm.avg_pips, d.avg_pips
    ));
    md.push_str(&format!(
        "| Sharpe | {:.3} | {:.3} | {:+.3} |\n",
        cm.sharpe, bm.sharpe, d.sharpe
    ));
    md.push_str(&format!(
        "| Max Drawdown (pips) | {:.1} | {:.1} | {:+.1} |\n",
        cm.max_drawdown_pips, bm.max_drawdown_pips, d.max_drawdown_pips
    ));
    md.push_str(&format!(
        "| Profit Factor | {:.2} | {:.2} | {:+.2} |\n",
        cm.profit_factor, bm.profit_factor, d.profit_factor
    ));
    md.push_str(&format!(
        "| Position-Weighted Pips | {:.1} | {:.1} | {:+.1} |\n\n",
        c.weighted_metrics.total_pips, b.weighted_metrics.total_pips, d.weighted_total_pips
    ));

    md.push_str("## By Direction\n\n");
    let directions = [SignalDirection::Buy, SignalDirection::Sell, SignalDirection::Hold];
    push_breakdown_table(&mut md, c, b, &directions, |o, k| o.by_direction.get(k));

    md.push_str("## By Recommendation\n\n");
    let mut tiers = Recommendation::ALL;
    tiers.reverse();
    push_breakdown_table(&mut md, c, b, &tiers, |o, k| o.by_recommendation.get(k));

    let verdict = if report.candidate_wins() {
        "Candidate outperforms baseline."
    } else {
        "Candidate does not outperform baseline."
    };
    md.push_str(&format!("**{verdict}**\n"));
    md
}

fn push_breakdown_table<K: std::fmt::Display>(
    md: &mut String,
    candidate: &ReplayOutcome,
    baseline: &ReplayOutcome,
    keys: &[K],
    get: impl for<'o> Fn(&'o ReplayOutcome, &K) -> Option<&'o Breakdown>,
) {
    md.push_str("| Group | Candidate n | Candidate WR | Candidate Avg ");
    md.push_str("| Baseline n | Baseline WR | Baseline Avg |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- |\n");
    for key in keys {
        let (c, b) = (get(candidate, key), get(baseline, key));
        if c.is_none() && b.is_none() {
            continue;
        }
        let cell = |x: Option<&Breakdown>| match x {
            Some(x) => format!("{} | {:.1}% | {:.2}", x.count, x.win_rate, x.avg_pips),
            None => "0 | - | -".to_string(),
        };
        md.push_str(&format!("| {key} | {} | {} |\n", cell(c), cell(b)));
    }
    md.push('\n');
}

fn describe_filter(config: &WeightConfig) -> String {
    let basis = match config.threshold_basis {
        ThresholdBasis::Confidence => "confidence",
        ThresholdBasis::Weight => "weight",
    };
    format!("{basis} ≥ {:.1}", config.confidence_threshold)
}

fn describe_weights(config: &WeightConfig) -> String {
    config
        .component_weights
        .as_array()
        .iter()
        .map(|w| format!("{w:.2}"))
        .collect::<Vec<_>>()
        .join(" / ")
}
