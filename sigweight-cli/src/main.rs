//! Sigweight CLI — score signals, optimize configs, and manage the active config.
//!
//! Commands:
//! - `score` — weight one signal (JSON) under the active config
//! - `sweep` — confidence-threshold sweep over a JSONL trade history
//! - `search` — differential-evolution search for component weights
//! - `optimize` — train/holdout pipeline; writes report artifacts, optionally records the candidate
//! - `compare` — replay a candidate config against a baseline
//! - `activate` — make a stored or file-supplied config the active one
//! - `active` / `list` — inspect the config store

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sigweight_core::{
    ConfigId, ConfigStatus, ConfigStore, JsonFileConfigStore, SignalInput, SignalWeightCalculator,
    WeightConfig,
};
use sigweight_runner::export::{
    export_comparison_markdown, export_threshold_sweep_csv, save_artifacts,
};
use sigweight_runner::{
    Comparator, JsonlTradeSource, OptimizationPipeline, Optimizer, OptimizerSettings, SearchMode,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sigweight",
    about = "Sigweight CLI — signal weighting and threshold/weight optimization"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Weight one signal read from a JSON file (`-` for stdin).
    Score {
        /// SignalInput JSON.
        input: PathBuf,

        /// Config store. Defaults to ./configs.json.
        #[arg(long, default_value = "configs.json")]
        store: PathBuf,

        /// Optimizer settings TOML (for symbol risk tiers).
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Sweep confidence thresholds over the whole trade history.
    Sweep {
        /// JSONL trade history.
        #[arg(long)]
        trades: PathBuf,

        /// Optimizer settings TOML.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Write per-candidate rows to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Search component weights with differential evolution.
    Search {
        /// JSONL trade history.
        #[arg(long)]
        trades: PathBuf,

        /// Optimizer settings TOML.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Override the evolution seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Optimize on the earlier trades and validate on the held-out later ones.
    Optimize {
        /// JSONL trade history.
        #[arg(long)]
        trades: PathBuf,

        #[arg(long, value_enum, default_value_t = Mode::Threshold)]
        mode: Mode,

        /// Optimizer settings TOML.
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Config store; the active config is the baseline.
        #[arg(long, default_value = "configs.json")]
        store: PathBuf,

        /// Output directory for report artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Record the candidate in the store as backtested (never activates).
        #[arg(long, default_value_t = false)]
        record: bool,
    },
    /// Replay a candidate config against a baseline over the trade history.
    Compare {
        /// JSONL trade history.
        #[arg(long)]
        trades: PathBuf,

        /// Candidate WeightConfig JSON.
        #[arg(long)]
        candidate: PathBuf,

        /// Baseline WeightConfig JSON. Defaults to the store's active config.
        #[arg(long)]
        baseline: Option<PathBuf>,

        #[arg(long, default_value = "configs.json")]
        store: PathBuf,

        /// Optimizer settings TOML (for symbol risk tiers).
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Activate a stored config by id prefix, or a WeightConfig JSON file.
    Activate {
        /// Id (or unique prefix) of a stored config.
        #[arg(long, conflicts_with = "config")]
        id: Option<String>,

        /// WeightConfig JSON to validate, store, and activate.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "configs.json")]
        store: PathBuf,
    },
    /// Print the active config.
    Active {
        #[arg(long, default_value = "configs.json")]
        store: PathBuf,
    },
    /// List every stored config with its status.
    List {
        #[arg(long, default_value = "configs.json")]
        store: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Threshold,
    Weights,
}

impl From<Mode> for SearchMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Threshold => SearchMode::Threshold,
            Mode::Weights => SearchMode::Weights,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Score {
            input,
            store,
            settings,
        } => run_score(&input, &store, settings.as_deref()),
        Commands::Sweep {
            trades,
            settings,
            csv,
        } => run_sweep(&trades, settings.as_deref(), csv.as_deref()),
        Commands::Search {
            trades,
            settings,
            seed,
        } => run_search(&trades, settings.as_deref(), seed),
        Commands::Optimize {
            trades,
            mode,
            settings,
            store,
            output_dir,
            record,
        } => run_optimize(&trades, mode, settings.as_deref(), &store, &output_dir, record),
        Commands::Compare {
            trades,
            candidate,
            baseline,
            store,
            settings,
        } => run_compare(&trades, &candidate, baseline.as_deref(), &store, settings.as_deref()),
        Commands::Activate { id, config, store } => run_activate(id, config.as_deref(), &store),
        Commands::Active { store } => run_active(&store),
        Commands::List { store } => run_list(&store),
    }
}

/// Logs go to stderr so JSON on stdout stays pipeable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<OptimizerSettings> {
    match path {
        Some(p) => OptimizerSettings::from_toml_file(p)
            .with_context(|| format!("failed to load settings from {}", p.display())),
        None => Ok(OptimizerSettings::default()),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn run_score(input: &Path, store: &Path, settings: Option<&Path>) -> Result<()> {
    let signal: SignalInput = read_json(input)?;
    if let Err(e) = signal.snapshot.validate() {
        tracing::warn!("{e}");
    }
    let settings = load_settings(settings)?;
    let config = JsonFileConfigStore::new(store)
        .get_active_config()
        .context("failed to read active config")?;

    let calc = SignalWeightCalculator::new(settings.risk_tiers);
    let result = calc.calculate_weight(&signal, &config.component_weights);
    let payload = result.to_signal_payload(signal.direction, signal.ml_confidence);
    let qualifies = config.qualifies(signal.ml_confidence, result.total_weight);

    println!("{}", serde_json::to_string_pretty(&payload)?);
    eprintln!(
        "{} under active config {} ({})",
        if qualifies { "qualifies" } else { "filtered out" },
        config.fingerprint().short(),
        describe_config(&config)
    );
    Ok(())
}

fn run_sweep(trades: &Path, settings: Option<&Path>, csv: Option<&Path>) -> Result<()> {
    let settings = load_settings(settings)?;
    let optimizer = Optimizer::new(JsonlTradeSource::new(trades), settings)?;
    let result = optimizer.sweep_thresholds()?;

    println!(
        "{:>9} {:>10} {:>9} {:>11} {:>9} {:>8} {:>10}",
        "Threshold", "Qualifying", "Win Rate", "Total Pips", "Avg Pips", "PF", "Score"
    );
    println!("{}", "-".repeat(74));
    for c in &result.candidates {
        let marker = if c.threshold == result.best.threshold { "*" } else { " " };
        let score = c
            .score
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "excluded".to_string());
        println!(
            "{marker}{:>8.1} {:>10} {:>8.1}% {:>11.1} {:>9.2} {:>8.2} {:>10}",
            c.threshold,
            c.qualifying,
            c.metrics.win_rate,
            c.metrics.total_pips,
            c.metrics.avg_pips,
            c.metrics.profit_factor,
            score
        );
    }
    println!();
    println!("Best: {}", describe_config(&result.config));
    print_warnings(&result.warnings);

    if let Some(path) = csv {
        std::fs::write(path, export_threshold_sweep_csv(&result.candidates)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("CSV saved to: {}", path.display());
    }
    Ok(())
}

fn run_search(trades: &Path, settings: Option<&Path>, seed: Option<u64>) -> Result<()> {
    let mut settings = load_settings(settings)?;
    if let Some(seed) = seed {
        settings.evolution.seed = seed;
    }
    let optimizer = Optimizer::new(JsonlTradeSource::new(trades), settings)?;
    let result = optimizer.search_weights()?;

    println!("{}", serde_json::to_string_pretty(&result.config)?);
    println!(
        "score {:.3} over {} trades ({:.1}% win rate, {:.1} pips); {} generations, {} evaluations{}",
        result.score,
        result.metrics.trade_count,
        result.metrics.win_rate,
        result.metrics.total_pips,
        result.generations,
        result.evaluations,
        if result.converged { ", converged" } else { "" }
    );
    print_warnings(&result.warnings);
    Ok(())
}

fn run_optimize(
    trades: &Path,
    mode: Mode,
    settings: Option<&Path>,
    store: &Path,
    output_dir: &Path,
    record: bool,
) -> Result<()> {
    let settings = load_settings(settings)?;
    let store = JsonFileConfigStore::new(store);
    let baseline = store
        .get_active_config()
        .context("failed to read baseline config")?;

    let pipeline = OptimizationPipeline::new(JsonlTradeSource::new(trades), settings)?;
    let report = pipeline.run(mode.into(), &baseline)?;

    println!("{}", export_comparison_markdown(&report.holdout));
    print_warnings(&report.warnings);

    let run_dir = save_artifacts(&report, output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    if record {
        let id = report
            .record_in(&store)
            .context("failed to record candidate")?;
        println!(
            "Recorded candidate {} (activate with `sigweight activate --id {}`)",
            id.short(),
            id.short()
        );
    }
    Ok(())
}

fn run_compare(
    trades: &Path,
    candidate: &Path,
    baseline: Option<&Path>,
    store: &Path,
    settings: Option<&Path>,
) -> Result<()> {
    let candidate: WeightConfig = read_json(candidate)?;
    candidate.validate().context("candidate config is invalid")?;
    let baseline = match baseline {
        Some(p) => read_json(p)?,
        None => JsonFileConfigStore::new(store).get_active_config()?,
    };
    let settings = load_settings(settings)?;

    let comparator = Comparator::new(
        JsonlTradeSource::new(trades),
        SignalWeightCalculator::new(settings.risk_tiers),
    );
    let report = comparator.run(&candidate, &baseline)?;
    println!("{}", export_comparison_markdown(&report));
    Ok(())
}

fn run_activate(id: Option<String>, config: Option<&Path>, store: &Path) -> Result<()> {
    let store = JsonFileConfigStore::new(store);
    let id = match (id, config) {
        (Some(prefix), None) => {
            let id = resolve_id(&store, &prefix)?;
            store.activate(&id)?;
            id
        }
        (None, Some(path)) => {
            let config: WeightConfig = read_json(path)?;
            store.activate_config(config)?
        }
        _ => bail!("one of --id or --config is required"),
    };
    println!("Active config: {}", id.short());
    Ok(())
}

fn resolve_id(store: &JsonFileConfigStore, prefix: &str) -> Result<ConfigId> {
    let matches: Vec<ConfigId> = store
        .list()?
        .into_iter()
        .filter(|e| e.id.0.starts_with(prefix))
        .map(|e| e.id)
        .collect();
    match matches.as_slice() {
        [id] => Ok(id.clone()),
        [] => bail!("no stored config matches '{prefix}'"),
        _ => bail!("'{prefix}' matches {} configs; use a longer prefix", matches.len()),
    }
}

fn run_active(store: &Path) -> Result<()> {
    let store = JsonFileConfigStore::new(store);
    match store.active_entry()? {
        Some(entry) => {
            println!("{}", serde_json::to_string_pretty(&entry.config)?);
            let since = entry
                .activated_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_default();
            eprintln!("id {} active since {since}", entry.id.short());
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&WeightConfig::default())?);
            eprintln!("nothing activated yet; showing the default config");
        }
    }
    Ok(())
}

fn run_list(store: &Path) -> Result<()> {
    let store = JsonFileConfigStore::new(store);
    let entries = store.list()?;
    if entries.is_empty() {
        println!("Store is empty: {}", store.path().display());
        return Ok(());
    }

    println!("{:<12} {:<10} {:<20} {:<26} {:>9}", "Id", "Status", "Created", "Filter", "Win Rate");
    println!("{}", "-".repeat(81));
    for e in &entries {
        let status = match e.status {
            ConfigStatus::Proposed => "proposed",
            ConfigStatus::Backtested => "backtested",
            ConfigStatus::Active => "ACTIVE",
            ConfigStatus::Inactive => "inactive",
        };
        let win_rate = e
            .metrics
            .get("win_rate")
            .map(|w| format!("{w:.1}%"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:<10} {:<20} {:<26} {:>9}",
            e.id.short(),
            status,
            e.created_at.format("%Y-%m-%d %H:%M:%S"),
            describe_config(&e.config),
            win_rate
        );
    }
    Ok(())
}

fn describe_config(config: &WeightConfig) -> String {
    format!(
        "{:?} ≥ {:.1}",
        config.threshold_basis, config.confidence_threshold
    )
}

fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("warning: {w}");
    }
}
