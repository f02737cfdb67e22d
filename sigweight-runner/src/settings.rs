//! Optimizer settings — every tunable of the sweep, search, and holdout, loadable from TOML.
//!
//! ```toml
//! candidate_thresholds = [50.0, 60.0, 70.0]
//! min_total_trades = 100
//!
//! [objective]
//! sharpe = 3.0
//!
//! [evolution]
//! seed = 7
//! max_generations = 50
//! ```
//!
//! Missing keys take their defaults. `validate()` runs before any optimization.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sigweight_core::config::DEFAULT_THRESHOLD;
use sigweight_core::SymbolRiskTiers;
use thiserror::Error;

use crate::objective::{ObjectiveKind, ObjectiveWeights};

/// Settings rejected before optimization starts.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize settings TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Differential-evolution parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionSettings {
    /// Population size is `population_multiplier × dimensions`.
    pub population_multiplier: usize,
    pub max_generations: usize,
    /// Relative convergence tolerance on population energy spread.
    pub tolerance: f64,
    /// Absolute convergence tolerance.
    pub atol: f64,
    /// Mutation factor is drawn uniformly from `[min, max)` once per generation.
    pub mutation: (f64, f64),
    pub recombination: f64,
    pub seed: u64,
}

impl Default for EvolutionSettings {
    fn default() -> Self {
        Self {
            population_multiplier: 15,
            max_generations: 100,
            tolerance: 0.01,
            atol: 0.0,
            mutation: (0.5, 1.0),
            recombination: 0.7,
            seed: 42,
        }
    }
}

impl EvolutionSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.population_multiplier == 0 {
            return Err(invalid("evolution.population_multiplier", "must be positive"));
        }
        if self.max_generations == 0 {
            return Err(invalid("evolution.max_generations", "must be positive"));
        }
        if !(self.tolerance >= 0.0 && self.atol >= 0.0) {
            return Err(invalid("evolution.tolerance", "tolerances must be non-negative"));
        }
        let (lo, hi) = self.mutation;
        if !(0.0..=2.0).contains(&lo) || !(0.0..=2.0).contains(&hi) || lo > hi {
            return Err(invalid(
                "evolution.mutation",
                format!("({lo}, {hi}) must be an ordered range inside [0, 2]"),
            ));
        }
        if !(0.0..=1.0).contains(&self.recombination) {
            return Err(invalid("evolution.recombination", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

/// Everything the optimizer, comparator, and pipeline are tuned by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Confidence thresholds tried by the sweep, evaluated in ascending order.
    pub candidate_thresholds: Vec<f64>,
    /// Below this many trades the optimizer refuses to run.
    pub min_total_trades: usize,
    /// A candidate with fewer qualifying trades is excluded, not scored.
    pub min_trades_per_candidate: usize,
    pub objective: ObjectiveWeights,
    pub objective_kind: ObjectiveKind,
    /// Total-weight threshold used by the component-weight search.
    pub weight_search_threshold: f64,
    pub evolution: EvolutionSettings,
    /// Fraction of the (chronologically latest) trades held out for validation.
    pub holdout_fraction: f64,
    /// Evaluate sweep candidates and DE generations on the rayon pool.
    pub parallel: bool,
    pub risk_tiers: SymbolRiskTiers,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            candidate_thresholds: (8..=19).map(|i| f64::from(i) * 5.0).collect(),
            min_total_trades: 100,
            min_trades_per_candidate: 10,
            objective: ObjectiveWeights::default(),
            objective_kind: ObjectiveKind::default(),
            weight_search_threshold: DEFAULT_THRESHOLD,
            evolution: EvolutionSettings::default(),
            holdout_fraction: 0.3,
            parallel: true,
            risk_tiers: SymbolRiskTiers::default(),
        }
    }
}

impl OptimizerSettings {
    /// Load settings from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Candidate thresholds sorted ascending with duplicates removed.
    pub fn sorted_thresholds(&self) -> Vec<f64> {
        let mut t = self.candidate_thresholds.clone();
        t.sort_by(f64::total_cmp);
        t.dedup();
        t
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.candidate_thresholds.is_empty() {
            return Err(invalid("candidate_thresholds", "must not be empty"));
        }
        if let Some(t) = self
            .candidate_thresholds
            .iter()
            .find(|t| !(0.0..=100.0).contains(*t))
        {
            return Err(invalid("candidate_thresholds", format!("{t} outside [0, 100]")));
        }
        if self.min_total_trades == 0 {
            return Err(invalid("min_total_trades", "must be positive"));
        }
        if self.min_trades_per_candidate == 0 {
            return Err(invalid("min_trades_per_candidate", "must be positive"));
        }
        if !(0.0..=100.0).contains(&self.weight_search_threshold) {
            return Err(invalid(
                "weight_search_threshold",
                format!("{} outside [0, 100]", self.weight_search_threshold),
            ));
        }
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(invalid(
                "holdout_fraction",
                format!("{} must lie strictly between 0 and 1", self.holdout_fraction),
            ));
        }
        self.evolution.validate()
    }
}
