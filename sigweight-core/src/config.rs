//! WeightConfig — component weights plus the qualifying threshold.
//!
//! - `ComponentWeights`: five non-negative weights on the simplex (sum 1.0).
//! - `WeightConfig`: weights + threshold + which value the threshold filters on.
//! - `ConfigId`: BLAKE3 fingerprint of the canonical JSON, used as the store key.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Absolute tolerance on the component-weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Default qualifying threshold for a signal weight.
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Rejection reasons for a WeightConfig.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("component weights must sum to 1.0 (got {sum:.6})")]
    WeightSum { sum: f64 },
    #[error("component weight '{name}' is negative ({value})")]
    NegativeWeight { name: &'static str, value: f64 },
    #[error("component weight '{name}' is not finite")]
    NonFiniteWeight { name: &'static str },
    #[error("confidence threshold {0} outside [0, 100]")]
    ThresholdOutOfRange(f64),
}

/// Relative importance of the five component scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub ml_confidence: f64,
    pub technical_quality: f64,
    pub market_conditions: f64,
    pub mtf_confirmation: f64,
    #[serde(alias = "risk_score")]
    pub risk_factors: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            ml_confidence: 0.30,
            technical_quality: 0.25,
            market_conditions: 0.20,
            mtf_confirmation: 0.15,
            risk_factors: 0.10,
        }
    }
}

impl ComponentWeights {
    pub const NAMES: [&'static str; 5] = [
        "ml_confidence",
        "technical_quality",
        "market_conditions",
        "mtf_confirmation",
        "risk_factors",
    ];

    pub fn from_array(w: [f64; 5]) -> Self {
        Self {
            ml_confidence: w[0],
            technical_quality: w[1],
            market_conditions: w[2],
            mtf_confirmation: w[3],
            risk_factors: w[4],
        }
    }

    pub fn as_array(&self) -> [f64; 5] {
        [
            self.ml_confidence,
            self.technical_quality,
            self.market_conditions,
            self.mtf_confirmation,
            self.risk_factors,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Project onto the simplex by dividing by the sum.
    ///
    /// Negative entries are floored at zero first. Returns `None` when nothing
    /// positive remains to normalize.
    pub fn normalized(&self) -> Option<Self> {
        let floored = self.as_array().map(|w| if w.is_finite() { w.max(0.0) } else { 0.0 });
        let total: f64 = floored.iter().sum();
        if total <= f64::EPSILON {
            return None;
        }
        Some(Self::from_array(floored.map(|w| w / total)))
    }

    /// Reject negative, non-finite, or non-unit-sum weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in Self::NAMES.into_iter().zip(self.as_array()) {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { name });
            }
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Which value the threshold is compared against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThresholdBasis {
    /// Raw ML confidence (threshold-sweep output).
    Confidence,
    /// Aggregated total weight (component-weight search output).
    #[default]
    Weight,
}

/// A tunable weighting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub component_weights: ComponentWeights,
    pub confidence_threshold: f64,
    #[serde(default)]
    pub threshold_basis: ThresholdBasis,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            component_weights: ComponentWeights::default(),
            confidence_threshold: DEFAULT_THRESHOLD,
            threshold_basis: ThresholdBasis::Weight,
        }
    }
}

impl WeightConfig {
    pub fn new(
        component_weights: ComponentWeights,
        confidence_threshold: f64,
        threshold_basis: ThresholdBasis,
    ) -> Self {
        Self {
            component_weights,
            confidence_threshold,
            threshold_basis,
        }
    }

    /// Full validation. Never clamps: an out-of-range value is an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.component_weights.validate()?;
        let t = self.confidence_threshold;
        if !t.is_finite() || !(0.0..=100.0).contains(&t) {
            return Err(ConfigError::ThresholdOutOfRange(t));
        }
        Ok(())
    }

    /// Whether a signal passes this config's filter.
    pub fn qualifies(&self, ml_confidence: f64, total_weight: f64) -> bool {
        let value = match self.threshold_basis {
            ThresholdBasis::Confidence => ml_confidence,
            ThresholdBasis::Weight => total_weight,
        };
        value >= self.confidence_threshold
    }

    /// Deterministic content hash.
    pub fn fingerprint(&self) -> ConfigId {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigId(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

/// Content-addressed identifier of a WeightConfig.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigId(pub String);

impl ConfigId {
    /// First 12 characters, for log lines and tables.
    ///
    /// Ids read back from a hand-edited store may not be hex; the cut always
    /// lands on a char boundary.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(12) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
