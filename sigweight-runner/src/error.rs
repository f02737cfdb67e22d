//! Optimizer and pipeline failures. Never collapsed into a default numeric result.

use sigweight_core::ConfigError;
use thiserror::Error;

use crate::holdout::HoldoutError;
use crate::settings::SettingsError;
use crate::source::SourceError;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("insufficient data: {available} trades available, {required} required")]
    InsufficientData { available: usize, required: usize },

    /// No candidate met the per-candidate minimum sample size.
    #[error("{stage}: no candidate reached {min_trades} qualifying trades")]
    NoQualifyingCandidate {
        stage: &'static str,
        min_trades: usize,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Holdout(#[from] HoldoutError),

    #[error("candidate config invalid: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl OptimizeError {
    /// Whether the failure was caused by too few trades rather than bad input.
    pub fn is_data_shortage(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::NoQualifyingCandidate { .. } | Self::Holdout(_)
        )
    }
}

/// Refuse to optimize on fewer than `required` trades.
pub(crate) fn require_trades(available: usize, required: usize) -> Result<(), OptimizeError> {
    if available < required {
        tracing::warn!(available, required, "refusing to optimize on too few trades");
        return Err(OptimizeError::InsufficientData {
            available,
            required,
        });
    }
    Ok(())
}
