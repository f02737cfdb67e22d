//! Active-config store — the only stateful interface of the core.
//!
//! A `WeightConfig` moves through `Proposed → Backtested → Active`, and an
//! active config becomes `Inactive` when another one is activated. Exactly one
//! config is active once the first activation has happened; before that,
//! `get_active_config` returns `WeightConfig::default()`.
//!
//! Two implementations:
//! - `InMemoryConfigStore`: all transitions under one `RwLock` write guard.
//! - `JsonFileConfigStore`: the whole state is rewritten to a uniquely named
//!   temp file and renamed over the original, so readers see either the old or
//!   the new state.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ConfigId, WeightConfig};

/// Current on-disk schema version for the file store.
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Lifecycle state of a stored config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigStatus {
    Proposed,
    Backtested,
    Active,
    Inactive,
}

/// A config plus its lifecycle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConfig {
    pub id: ConfigId,
    pub config: WeightConfig,
    pub status: ConfigStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
    /// Named backtest metrics (win_rate, total_pips, ...).
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// Errors from config storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
    #[error("config {0} not found")]
    NotFound(ConfigId),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported store schema version {found} (max supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },
    #[error("store holds {0} active configs")]
    Corrupt(usize),
}

/// Persistence boundary for weight configs.
pub trait ConfigStore: Send + Sync {
    /// Record a config as proposed. Re-proposing identical content returns the
    /// existing id and leaves its status alone.
    fn propose(&self, config: WeightConfig) -> Result<ConfigId, StoreError>;

    /// Attach backtest metrics and move a proposed config to `Backtested`.
    fn record_backtest(
        &self,
        id: &ConfigId,
        metrics: BTreeMap<String, f64>,
    ) -> Result<(), StoreError>;

    /// Make `id` the single active config, deactivating the previous one.
    ///
    /// Validates first: an invalid config is rejected and nothing changes.
    fn activate(&self, id: &ConfigId) -> Result<(), StoreError>;

    /// The active entry, if any activation has happened.
    fn active_entry(&self) -> Result<Option<StoredConfig>, StoreError>;

    /// Every stored config, oldest first.
    fn list(&self) -> Result<Vec<StoredConfig>, StoreError>;

    /// The active config, or the default config before any activation.
    fn get_active_config(&self) -> Result<WeightConfig, StoreError> {
        Ok(self
            .active_entry()?
            .map(|entry| entry.config)
            .unwrap_or_default())
    }

    /// Validate, propose, and activate in one call.
    fn activate_config(&self, config: WeightConfig) -> Result<ConfigId, StoreError> {
        config.validate()?;
        let id = self.propose(config)?;
        self.activate(&id)?;
        Ok(id)
    }
}

// ─── Shared state transitions ────────────────────────────────────────

fn propose_into(configs: &mut Vec<StoredConfig>, config: WeightConfig) -> ConfigId {
    let id = config.fingerprint();
    if !configs.iter().any(|c| c.id == id) {
        configs.push(StoredConfig {
            id: id.clone(),
            config,
            status: ConfigStatus::Proposed,
            created_at: Utc::now(),
            activated_at: None,
            metrics: BTreeMap::new(),
        });
    }
    id
}

fn record_backtest_into(
    configs: &mut [StoredConfig],
    id: &ConfigId,
    metrics: BTreeMap<String, f64>,
) -> Result<(), StoreError> {
    let entry = configs
        .iter_mut()
        .find(|c| &c.id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
    entry.metrics = metrics;
    if entry.status == ConfigStatus::Proposed {
        entry.status = ConfigStatus::Backtested;
    }
    Ok(())
}

fn activate_into(configs: &mut [StoredConfig], id: &ConfigId) -> Result<(), StoreError> {
    let target = configs
        .iter()
        .position(|c| &c.id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))?;
    configs[target].config.validate()?;

    if configs[target].status == ConfigStatus::Active {
        return Ok(());
    }
    if configs[target].status == ConfigStatus::Proposed {
        tracing::warn!(config = %id.short(), "activating a config that was never backtested");
    }

    for entry in configs.iter_mut() {
        if entry.status == ConfigStatus::Active {
            entry.status = ConfigStatus::Inactive;
        }
    }
    configs[target].status = ConfigStatus::Active;
    configs[target].activated_at = Some(Utc::now());
    tracing::info!(
        config = %id.short(),
        threshold = configs[target].config.confidence_threshold,
        "config activated"
    );
    Ok(())
}

fn find_active(configs: &[StoredConfig]) -> Result<Option<StoredConfig>, StoreError> {
    let mut active = configs.iter().filter(|c| c.status == ConfigStatus::Active);
    let first = active.next().cloned();
    let extra = active.count();
    if extra > 0 {
        return Err(StoreError::Corrupt(extra + 1));
    }
    Ok(first)
}

// ─── In-memory store ─────────────────────────────────────────────────

/// Process-local store guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<Vec<StoredConfig>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn propose(&self, config: WeightConfig) -> Result<ConfigId, StoreError> {
        let mut guard = self.configs.write().map_err(|_| StoreError::Poisoned)?;
        Ok(propose_into(&mut guard, config))
    }

    fn record_backtest(
        &self,
        id: &ConfigId,
        metrics: BTreeMap<String, f64>,
    ) -> Result<(), StoreError> {
        let mut guard = self.configs.write().map_err(|_| StoreError::Poisoned)?;
        record_backtest_into(&mut guard, id, metrics)
    }

    fn activate(&self, id: &ConfigId) -> Result<(), StoreError> {
        let mut guard = self.configs.write().map_err(|_| StoreError::Poisoned)?;
        activate_into(&mut guard, id)
    }

    fn active_entry(&self) -> Result<Option<StoredConfig>, StoreError> {
        let guard = self.configs.read().map_err(|_| StoreError::Poisoned)?;
        find_active(&guard)
    }

    fn list(&self) -> Result<Vec<StoredConfig>, StoreError> {
        let guard = self.configs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }
}

// ─── JSON file store ─────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    schema_version: u32,
    configs: Vec<StoredConfig>,
}

/// Durable store: one JSON document replaced atomically on every write.
///
/// Read-modify-write is exclusive only within one handle. Separate handles or
/// processes on the same file never corrupt it, but a concurrent update from
/// another handle can be overwritten (last writer wins).
#[derive(Debug)]
pub struct JsonFileConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<StoredConfig>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let file: StoreFile = serde_json::from_str(&content)?;
        if file.schema_version > STORE_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: file.schema_version,
                supported: STORE_SCHEMA_VERSION,
            });
        }
        Ok(file.configs)
    }

    fn save(&self, configs: Vec<StoredConfig>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(&StoreFile {
            schema_version: STORE_SCHEMA_VERSION,
            configs,
        })?;
        // Same directory as the target so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read-modify-write under the writer mutex.
    fn update<T>(
        &self,
        f: impl FnOnce(&mut Vec<StoredConfig>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut configs = self.load()?;
        let out = f(&mut configs)?;
        self.save(configs)?;
        Ok(out)
    }
}

impl ConfigStore for JsonFileConfigStore {
    fn propose(&self, config: WeightConfig) -> Result<ConfigId, StoreError> {
        self.update(|configs| Ok(propose_into(configs, config)))
    }

    fn record_backtest(
        &self,
        id: &ConfigId,
        metrics: BTreeMap<String, f64>,
    ) -> Result<(), StoreError> {
        self.update(|configs| record_backtest_into(configs, id, metrics))
    }

    fn activate(&self, id: &ConfigId) -> Result<(), StoreError> {
        self.update(|configs| activate_into(configs, id))
    }

    fn active_entry(&self) -> Result<Option<StoredConfig>, StoreError> {
        find_active(&self.load()?)
    }

    fn list(&self) -> Result<Vec<StoredConfig>, StoreError> {
        self.load()
    }
}
