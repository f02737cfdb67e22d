//! Trade sources — the injected collaborator that supplies historical trades.
//!
//! The optimizer never reaches for a global client; it is handed a
//! `TradeSource` at construction time.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use sigweight_core::HistoricalTrade;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("trade source I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed trade on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize trade: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Supplier of labeled historical trades.
pub trait TradeSource: Send + Sync {
    fn load_trades(&self) -> Result<Vec<HistoricalTrade>, SourceError>;

    /// Human-readable origin, recorded in reports.
    fn describe(&self) -> String;
}

/// Trades already materialized in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTradeSource {
    trades: Vec<HistoricalTrade>,
}

impl InMemoryTradeSource {
    pub fn new(trades: Vec<HistoricalTrade>) -> Self {
        Self { trades }
    }
}

impl TradeSource for InMemoryTradeSource {
    fn load_trades(&self) -> Result<Vec<HistoricalTrade>, SourceError> {
        Ok(self.trades.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} trades)", self.trades.len())
    }
}

/// One JSON trade per line.
///
/// Blank lines are skipped; a malformed line is an error carrying its
/// 1-based line number, since silently dropping trades would bias the sample.
#[derive(Debug, Clone)]
pub struct JsonlTradeSource {
    path: PathBuf,
}

impl JsonlTradeSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append trades to the file, creating it if needed.
    pub fn append(&self, trades: &[HistoricalTrade]) -> Result<(), SourceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        for trade in trades {
            let json = serde_json::to_string(trade).map_err(SourceError::Serialize)?;
            writeln!(file, "{json}")?;
        }
        file.flush()?;
        Ok(())
    }
}

impl TradeSource for JsonlTradeSource {
    fn load_trades(&self) -> Result<Vec<HistoricalTrade>, SourceError> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut trades = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let trade = serde_json::from_str(&line).map_err(|source| SourceError::Malformed {
                line: idx + 1,
                source,
            })?;
            trades.push(trade);
        }
        tracing::debug!(path = %self.path.display(), count = trades.len(), "loaded trades");
        Ok(trades)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
