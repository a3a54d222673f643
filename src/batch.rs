//! Batch orchestration over lists of document IDs.
//!
//! Two modes:
//!
//! * **Ad hoc** ([`BatchOrchestrator::run_ids`]): convert the given IDs and
//!   report. State files are never read or written.
//! * **Tracked** ([`BatchOrchestrator::run_tracked`]): IDs come from the
//!   pending list. After each success the ID is removed from pending (which
//!   is saved), then appended to completed (which is saved), in that order.
//!   A failed ID stays pending and is retried on the next run.
//!
//! Documents are converted strictly one after another, in list order.

use crate::convert::{ConversionOutcome, Converter};
use crate::error::Gdocs2BlogError;
use crate::progress::ProgressCallback;
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Default pending-list file name.
pub const DEFAULT_PENDING_FILE: &str = "pending_doc_ids.json";

/// Default completed-list file name.
pub const DEFAULT_COMPLETED_FILE: &str = "converted_doc_ids.json";

/// Converts one document; implemented by [`Converter`].
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, doc_id: &str) -> ConversionOutcome;
}

#[async_trait]
impl DocumentConverter for Converter {
    async fn convert(&self, doc_id: &str) -> ConversionOutcome {
        Converter::convert(self, doc_id).await
    }
}

/// Outcomes of one batch run, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<ConversionOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Locations of the pending and completed lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFiles {
    pub pending: PathBuf,
    pub completed: PathBuf,
}

impl Default for StateFiles {
    fn default() -> Self {
        Self {
            pending: PathBuf::from(DEFAULT_PENDING_FILE),
            completed: PathBuf::from(DEFAULT_COMPLETED_FILE),
        }
    }
}

/// Drives a [`DocumentConverter`] over a list of IDs.
pub struct BatchOrchestrator {
    converter: Arc<dyn DocumentConverter>,
    progress: Option<ProgressCallback>,
}

impl BatchOrchestrator {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            converter,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Ad hoc mode: convert `ids` without touching any state file.
    pub async fn run_ids(&self, ids: &[String]) -> BatchReport {
        let total = ids.len();
        self.batch_start(total);

        let mut report = BatchReport::default();
        for (i, id) in ids.iter().enumerate() {
            report.outcomes.push(self.run_one(i + 1, total, id).await);
        }

        self.batch_complete(&report);
        report
    }

    /// Tracked mode: convert every pending ID and move successes to completed.
    ///
    /// Fails before converting anything when the pending list is missing,
    /// malformed, or empty, and aborts if either list cannot be saved.
    pub async fn run_tracked(&self, files: &StateFiles) -> Result<BatchReport, Gdocs2BlogError> {
        let mut pending = load_pending(&files.pending).await?;
        let mut completed = load_completed(&files.completed).await?;
        info!(
            "{} pending, {} already completed",
            pending.len(),
            completed.len()
        );

        let ids = pending.clone();
        let total = ids.len();
        self.batch_start(total);

        let mut report = BatchReport::default();
        for (i, id) in ids.iter().enumerate() {
            let outcome = self.run_one(i + 1, total, id).await;
            if outcome.success {
                pending.retain(|p| p != id);
                save_ids(&files.pending, &pending).await?;
                completed.push(id.clone());
                save_ids(&files.completed, &completed).await?;
            }
            report.outcomes.push(outcome);
        }

        self.batch_complete(&report);
        Ok(report)
    }

    async fn run_one(&self, index: usize, total: usize, doc_id: &str) -> ConversionOutcome {
        info!("[{}/{}] Converting {}", index, total, doc_id);
        if let Some(ref cb) = self.progress {
            cb.on_document_start(index, total, doc_id);
        }

        let outcome = self.converter.convert(doc_id).await;

        if let Some(ref cb) = self.progress {
            match (&outcome.output_path, &outcome.error) {
                (Some(path), _) if outcome.success => {
                    cb.on_document_complete(index, total, doc_id, &path.display().to_string())
                }
                (_, error) => cb.on_document_error(
                    index,
                    total,
                    doc_id,
                    error.as_deref().unwrap_or("unknown error"),
                ),
            }
        }
        outcome
    }

    fn batch_start(&self, total: usize) {
        if let Some(ref cb) = self.progress {
            cb.on_batch_start(total);
        }
    }

    fn batch_complete(&self, report: &BatchReport) {
        info!(
            "Batch complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        if let Some(ref cb) = self.progress {
            cb.on_batch_complete(report.len(), report.succeeded());
        }
    }
}

// ── State files ──────────────────────────────────────────────────────────────

/// Split a comma-separated ID argument, dropping blanks.
pub fn parse_id_list(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn state_error(path: &Path, reason: impl std::fmt::Display) -> Gdocs2BlogError {
    Gdocs2BlogError::StateFile {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Load the pending list. Missing, malformed, and empty lists are errors.
pub async fn load_pending(path: &Path) -> Result<Vec<String>, Gdocs2BlogError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Gdocs2BlogError::PendingListMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(state_error(path, e)),
    };

    let ids: Vec<String> = serde_json::from_str(&text)
        .map_err(|e| state_error(path, format!("expected a JSON array of strings: {e}")))?;
    if ids.is_empty() {
        return Err(Gdocs2BlogError::NoPendingIds {
            path: path.to_path_buf(),
        });
    }
    Ok(ids)
}

/// Load the completed list. A missing file, or valid JSON that is not an
/// array, is treated as empty.
pub async fn load_completed(path: &Path) -> Result<Vec<String>, Gdocs2BlogError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(state_error(path, e)),
    };

    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| state_error(path, e))?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| state_error(path, format!("expected an array of strings: {e}"))),
        _ => {
            warn!("{} is not a JSON array; starting from an empty list", path.display());
            Ok(Vec::new())
        }
    }
}

/// Write `ids` as a pretty-printed JSON array (two-space indent).
pub async fn save_ids(path: &Path, ids: &[String]) -> Result<(), Gdocs2BlogError> {
    let json = serde_json::to_string_pretty(ids).map_err(|e| state_error(path, e))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| state_error(path, e))
}
