//! On-disk saga journals.

use std::path::{Path, PathBuf};

use checkout::SagaRun;

use crate::error::{Result, StorefrontError};

/// Writes the run's journal to `<dir>/<saga id>.json`, replacing an earlier
/// write for the same run.
pub async fn write(dir: &Path, run: &SagaRun) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| StorefrontError::io(dir, e))?;

    let name = match run.saga_id() {
        Some(id) => format!("{id}.json"),
        None => "unstarted.json".to_string(),
    };
    let path = dir.join(name);
    let json = serde_json::to_vec_pretty(run)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| StorefrontError::io(&path, e))?;

    tracing::debug!(path = %path.display(), events = run.events().len(), "saga journal written");
    Ok(path)
}

/// Reads a journal written by [`write`].
pub async fn read(path: &Path) -> Result<SagaRun> {
    let raw = tokio::fs::read(path)
        .await
        .map_err(|e| StorefrontError::io(path, e))?;
    Ok(serde_json::from_slice(&raw)?)
}
