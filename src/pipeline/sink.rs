//! Snapshot persistence

use crate::{Result, types::Snapshot};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Destination for a finished snapshot
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Persist the snapshot, replacing anything written before
    async fn write(&self, snapshot: &Snapshot) -> Result<()>;
}

/// Render a snapshot as pretty-printed JSON with a two-space indent
pub fn render_snapshot(snapshot: &Snapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Writes the snapshot to a JSON file
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hidden sibling the snapshot is staged in before the rename
    pub fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

#[async_trait]
impl SnapshotSink for FileSink {
    async fn write(&self, snapshot: &Snapshot) -> Result<()> {
        let json = render_snapshot(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            debug!("Ensuring output directory {:?} exists", parent);
            tokio::fs::create_dir_all(parent).await?;
        }

        // Same directory as the target, so the rename replaces it in one step
        let staging = self.staging_path();
        let staged = async {
            tokio::fs::write(&staging, json).await?;
            tokio::fs::rename(&staging, &self.path).await
        };
        if let Err(e) = staged.await {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await {
                warn!("Failed to remove staging file {:?}: {}", staging, cleanup);
            }
            return Err(e.into());
        }

        info!("Wrote {} records to {:?}", snapshot.len(), self.path);
        Ok(())
    }
}
