//! Delivery: hands finished PDF bytes to the host environment.
//!
//! `Downloader` is the seam between the pipeline and whatever "download" means
//! for the host. Carried in `ExportTrigger` as `Arc<dyn Downloader>`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::info;

use crate::errors::ExportError;

/// One completed export: the PDF payload and the name it is saved under.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEvent {
    pub filename: String,
    pub bytes: Bytes,
}

impl DeliveryEvent {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait Downloader: Send + Sync {
    /// Delivers the event. Either the whole file lands or nothing does.
    async fn deliver(&self, event: &DeliveryEvent) -> Result<(), ExportError>;
}

// ────────────────────────────────────────────────────────────────────────────
// DownloadDir: writes into a directory on disk
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DownloadDir {
    dir: PathBuf,
}

impl DownloadDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DownloadDir { dir: dir.into() }
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

/// Writes to a temp file in `dir` and renames it over `target`.
fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl Downloader for DownloadDir {
    async fn deliver(&self, event: &DeliveryEvent) -> Result<(), ExportError> {
        let dir = self.dir.clone();
        let target = self.path_for(&event.filename);
        let bytes = event.bytes.clone();
        let path = target.clone();

        tokio::task::spawn_blocking(move || write_atomically(&dir, &path, &bytes))
            .await
            .map_err(|e| ExportError::Internal(anyhow::anyhow!("spawn_blocking failed in delivery: {e}")))??;

        info!(path = %target.display(), bytes = event.len(), "PDF delivered");
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryDownloads: records events, for tests and embedding hosts
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryDownloads {
    events: Mutex<Vec<DeliveryEvent>>,
}

impl MemoryDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DeliveryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Downloader for MemoryDownloads {
    async fn deliver(&self, event: &DeliveryEvent) -> Result<(), ExportError> {
        self.events
            .lock()
            .map_err(|_| ExportError::Internal(anyhow::anyhow!("download log lock poisoned")))?
            .push(event.clone());
        Ok(())
    }
}
