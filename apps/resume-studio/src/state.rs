use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tracing::debug;

use crate::config::Config;
use crate::dom::{Document, Size};
use crate::errors::ExportError;
use crate::export::{
    AssemblyOptions, CaptureOptions, Downloader, ExportSettings, ExportTrigger, SharedDocument,
};
use crate::layout::{default_page_config, render_resume, AssetCache, TEMPLATE_ELEMENT_ID};
use crate::models::ResumeStore;

/// Browser-like viewport the preview is laid out in.
pub const PREVIEW_VIEWPORT: Size = Size {
    width: 1280.0,
    height: 800.0,
};

/// Session state shared by the editor surface and the export action.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<Mutex<ResumeStore>>,
    pub document: SharedDocument,
    pub assets: Arc<AssetCache>,
    pub exporter: ExportTrigger,
    /// Set by a store subscription; cleared when the preview is re-rendered.
    preview_dirty: Arc<AtomicBool>,
}

pub fn export_settings(config: &Config) -> ExportSettings {
    ExportSettings {
        capture: CaptureOptions::default().with_scale(config.render_scale),
        assembly: AssemblyOptions {
            page: default_page_config(config.page_margin_mm),
            pagination: config.pagination,
            jpeg_quality: config.jpeg_quality,
            ..AssemblyOptions::default()
        },
    }
}

impl AppState {
    pub fn new(
        config: Config,
        mut store: ResumeStore,
        assets: AssetCache,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        let preview_dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&preview_dirty);
        store.subscribe(move |_| flag.store(true, Ordering::Release));

        let document: SharedDocument = Arc::new(Mutex::new(Document::new(PREVIEW_VIEWPORT)));
        let exporter = ExportTrigger::new(Arc::clone(&document), downloader, export_settings(&config));

        AppState {
            config,
            store: Arc::new(Mutex::new(store)),
            document,
            assets: Arc::new(assets),
            exporter,
            preview_dirty,
        }
    }

    /// Runs `f` against the store. Mutations mark the preview stale.
    pub fn update<R>(&self, f: impl FnOnce(&mut ResumeStore) -> R) -> Result<R> {
        let mut store = self.store.lock().map_err(|_| anyhow!("resume store lock poisoned"))?;
        Ok(f(&mut store))
    }

    pub fn is_preview_dirty(&self) -> bool {
        self.preview_dirty.load(Ordering::Acquire)
    }

    /// Re-renders the preview template if the store changed since the last
    /// render. Returns whether a render happened.
    pub fn refresh_preview(&self) -> Result<bool> {
        let mut doc = self
            .document
            .lock()
            .map_err(|_| anyhow!("host document lock poisoned"))?;
        render_if_dirty(&self.preview_dirty, &self.store, &self.assets, &mut doc)
    }

    /// Brings the preview up to date and exports it under `filename`.
    ///
    /// Fails fast while another export is in flight. The re-render runs on the
    /// export's blocking thread under the same document lock as the capture.
    pub async fn export(&self, filename: &str) -> bool {
        let dirty = Arc::clone(&self.preview_dirty);
        let store = Arc::clone(&self.store);
        let assets = Arc::clone(&self.assets);
        self.exporter
            .export_with(TEMPLATE_ELEMENT_ID, filename, move |doc| {
                render_if_dirty(&dirty, &store, &assets, doc)
                    .map(|_| ())
                    .map_err(ExportError::Internal)
            })
            .await
    }
}

/// Renders the store into `doc` when `dirty` is set, clearing it.
fn render_if_dirty(
    dirty: &AtomicBool,
    store: &Mutex<ResumeStore>,
    assets: &AssetCache,
    doc: &mut Document,
) -> Result<bool> {
    if !dirty.swap(false, Ordering::AcqRel) {
        return Ok(false);
    }
    let snapshot = store
        .lock()
        .map_err(|_| anyhow!("resume store lock poisoned"))?
        .snapshot();
    let root = render_resume(doc, &snapshot, assets);
    debug!(?root, template = %snapshot.selected_template, "preview re-rendered");
    Ok(true)
}
