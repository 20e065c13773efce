//! Capture stage: off-screen clone, positioning fix-up, rasterize.
//!
//! The source node is deep-cloned and the clone attached to the body far to the
//! left of the viewport, at the source's width, so geometry stays computed but
//! nothing is visible. Inside the clone every `fixed`/`sticky` element is
//! rewritten to `absolute` before painting. The clone is owned by an
//! `OffscreenClone` guard and detached when the guard drops, on every exit path.

use image::Rgba;
use tracing::{debug, info};

use crate::dom::{Document, NodeId, Position, Rect, Size};
use crate::errors::ExportError;
use crate::export::raster::{rasterize, Bitmap, RasterOptions};

/// Horizontal offset that puts the clone outside any realistic viewport.
pub const OFFSCREEN_LEFT_PX: f32 = -9999.0;

#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Render scale factor, at least 1.
    pub scale: f32,
    pub background: Rgba<u8>,
    pub use_cors: bool,
    pub allow_taint: bool,
    /// Window the capture is laid out in. `None` uses the document viewport.
    pub window: Option<Size>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureOptions {
            scale: 3.0,
            background: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            use_cors: true,
            allow_taint: false,
            window: None,
        }
    }
}

impl CaptureOptions {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    fn raster_options(&self, viewport: Size) -> RasterOptions {
        RasterOptions {
            scale: self.scale.max(1.0),
            // Captures are never transparent.
            background: Rgba([self.background[0], self.background[1], self.background[2], 0xFF]),
            use_cors: self.use_cors,
            allow_taint: self.allow_taint,
            window: self.window.unwrap_or(viewport),
        }
    }
}

/// Off-screen copy of a node, detached from the document on drop.
pub struct OffscreenClone<'a> {
    doc: &'a mut Document,
    root: NodeId,
}

impl<'a> OffscreenClone<'a> {
    /// Clones `source` and attaches the copy off-screen at the source's width.
    pub fn attach(doc: &'a mut Document, source: NodeId) -> Option<Self> {
        let frame = doc.element(source)?.frame;
        let root = doc.deep_clone(source)?;
        doc.set_frame(
            root,
            Rect::new(OFFSCREEN_LEFT_PX, 0.0, frame.width, frame.height),
        );
        doc.set_position(root, Position::Absolute);
        doc.append_to_body(root);
        debug!(?source, clone = ?root, width = frame.width, "off-screen clone attached");
        Some(OffscreenClone { doc, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document(&self) -> &Document {
        self.doc
    }

    /// Rewrites every `fixed`/`sticky` element in the clone to `absolute`.
    /// Returns how many were rewritten.
    pub fn normalize_positioning(&mut self) -> usize {
        let anchored: Vec<NodeId> = self
            .doc
            .descendants(self.root)
            .into_iter()
            .filter(|id| {
                self.doc
                    .element(*id)
                    .map(|e| e.style.position.is_viewport_anchored())
                    .unwrap_or(false)
            })
            .collect();
        for id in &anchored {
            self.doc.set_position(*id, Position::Absolute);
        }
        anchored.len()
    }
}

impl Drop for OffscreenClone<'_> {
    fn drop(&mut self) {
        self.doc.remove_subtree(self.root);
        debug!(clone = ?self.root, "off-screen clone detached");
    }
}

/// Captures the element with id `element_id` into a bitmap.
///
/// Fails with `CaptureTargetMissing` before touching the document when the id
/// does not resolve. The off-screen clone is gone by the time this returns,
/// whether it succeeds or not.
pub fn capture(
    doc: &mut Document,
    element_id: &str,
    options: &CaptureOptions,
) -> Result<Bitmap, ExportError> {
    let source = doc
        .get_element_by_id(element_id)
        .ok_or_else(|| ExportError::CaptureTargetMissing(element_id.to_string()))?;

    let mut clone = OffscreenClone::attach(doc, source)
        .ok_or_else(|| ExportError::CaptureTargetMissing(element_id.to_string()))?;
    let rewritten = clone.normalize_positioning();
    let raster_options = options.raster_options(clone.document().viewport());
    let bitmap = rasterize(clone.document(), clone.root(), &raster_options)?;
    drop(clone);

    info!(
        element_id,
        width = bitmap.width(),
        height = bitmap.height(),
        scale = bitmap.scale,
        rewritten,
        "capture complete"
    );
    Ok(bitmap)
}
