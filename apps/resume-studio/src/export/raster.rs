//! Rasterizer: paints a subtree of the host document into an RGBA bitmap.
//!
//! The subtree root is painted at the bitmap origin regardless of where it sits
//! in the document, so an off-screen clone rasterizes the same as the original.
//! Paint order is background, border, content, then children sorted by z-index
//! (stable, so document order breaks ties).
//!
//! Elements positioned `fixed` or `sticky` are anchored to the viewport. The
//! capture walks the content one window height at a time, and a viewport-anchored
//! element shows up once per window band, which is exactly the duplication the
//! capture stage removes by rewriting them to `absolute` first.

use image::imageops::{self, FilterType};
use image::{Pixel, Rgba, RgbaImage};
use tracing::debug;

use crate::dom::{Content, Document, Element, NodeId, Origin, Rect, Size, TextBlock};
use crate::errors::ExportError;
use crate::layout::font_metrics::get_metrics;

/// Largest bitmap edge the JPEG encoder accepts.
pub const MAX_CAPTURE_DIMENSION_PX: u32 = 65_535;
/// Largest bitmap allocated for one capture, in pixels (1 GiB of RGBA).
pub const MAX_CAPTURE_PIXELS: u64 = 1 << 28;

#[derive(Debug, Clone)]
pub struct RasterOptions {
    pub scale: f32,
    pub background: Rgba<u8>,
    /// Treat cross-origin images as capturable.
    pub use_cors: bool,
    /// Draw cross-origin images without CORS, tainting the bitmap.
    pub allow_taint: bool,
    /// Window size used to band viewport-anchored elements.
    pub window: Size,
}

/// A rasterized capture.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub pixels: RgbaImage,
    /// Set when cross-origin pixels were drawn without CORS.
    pub tainted: bool,
    pub scale: f32,
}

impl Bitmap {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

struct Painter<'a> {
    doc: &'a Document,
    canvas: RgbaImage,
    options: &'a RasterOptions,
    tainted: bool,
    /// Viewport-anchored nodes, painted after the main pass.
    anchored: Vec<NodeId>,
}

/// Paints `root` and its descendants into a new bitmap sized to the root's frame
/// times the scale factor.
pub fn rasterize(doc: &Document, root: NodeId, options: &RasterOptions) -> Result<Bitmap, ExportError> {
    let element = doc
        .element(root)
        .ok_or_else(|| ExportError::CaptureTargetMissing(format!("{root:?}")))?;
    let scale = options.scale.max(1.0);
    let width = (element.frame.width * scale).round().max(0.0) as u32;
    let height = (element.frame.height * scale).round().max(0.0) as u32;
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyCapture { width, height });
    }
    if width > MAX_CAPTURE_DIMENSION_PX || u64::from(width) * u64::from(height) > MAX_CAPTURE_PIXELS {
        return Err(ExportError::CaptureTooLarge { width, height });
    }

    let mut painter = Painter {
        doc,
        canvas: RgbaImage::from_pixel(width, height, options.background),
        options,
        tainted: false,
        anchored: Vec::new(),
    };

    painter.paint_subtree(root, 0.0, 0.0, true);

    let bands = if options.window.height > 0.0 {
        (element.frame.height / options.window.height).ceil().max(1.0) as u32
    } else {
        1
    };
    let anchored = std::mem::take(&mut painter.anchored);
    for node in &anchored {
        for band in 0..bands {
            let band_top = band as f32 * options.window.height;
            painter.paint_subtree(*node, 0.0, band_top, false);
        }
    }

    debug!(
        tag = element.tag,
        width,
        height,
        scale,
        anchored = anchored.len(),
        bands,
        "subtree rasterized"
    );

    Ok(Bitmap {
        pixels: painter.canvas,
        tainted: painter.tainted,
        scale,
    })
}

impl Painter<'_> {
    /// Paints `id` with its frame offset by (`origin_x`, `origin_y`) in CSS px.
    /// `is_root` places the node at the origin and ignores its own offset.
    fn paint_subtree(&mut self, id: NodeId, origin_x: f32, origin_y: f32, is_root: bool) {
        let doc = self.doc;
        let Some(element) = doc.element(id) else {
            return;
        };
        let frame = if is_root {
            Rect::new(0.0, 0.0, element.frame.width, element.frame.height)
        } else {
            element.frame.translate(origin_x, origin_y)
        };

        self.paint_element(element, frame);

        let mut children: Vec<(i32, NodeId)> = doc
            .children(id)
            .iter()
            .filter_map(|c| doc.element(*c).map(|e| (e.style.z_index, *c)))
            .collect();
        children.sort_by_key(|(z, _)| *z);

        for (_, child) in children {
            let anchored = doc
                .element(child)
                .map(|e| e.style.position.is_viewport_anchored())
                .unwrap_or(false);
            if anchored {
                self.anchored.push(child);
            } else {
                self.paint_subtree(child, frame.x, frame.y, false);
            }
        }
    }

    fn paint_element(&mut self, element: &Element, frame: Rect) {
        let scale = self.options.scale.max(1.0);
        let target = frame.scale(scale);

        if let Some(bg) = element.style.background {
            fill_rect(&mut self.canvas, target, bg);
        }
        if let Some(border) = element.style.border {
            let w = border.width * scale;
            fill_rect(&mut self.canvas, Rect::new(target.x, target.y, target.width, w), border.color);
            fill_rect(
                &mut self.canvas,
                Rect::new(target.x, target.bottom() - w, target.width, w),
                border.color,
            );
            fill_rect(&mut self.canvas, Rect::new(target.x, target.y, w, target.height), border.color);
            fill_rect(
                &mut self.canvas,
                Rect::new(target.right() - w, target.y, w, target.height),
                border.color,
            );
        }

        match &element.content {
            Content::Empty => {}
            Content::Text(block) => paint_text(&mut self.canvas, block, frame, scale),
            Content::Image(image) => {
                let drawable = match image.origin {
                    Origin::SameOrigin => true,
                    Origin::CrossOrigin if self.options.use_cors => true,
                    Origin::CrossOrigin if self.options.allow_taint => {
                        self.tainted = true;
                        true
                    }
                    Origin::CrossOrigin => false,
                };
                if !drawable {
                    debug!(tag = element.tag, src = %image.src, "skipping cross-origin image");
                    return;
                }
                let w = target.width.round() as u32;
                let h = target.height.round() as u32;
                if w == 0 || h == 0 {
                    return;
                }
                let resized = imageops::resize(image.pixels.as_ref(), w, h, FilterType::Nearest);
                imageops::overlay(
                    &mut self.canvas,
                    &resized,
                    target.x.round() as i64,
                    target.y.round() as i64,
                );
            }
        }
    }
}

/// Text is painted as one solid cell per visible glyph, sized from the font metrics.
fn paint_text(canvas: &mut RgbaImage, block: &TextBlock, frame: Rect, scale: f32) {
    let metrics = get_metrics(block.font);
    for (i, line) in block.lines.iter().enumerate() {
        let line_top = frame.y + i as f32 * block.line_height;
        let glyph_top = line_top + (block.line_height - block.font_size) / 2.0 + block.font_size * 0.2;
        let glyph_height = block.font_size * 0.6;
        let mut x = frame.x;
        for c in line.chars() {
            let advance = metrics.char_width(c) * block.font_size;
            if !c.is_whitespace() {
                let cell = Rect::new(x, glyph_top, advance * 0.8, glyph_height);
                fill_rect(canvas, cell.scale(scale), block.color);
            }
            x += advance;
        }
    }
}

/// Fills `rect` (bitmap pixels), clipped to the canvas, blending translucent colors.
fn fill_rect(canvas: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
    if rect.is_empty() || color[3] == 0 {
        return;
    }
    let (cw, ch) = (canvas.width() as f32, canvas.height() as f32);
    let x0 = rect.x.round().clamp(0.0, cw) as u32;
    let y0 = rect.y.round().clamp(0.0, ch) as u32;
    let x1 = rect.right().round().clamp(0.0, cw) as u32;
    let y1 = rect.bottom().round().clamp(0.0, ch) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            if color[3] == 255 {
                canvas.put_pixel(x, y, color);
            } else {
                canvas.get_pixel_mut(x, y).blend(&color);
            }
        }
    }
}
