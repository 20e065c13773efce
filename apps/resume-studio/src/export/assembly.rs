//! Assembly stage: encodes page slices as JPEG and writes them into a PDF.
//!
//! Each page carries one image XObject (`DCTDecode`) drawn at the printable
//! width, anchored at the top-left margin. Pages are A4 portrait in points.

use std::io::Cursor;

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info};

use crate::errors::ExportError;
use crate::export::pagination::{plan_pages, PagePlan, PageSlice, PaginationMode};
use crate::export::raster::Bitmap;
use crate::layout::page::{mm_to_pt, PageConfig};

pub const PDF_CREATOR: &str = "resume-studio";

#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    pub page: PageConfig,
    pub pagination: PaginationMode,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    pub title: String,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        AssemblyOptions {
            page: crate::layout::page::default_page_config(10.0),
            pagination: PaginationMode::default(),
            jpeg_quality: 100,
            title: "Resume".to_string(),
        }
    }
}

/// A finished PDF, still in memory.
pub struct AssembledDocument {
    document: Document,
    pub plan: PagePlan,
}

impl AssembledDocument {
    pub fn page_count(&self) -> usize {
        self.plan.page_count()
    }

    pub fn to_bytes(mut self) -> Result<Vec<u8>, ExportError> {
        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| ExportError::Internal(anyhow::anyhow!("failed to serialize PDF: {e}")))?;
        Ok(buffer)
    }
}

/// Builds the PDF for `bitmap`. Fails before encoding anything when the bitmap
/// is tainted or the pagination policy rejects it.
pub fn assemble(bitmap: &Bitmap, options: &AssemblyOptions) -> Result<AssembledDocument, ExportError> {
    if bitmap.tainted {
        return Err(ExportError::TaintedCanvas);
    }
    let plan = plan_pages(bitmap.width(), bitmap.height(), &options.page, options.pagination)?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page = &options.page;
    let mut kids: Vec<Object> = Vec::with_capacity(plan.page_count());

    for slice in &plan.slices {
        let jpeg = encode_slice(bitmap, slice, options.jpeg_quality)?;
        let image_id = add_image(&mut doc, bitmap.width(), slice.src_height, jpeg);

        let width_pt = mm_to_pt(plan.image_width_mm);
        let height_pt = mm_to_pt(slice.height_mm);
        let x_pt = mm_to_pt(page.margin_mm);
        // PDF origin is bottom-left; the slice hangs from the top margin.
        let y_pt = mm_to_pt(page.height_mm - page.margin_mm - slice.height_mm);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width_pt.into(),
                        0.into(),
                        0.into(),
                        height_pt.into(),
                        x_pt.into(),
                        y_pt.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
        debug!(page = slice.page_index, src_y = slice.src_y, rows = slice.src_height, "page assembled");
    }

    let page_count = kids.len();
    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Count" => page_count as i64,
            "Kids" => kids,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                mm_to_pt(page.width_mm).into(),
                mm_to_pt(page.height_mm).into(),
            ],
        },
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let date = Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(options.title.clone()),
        "Creator" => Object::string_literal(PDF_CREATOR),
        "CreationDate" => Object::string_literal(date.clone()),
        "ModDate" => Object::string_literal(date),
    });
    doc.trailer.set("Info", info_id);
    doc.compress();

    info!(
        pages = page_count,
        content_height_mm = plan.content_height_mm,
        truncated = plan.truncated,
        "PDF assembled"
    );
    Ok(AssembledDocument { document: doc, plan })
}

fn encode_slice(bitmap: &Bitmap, slice: &PageSlice, quality: u8) -> Result<Vec<u8>, ExportError> {
    let region = image::imageops::crop_imm(&bitmap.pixels, 0, slice.src_y, bitmap.width(), slice.src_height)
        .to_image();
    let rgb = DynamicImage::ImageRgba8(region).to_rgb8();

    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder.encode_image(&rgb)?;
    }
    Ok(out.into_inner())
}

fn add_image(doc: &mut Document, width: u32, height: u32, jpeg: Vec<u8>) -> ObjectId {
    let stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    )
    // Already DCT-encoded; Flate on top only costs time.
    .with_compression(false);
    doc.add_object(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn make_bitmap(width: u32, height: u32) -> Bitmap {
        let mut pixels = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        for x in 0..width {
            pixels.put_pixel(x, height / 2, Rgba([20, 40, 200, 255]));
        }
        Bitmap {
            pixels,
            tainted: false,
            scale: 1.0,
        }
    }

    fn reparse(bytes: &[u8]) -> Document {
        Document::load_mem(bytes).expect("output must be a readable PDF")
    }

    #[test]
    fn test_single_page_document() {
        let assembled = assemble(&make_bitmap(300, 400), &AssemblyOptions::default()).unwrap();
        assert_eq!(assembled.page_count(), 1);

        let bytes = assembled.to_bytes().unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(reparse(&bytes).get_pages().len(), 1);
    }

    #[test]
    fn test_tall_bitmap_spans_pages() {
        // 100px wide at 190mm → 1.9 mm/px; 277mm holds 145 rows.
        let assembled = assemble(&make_bitmap(100, 400), &AssemblyOptions::default()).unwrap();
        assert_eq!(assembled.page_count(), 3);

        let doc = reparse(&assembled.to_bytes().unwrap());
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_page_has_a4_media_box() {
        let bytes = assemble(&make_bitmap(50, 50), &AssemblyOptions::default())
            .unwrap()
            .to_bytes()
            .unwrap();
        let doc = reparse(&bytes);
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let parent = page.get(b"Parent").unwrap().as_reference().unwrap();
        let pages = doc.get_object(parent).unwrap().as_dict().unwrap();
        let media_box = pages.get(b"MediaBox").unwrap().as_array().unwrap();
        let width = media_box[2].as_float().unwrap();
        let height = media_box[3].as_float().unwrap();
        assert!((width - 595.28).abs() < 0.1);
        assert!((height - 841.89).abs() < 0.1);
    }

    #[test]
    fn test_tainted_bitmap_rejected() {
        let mut bitmap = make_bitmap(10, 10);
        bitmap.tainted = true;
        let err = assemble(&bitmap, &AssemblyOptions::default()).err().unwrap();
        assert!(matches!(err, ExportError::TaintedCanvas));
    }

    #[test]
    fn test_strict_overflow_propagates() {
        let options = AssemblyOptions {
            pagination: PaginationMode::Strict,
            ..AssemblyOptions::default()
        };
        let err = assemble(&make_bitmap(100, 400), &options).err().unwrap();
        assert!(matches!(err, ExportError::AssemblyOverflow { .. }));
    }

    #[test]
    fn test_encoded_slice_is_jpeg() {
        let bitmap = make_bitmap(40, 40);
        let slice = PageSlice {
            page_index: 0,
            src_y: 10,
            src_height: 20,
            height_mm: 1.0,
        };
        let jpeg = encode_slice(&bitmap, &slice, 90).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 20));
    }
}
