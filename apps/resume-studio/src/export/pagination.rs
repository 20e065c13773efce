//! Pagination: maps a captured bitmap onto fixed-size output pages.
//!
//! The image is drawn at the printable width (`page width - 2 × margin`) with its
//! aspect ratio kept. If the resulting height fits the printable height it goes
//! on one page. Otherwise the overflow policy decides:
//! - `Slice`  → cut the bitmap into page-height slices, one per page
//! - `Clamp`  → keep only the first page's worth; the rest is dropped (logged)
//! - `Strict` → refuse with `AssemblyOverflow`
//!
//! Geometry is millimetres on the page side and pixels on the bitmap side.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::ExportError;
use crate::layout::page::PageConfig;

/// Slack for float comparisons on page geometry, in mm.
const FIT_EPSILON_MM: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaginationMode {
    #[default]
    Slice,
    Clamp,
    Strict,
}

impl FromStr for PaginationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slice" => Ok(PaginationMode::Slice),
            "clamp" => Ok(PaginationMode::Clamp),
            "strict" => Ok(PaginationMode::Strict),
            other => Err(format!(
                "unknown pagination mode '{other}' (expected slice, clamp or strict)"
            )),
        }
    }
}

/// One page's share of the source bitmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSlice {
    pub page_index: usize,
    /// First bitmap row of the slice.
    pub src_y: u32,
    /// Bitmap rows in the slice.
    pub src_height: u32,
    /// Drawn height of the slice on the page.
    pub height_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlan {
    /// Drawn width of every slice.
    pub image_width_mm: f32,
    /// Drawn height of the whole bitmap at `image_width_mm`.
    pub content_height_mm: f32,
    pub printable_height_mm: f32,
    pub slices: Vec<PageSlice>,
    /// True when content was cut off under the clamp policy.
    pub truncated: bool,
}

impl PagePlan {
    pub fn page_count(&self) -> usize {
        self.slices.len()
    }
}

/// Plans the pages for a `width_px × height_px` bitmap.
pub fn plan_pages(
    width_px: u32,
    height_px: u32,
    page: &PageConfig,
    mode: PaginationMode,
) -> Result<PagePlan, ExportError> {
    if width_px == 0 || height_px == 0 {
        return Err(ExportError::EmptyCapture {
            width: width_px,
            height: height_px,
        });
    }

    let image_width_mm = f64::from(page.printable_width_mm());
    let printable_height_mm = f64::from(page.printable_height_mm());
    if image_width_mm <= 0.0 || printable_height_mm <= 0.0 {
        return Err(ExportError::Internal(anyhow::anyhow!(
            "margin of {}mm leaves no printable area on a {}x{}mm page",
            page.margin_mm,
            page.width_mm,
            page.height_mm
        )));
    }

    let mm_per_px = image_width_mm / f64::from(width_px);
    let content_height_mm = f64::from(height_px) * mm_per_px;

    let mut plan = PagePlan {
        image_width_mm: image_width_mm as f32,
        content_height_mm: content_height_mm as f32,
        printable_height_mm: printable_height_mm as f32,
        slices: Vec::new(),
        truncated: false,
    };

    if content_height_mm <= printable_height_mm + FIT_EPSILON_MM {
        plan.slices.push(PageSlice {
            page_index: 0,
            src_y: 0,
            src_height: height_px,
            height_mm: content_height_mm as f32,
        });
        return Ok(plan);
    }

    // Whole bitmap rows per page, never zero.
    let rows_per_page = ((printable_height_mm / mm_per_px).floor() as u32).max(1);

    match mode {
        PaginationMode::Strict => Err(ExportError::AssemblyOverflow {
            content_height_mm: content_height_mm as f32,
            printable_height_mm: printable_height_mm as f32,
        }),
        PaginationMode::Clamp => {
            warn!(
                content_height_mm,
                printable_height_mm,
                dropped_rows = height_px - rows_per_page,
                "content taller than one page, truncating to the first page"
            );
            plan.slices.push(PageSlice {
                page_index: 0,
                src_y: 0,
                src_height: rows_per_page,
                height_mm: (f64::from(rows_per_page) * mm_per_px) as f32,
            });
            plan.truncated = true;
            Ok(plan)
        }
        PaginationMode::Slice => {
            let mut src_y = 0u32;
            while src_y < height_px {
                let src_height = rows_per_page.min(height_px - src_y);
                plan.slices.push(PageSlice {
                    page_index: plan.slices.len(),
                    src_y,
                    src_height,
                    height_mm: (f64::from(src_height) * mm_per_px) as f32,
                });
                src_y += src_height;
            }
            Ok(plan)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::default_page_config;

    fn page() -> PageConfig {
        default_page_config(10.0) // 190 × 277 mm printable
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Slice".parse::<PaginationMode>().unwrap(), PaginationMode::Slice);
        assert_eq!(" clamp ".parse::<PaginationMode>().unwrap(), PaginationMode::Clamp);
        assert_eq!("strict".parse::<PaginationMode>().unwrap(), PaginationMode::Strict);
        assert!("pages".parse::<PaginationMode>().is_err());
    }

    #[test]
    fn test_empty_bitmap_rejected() {
        for (w, h) in [(0, 100), (100, 0), (0, 0)] {
            let err = plan_pages(w, h, &page(), PaginationMode::Slice).unwrap_err();
            assert!(matches!(err, ExportError::EmptyCapture { .. }));
        }
    }

    #[test]
    fn test_a4_capture_fits_single_page() {
        // A 210×297 capture drawn 190mm wide is ~268.7mm tall, under 277mm.
        let plan = plan_pages(2381, 3368, &page(), PaginationMode::Slice).unwrap();
        assert_eq!(plan.page_count(), 1);
        assert!(plan.content_height_mm <= plan.printable_height_mm);
        assert!(!plan.truncated);
        assert_eq!(plan.slices[0].src_height, 3368);
        assert!((plan.image_width_mm - 190.0).abs() < 1e-3);
        assert!((plan.content_height_mm - 268.74).abs() < 0.05);
    }

    #[test]
    fn test_single_page_fit_for_any_mode() {
        for mode in [PaginationMode::Slice, PaginationMode::Clamp, PaginationMode::Strict] {
            let plan = plan_pages(1000, 1400, &page(), mode).unwrap();
            assert_eq!(plan.page_count(), 1, "mode {mode:?}");
        }
    }

    #[test]
    fn test_tall_content_sliced_across_pages() {
        // 1000px wide → 0.19 mm/px; 277mm holds 1457 rows.
        let plan = plan_pages(1000, 4000, &page(), PaginationMode::Slice).unwrap();
        assert_eq!(plan.page_count(), 3);
        assert_eq!(plan.slices[0].src_height, 1457);
        assert_eq!(plan.slices[1].src_y, 1457);

        let total: u32 = plan.slices.iter().map(|s| s.src_height).sum();
        assert_eq!(total, 4000, "every row lands on exactly one page");
        for slice in &plan.slices {
            assert!(slice.height_mm <= plan.printable_height_mm + 1e-3);
        }
        for (i, slice) in plan.slices.iter().enumerate() {
            assert_eq!(slice.page_index, i);
        }
    }

    #[test]
    fn test_clamp_truncates_to_one_page() {
        let plan = plan_pages(1000, 4000, &page(), PaginationMode::Clamp).unwrap();
        assert_eq!(plan.page_count(), 1);
        assert!(plan.truncated);
        assert_eq!(plan.slices[0].src_height, 1457);
    }

    #[test]
    fn test_strict_rejects_overflow() {
        let err = plan_pages(1000, 4000, &page(), PaginationMode::Strict).unwrap_err();
        match err {
            ExportError::AssemblyOverflow {
                content_height_mm,
                printable_height_mm,
            } => {
                assert!((content_height_mm - 760.0).abs() < 0.01);
                assert!((printable_height_mm - 277.0).abs() < 1e-3);
            }
            other => panic!("expected AssemblyOverflow, got {other:?}"),
        }
    }

    #[test]
    fn test_margin_too_large_is_an_error() {
        let config = default_page_config(120.0);
        assert!(plan_pages(100, 100, &config, PaginationMode::Slice).is_err());
    }
}
