//! Physical page geometry shared by the layout renderer and the PDF assembler.

use serde::{Deserialize, Serialize};

/// CSS pixels per millimetre at 96 dpi, rounded the way the preview does it.
pub const PX_PER_MM: f32 = 3.78;

/// PostScript points per millimetre.
pub const PT_PER_MM: f32 = 72.0 / 25.4;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

pub fn mm_to_px(mm: f32) -> f32 {
    mm * PX_PER_MM
}

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * PT_PER_MM
}

/// Output page size and margin, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
}

impl PageConfig {
    /// Width available to content between the left and right margins.
    pub fn printable_width_mm(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    /// Height available to content between the top and bottom margins.
    pub fn printable_height_mm(&self) -> f32 {
        self.height_mm - 2.0 * self.margin_mm
    }
}

/// A4 portrait with the given margin.
pub fn default_page_config(margin_mm: f32) -> PageConfig {
    PageConfig {
        width_mm: A4_WIDTH_MM,
        height_mm: A4_HEIGHT_MM,
        margin_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_printable_area_with_10mm_margin() {
        let page = default_page_config(10.0);
        assert!((page.printable_width_mm() - 190.0).abs() < 1e-4);
        assert!((page.printable_height_mm() - 277.0).abs() < 1e-4);
    }

    #[test]
    fn test_unit_conversions() {
        assert!((mm_to_px(210.0) - 793.8).abs() < 1e-3);
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-3);
    }
}
