//! Static font-metric tables for the two template typefaces.
//!
//! Character widths are in em units (relative to font size). The tables are an
//! approximation of the real faces, good enough to wrap text into the same number
//! of lines the browser preview would show, give or take a word at the margin.
//! Tables cover ASCII 0x20..=0x7E; index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Geometric sans used by the creative template.
    Sans,
    /// Book serif used by the classic template.
    Serif,
}

/// Static character-width table for a font family.
///
/// Slot layout of `widths`:
/// ```text
/// [0]=sp  [1..15]=!"#$%&'()*+,-./   [16..25]=0-9   [26..32]=:;<=>?@
/// [33..58]=A-Z   [59..64]=[\]^_`   [65..90]=a-z   [91..94]={|}~
/// ```
pub struct FontMetricTable {
    pub font: FontFamily,
    widths: &'static [f32; 95],
    /// Uniform multiplier applied on top of `widths`.
    scale: f32,
    /// Fallback width for non-ASCII characters.
    pub average_char_width: f32,
}

impl FontMetricTable {
    /// Width of a single character in em units.
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32] * self.scale
        } else {
            self.average_char_width * self.scale
        }
    }

    /// Width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    pub fn space_width(&self) -> f32 {
        self.char_width(' ')
    }

    /// Greedy word-wrap of `text` into lines no wider than `max_width_px` at `font_size_px`.
    ///
    /// Explicit newlines start a new paragraph. A single word wider than the line is
    /// placed on its own line and allowed to overflow. Empty input returns no lines.
    pub fn wrap_lines(&self, text: &str, font_size_px: f32, max_width_px: f32) -> Vec<String> {
        let max_width = if font_size_px > 0.0 {
            max_width_px / font_size_px
        } else {
            f32::INFINITY
        };
        let space_w = self.space_width();
        let mut lines = Vec::new();

        for paragraph in text.lines() {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                let word_w = self.measure_str(word);
                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_w;
                } else if current_width + space_w + word_w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_w;
                } else {
                    current.push(' ');
                    current.push_str(word);
                    current_width += space_w + word_w;
                }
            }
            if !current.is_empty() {
                lines.push(current);
            }
        }
        lines
    }
}

/// Returns the metric table for a font family.
pub fn get_metrics(font: FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Sans => &SANS_TABLE,
        FontFamily::Serif => &SERIF_TABLE,
    }
}

#[rustfmt::skip]
static BASE_WIDTHS: [f32; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.25, 0.30, 0.38, 0.56, 0.56, 0.89, 0.67, 0.22, 0.33, 0.33, 0.39, 0.59, 0.28, 0.33, 0.28, 0.31,
    // 0-9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.59, 0.59, 0.59, 0.50, 1.02,
    // A-M
    0.67, 0.61, 0.61, 0.67, 0.56, 0.50, 0.67, 0.67, 0.25, 0.39, 0.61, 0.53, 0.78,
    // N-Z
    0.67, 0.72, 0.56, 0.72, 0.61, 0.50, 0.56, 0.67, 0.67, 0.89, 0.61, 0.61, 0.56,
    // [     \     ]     ^     _     `
    0.28, 0.31, 0.28, 0.47, 0.56, 0.34,
    // a-m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.31, 0.56, 0.56, 0.22, 0.22, 0.53, 0.22, 0.83,
    // n-z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.44, 0.39, 0.56, 0.50, 0.72, 0.50, 0.50, 0.44,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.59,
];

static SANS_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Sans,
    widths: &BASE_WIDTHS,
    scale: 1.04,
    average_char_width: 0.52,
};

// The serif runs about 15% narrower than the sans.
static SERIF_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Serif,
    widths: &BASE_WIDTHS,
    scale: 0.88,
    average_char_width: 0.52,
};
