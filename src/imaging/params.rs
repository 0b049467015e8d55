//! Parameter types for caption compositing.
//!
//! These structs describe *what* to draw, not *how* to draw it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides canvas size and text layout) and the
//! [`backend`](super::backend) (which does the actual pixel work). This
//! separation allows swapping backends (e.g. for testing with a mock) without
//! changing layout logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`CaptionStyle`]: Every tunable ratio and paint setting of the caption look.
//! - [`ComposeParams`]: Everything one composite needs: source bytes,
//!   output dimensions, rendered overlay documents, quality.

use serde::{Deserialize, Serialize};

/// Default output width when the caller does not ask for one.
pub const DEFAULT_TARGET_WIDTH: u32 = 1024;

/// Height assumed when the source reports no usable dimensions.
pub const FALLBACK_HEIGHT: u32 = 1024;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Look of the caption text: sizing ratios, vertical rhythm and paint.
///
/// Every magic number of the layout lives here so legibility can be tuned
/// from `[style]` in the config file without touching the algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptionStyle {
    /// Font family list for the SVG `font-family` attribute.
    pub font_family: String,
    /// SVG font weight (900 = black).
    pub font_weight: u16,
    /// Smallest font size in pixels, whatever the canvas width.
    pub min_font_size: u32,
    /// Font size as a fraction of the canvas width.
    pub font_size_ratio: f64,
    /// Average glyph advance as a fraction of the font size.
    pub char_width_factor: f64,
    /// Lower bound for the characters-per-line budget.
    pub min_chars_per_line: usize,
    /// First top baseline, in font sizes from the top edge.
    pub top_line_factor: f64,
    /// Distance between consecutive baselines, in font sizes.
    pub line_height_factor: f64,
    /// Last bottom baseline, in font sizes from the bottom edge.
    pub bottom_margin_factor: f64,
    /// Thinnest outline in pixels.
    pub min_stroke_width: u32,
    /// Outline width is `font_size / stroke_divisor`.
    pub stroke_divisor: u32,
    /// Extra tracking between glyphs, in pixels.
    pub letter_spacing: f64,
    pub fill: String,
    pub stroke: String,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_family: "Impact, 'Arial Black', sans-serif".to_string(),
            font_weight: 900,
            min_font_size: 24,
            font_size_ratio: 0.06,
            char_width_factor: 0.6,
            min_chars_per_line: 10,
            top_line_factor: 1.3,
            line_height_factor: 1.1,
            bottom_margin_factor: 0.5,
            min_stroke_width: 2,
            stroke_divisor: 10,
            letter_spacing: 1.0,
            fill: "#ffffff".to_string(),
            stroke: "#000000".to_string(),
        }
    }
}

/// Parameters for a single composite operation.
///
/// `overlays` are complete SVG documents the size of the output canvas,
/// drawn in order over the resized source.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeParams<'a> {
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    pub overlays: Vec<String>,
    pub quality: Quality,
}
