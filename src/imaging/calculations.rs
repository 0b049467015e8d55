//! Pure calculation functions for canvas size and caption metrics.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::{CaptionStyle, FALLBACK_HEIGHT};

/// Output canvas derived from the source dimensions and the requested width.
///
/// Carries the font metrics that depend only on the canvas, so every text
/// layer on the same image shares them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledCanvas {
    pub width: u32,
    pub height: u32,
    /// `width / natural_width`, or 1.0 when the natural width is unknown.
    pub scale: f64,
    pub font_size: u32,
    pub stroke_width: u32,
    pub max_chars_per_line: usize,
}

/// Calculate output dimensions for a source scaled to `target_width`.
///
/// # Arguments
/// * `natural` - Source dimensions (width, height); zero means unknown
/// * `target_width` - Requested output width in pixels
///
/// # Returns
/// * `(width, height, scale)` - Output dimensions and the applied scale
///
/// # Examples
/// ```
/// # use meme_caption::imaging::calculate_scaled_dimensions;
/// // 800x600 scaled to 1024 wide → 1024x768
/// assert_eq!(calculate_scaled_dimensions((800, 600), 1024), (1024, 768, 1.28));
/// ```
pub fn calculate_scaled_dimensions(natural: (u32, u32), target_width: u32) -> (u32, u32, f64) {
    let (nat_w, nat_h) = natural;
    let basis_h = if nat_h > 0 { nat_h } else { FALLBACK_HEIGHT };

    if nat_w == 0 {
        return (target_width, basis_h, 1.0);
    }

    let scale = target_width as f64 / nat_w as f64;
    let height = ((basis_h as f64 * scale).round() as u32).max(1);
    (target_width, height, scale)
}

/// Font size in pixels for a canvas of the given width.
///
/// Proportional to the width, but never below `style.min_font_size`.
pub fn calculate_font_size(width: u32, style: &CaptionStyle) -> u32 {
    let proportional = (width as f64 * style.font_size_ratio).round() as u32;
    proportional.max(style.min_font_size)
}

/// Outline width in pixels for the given font size.
pub fn calculate_stroke_width(font_size: u32, style: &CaptionStyle) -> u32 {
    let divisor = style.stroke_divisor.max(1) as f64;
    let proportional = (font_size as f64 / divisor).round() as u32;
    proportional.max(style.min_stroke_width)
}

/// How many characters fit on one line, approximating glyph width as
/// `font_size * char_width_factor`.
pub fn calculate_max_chars_per_line(width: u32, font_size: u32, style: &CaptionStyle) -> usize {
    let glyph = font_size as f64 * style.char_width_factor;
    let fit = if glyph > 0.0 {
        (width as f64 / glyph).floor() as usize
    } else {
        usize::MAX
    };
    fit.max(style.min_chars_per_line)
}

/// Derive the full [`ScaledCanvas`] for a source image.
pub fn scale_canvas(natural: (u32, u32), target_width: u32, style: &CaptionStyle) -> ScaledCanvas {
    let (width, height, scale) = calculate_scaled_dimensions(natural, target_width);
    let font_size = calculate_font_size(width, style);

    ScaledCanvas {
        width,
        height,
        scale,
        font_size,
        stroke_width: calculate_stroke_width(font_size, style),
        max_chars_per_line: calculate_max_chars_per_line(width, font_size, style),
    }
}

/// Baselines for a top block of `lines` lines, first line first.
pub fn calculate_top_baselines(lines: usize, font_size: u32, style: &CaptionStyle) -> Vec<f32> {
    let fs = font_size as f64;
    let first = fs * style.top_line_factor;
    let step = fs * style.line_height_factor;

    (0..lines).map(|i| (first + step * i as f64) as f32).collect()
}

/// Baselines for a bottom block of `lines` lines, first line first.
///
/// The block grows upward: the last line is anchored near the bottom edge
/// and each earlier line sits one line height above the next.
pub fn calculate_bottom_baselines(
    lines: usize,
    font_size: u32,
    canvas_height: u32,
    style: &CaptionStyle,
) -> Vec<f32> {
    let fs = font_size as f64;
    let last = canvas_height as f64 - fs * style.bottom_margin_factor;
    let step = fs * style.line_height_factor;

    (0..lines)
        .map(|i| {
            let lines_below = (lines - 1 - i) as f64;
            (last - step * lines_below) as f32
        })
        .collect()
}
