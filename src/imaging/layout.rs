//! Caption text layout: word wrapping and block placement.
//!
//! Wrapping works on character counts, not measured glyph widths. The
//! character budget per line comes from
//! [`calculate_max_chars_per_line`](super::calculations::calculate_max_chars_per_line),
//! which approximates a bold condensed face. Words are never broken: a word
//! longer than the budget gets a line of its own.

use super::calculations::{ScaledCanvas, calculate_bottom_baselines, calculate_top_baselines};
use super::params::CaptionStyle;
use serde::Serialize;

/// Where a caption block is anchored on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerPosition {
    Top,
    Bottom,
}

/// One positioned block of caption text, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLayer {
    pub position: LayerPosition,
    /// Wrapped, uppercased lines in reading order.
    pub lines: Vec<String>,
    pub font_size: u32,
    pub stroke_width: u32,
    /// Baseline y for each entry of `lines`.
    pub baselines: Vec<f32>,
}

/// Uppercase `text` and greedily pack its words into lines of at most
/// `max_chars` characters.
///
/// Returns no lines for empty or whitespace-only input.
pub fn wrap_caption(text: &str, max_chars: usize) -> Vec<String> {
    let upper = text.to_uppercase();
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in upper.split_whitespace() {
        let word_len = word.chars().count();

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
            continue;
        }

        if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Split a single combined caption into a top and a bottom half.
///
/// The cut is at character index `len / 2`, not at a word boundary, so a word
/// straddling the midpoint ends up split across the two blocks.
pub fn split_single_caption(text: &str) -> (String, String) {
    let midpoint = text.chars().count() / 2;
    let cut = text
        .char_indices()
        .nth(midpoint)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let (top, bottom) = text.split_at(cut);
    (top.to_string(), bottom.to_string())
}

/// Wrap one caption into a positioned layer, or `None` when it has no words.
pub fn layout_layer(
    text: &str,
    position: LayerPosition,
    canvas: &ScaledCanvas,
    style: &CaptionStyle,
) -> Option<TextLayer> {
    let lines = wrap_caption(text, canvas.max_chars_per_line);
    if lines.is_empty() {
        return None;
    }

    let baselines = match position {
        LayerPosition::Top => calculate_top_baselines(lines.len(), canvas.font_size, style),
        LayerPosition::Bottom => {
            calculate_bottom_baselines(lines.len(), canvas.font_size, canvas.height, style)
        }
    };

    Some(TextLayer {
        position,
        lines,
        font_size: canvas.font_size,
        stroke_width: canvas.stroke_width,
        baselines,
    })
}

/// Lay out the top and bottom captions. Empty captions produce no layer and
/// have no effect on the other block.
pub fn layout_layers(
    top_text: &str,
    bottom_text: &str,
    canvas: &ScaledCanvas,
    style: &CaptionStyle,
) -> Vec<TextLayer> {
    [
        (top_text, LayerPosition::Top),
        (bottom_text, LayerPosition::Bottom),
    ]
    .into_iter()
    .filter_map(|(text, position)| layout_layer(text, position, canvas, style))
    .collect()
}
