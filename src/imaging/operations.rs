//! High-level caption operations.
//!
//! These functions combine calculations with backend execution. They take
//! the captions and style, compute the canvas and text layout, and call the
//! backend for the pixel work. Planning is split from execution so layout can
//! be checked without encoding anything.

use super::backend::{BackendError, CaptionBackend};
use super::calculations::{ScaledCanvas, scale_canvas};
use super::layout::{TextLayer, layout_layers};
use super::params::{CaptionStyle, ComposeParams, Quality};
use super::svg::render_layer_svg;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Encoded source bytes plus what the decoder learned about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: Option<String>,
}

impl SourceImage {
    /// Identify `bytes` with the backend. Fails with
    /// [`BackendError::Decode`] when the bytes are not a readable image.
    pub fn identify(backend: &impl CaptionBackend, bytes: Vec<u8>) -> Result<Self> {
        let info = backend.identify(&bytes)?;
        Ok(Self {
            bytes,
            width: info.dimensions.width,
            height: info.dimensions.height,
            format: info.format,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Canvas and text layers for one composition, before any pixel work.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionPlan {
    pub canvas: ScaledCanvas,
    pub layers: Vec<TextLayer>,
}

/// Final encoded image and its dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionResult {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Plan a captioned image without executing it.
///
/// Useful for testing layout decisions.
pub fn plan_caption(
    natural: (u32, u32),
    top_text: &str,
    bottom_text: &str,
    target_width: u32,
    style: &CaptionStyle,
) -> CaptionPlan {
    let canvas = scale_canvas(natural, target_width, style);
    let layers = layout_layers(top_text, bottom_text, &canvas, style);

    tracing::debug!(
        width = canvas.width,
        height = canvas.height,
        font_size = canvas.font_size,
        max_chars = canvas.max_chars_per_line,
        layers = layers.len(),
        "planned caption layout"
    );

    CaptionPlan { canvas, layers }
}

/// Render every planned layer to an overlay document, top block first.
pub fn render_overlays(plan: &CaptionPlan, style: &CaptionStyle) -> Vec<String> {
    plan.layers
        .iter()
        .map(|layer| render_layer_svg(layer, plan.canvas.width, plan.canvas.height, style))
        .collect()
}

/// Create the captioned image.
///
/// Resizes the source to `target_width` (aspect preserved), draws the
/// non-empty captions and encodes at `quality`.
pub fn create_captioned_image(
    backend: &impl CaptionBackend,
    source: &SourceImage,
    top_text: &str,
    bottom_text: &str,
    target_width: u32,
    quality: Quality,
    style: &CaptionStyle,
) -> Result<CompositionResult> {
    let plan = plan_caption(source.dimensions(), top_text, bottom_text, target_width, style);
    let overlays = render_overlays(&plan, style);

    let bytes = backend.compose(&ComposeParams {
        source: &source.bytes,
        width: plan.canvas.width,
        height: plan.canvas.height,
        overlays,
        quality,
    })?;

    Ok(CompositionResult {
        bytes,
        width: plan.canvas.width,
        height: plan.canvas.height,
    })
}
