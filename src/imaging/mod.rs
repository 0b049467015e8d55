//! Caption compositing in pure Rust, no system image libraries.
//!
//! | Stage | Output | Crate / function |
//! |---|---|---|
//! | **Identify** | [`SourceImage`] | `image::ImageReader` (header only) |
//! | **Scale** | [`ScaledCanvas`] | pure math |
//! | **Wrap** | [`TextLayer`]s | pure, character-count greedy wrap |
//! | **Render** | SVG markup | pure string building |
//! | **Composite → JPEG** | [`CompositionResult`] | `resvg` + `image` (Lanczos3, JPEG encoder) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and font math (unit testable)
//! - **Parameters**: Data structures describing caption style and compose jobs
//! - **Layout**: Word wrap, midpoint split, block placement
//! - **SVG**: Text layer markup
//! - **Backend**: [`CaptionBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod layout;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod svg;

pub use backend::{BackendError, CaptionBackend, Dimensions, SourceInfo};
pub use calculations::{
    ScaledCanvas, calculate_font_size, calculate_max_chars_per_line, calculate_scaled_dimensions,
    calculate_stroke_width, scale_canvas,
};
pub use layout::{LayerPosition, TextLayer, layout_layers, split_single_caption, wrap_caption};
pub use operations::{
    CaptionPlan, CompositionResult, SourceImage, create_captioned_image, plan_caption,
    render_overlays,
};
pub use params::{CaptionStyle, ComposeParams, DEFAULT_TARGET_WIDTH, FALLBACK_HEIGHT, Quality};
pub use rust_backend::RustBackend;
