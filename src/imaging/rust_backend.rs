//! Pure Rust caption backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (JPEG, PNG, WebP, GIF) | `image::ImageReader` with guessed format, header only |
//! | Decode | `image::load_from_memory` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Caption layers | `resvg` (usvg parse + tiny-skia raster), fonts from `fontdb` |
//! | Composite | `image::imageops::overlay` (alpha blend) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, CaptionBackend, Dimensions, SourceInfo};
use super::params::ComposeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, RgbaImage};
use resvg::tiny_skia;
use resvg::usvg;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

/// Largest canvas, in pixels, we agree to allocate (0x3FFF squared).
const MAX_PIXELS: u64 = 268_402_689;

/// Pure Rust backend using `image` for pixels and `resvg` for text.
///
/// Holds a read-only font database, loaded once and shared by every call.
pub struct RustBackend {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl RustBackend {
    /// Backend with the system fonts.
    pub fn new() -> Self {
        Self::with_font_dirs::<&Path>(&[])
    }

    /// Backend with the system fonts plus every font file found directly in
    /// `dirs` (e.g. a bundled Impact).
    pub fn with_font_dirs<P: AsRef<Path>>(dirs: &[P]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in dirs {
            load_fonts_from_dir(&mut db, dir.as_ref());
        }
        tracing::debug!(faces = db.len(), "font database ready");

        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Rasterize one overlay document to straight-alpha RGBA.
    fn rasterize_overlay(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        if svg.contains("<text") && self.fontdb.is_empty() {
            return Err(BackendError::Encode(
                "no fonts available to draw caption text".into(),
            ));
        }

        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts)
            .map_err(|e| BackendError::Encode(format!("text layer parse failed: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| BackendError::Encode("failed to allocate text layer".into()))?;
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        // tiny-skia stores premultiplied alpha; `image` blends straight alpha.
        let mut rgba = Vec::with_capacity(pixmap.data().len());
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| BackendError::Encode("text layer buffer size mismatch".into()))
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Font resolver that never gives up while any face is installed.
///
/// The requested families are tried first, then the generic families, then
/// whatever face the database holds first. fontdb maps the generics to
/// Windows font names by default, so without the last step a host with only
/// e.g. DejaVu would draw no caption at all.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(name) => usvg::fontdb::Family::Name(name),
                })
                .collect();
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);
            families.push(usvg::fontdb::Family::Monospace);

            let stretch = match font.stretch() {
                usvg::FontStretch::UltraCondensed => usvg::fontdb::Stretch::UltraCondensed,
                usvg::FontStretch::ExtraCondensed => usvg::fontdb::Stretch::ExtraCondensed,
                usvg::FontStretch::Condensed => usvg::fontdb::Stretch::Condensed,
                usvg::FontStretch::SemiCondensed => usvg::fontdb::Stretch::SemiCondensed,
                usvg::FontStretch::Normal => usvg::fontdb::Stretch::Normal,
                usvg::FontStretch::SemiExpanded => usvg::fontdb::Stretch::SemiExpanded,
                usvg::FontStretch::Expanded => usvg::fontdb::Stretch::Expanded,
                usvg::FontStretch::ExtraExpanded => usvg::fontdb::Stretch::ExtraExpanded,
                usvg::FontStretch::UltraExpanded => usvg::fontdb::Stretch::UltraExpanded,
            };
            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|face| face.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc"));
        if path.is_file() && is_font && db.load_font_file(&path).is_err() {
            tracing::warn!(path = %path.display(), "skipping unreadable font");
        }
    }
}

/// Decode the full source image from memory.
fn load_image(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Encode as JPEG at the given quality.
fn encode_jpeg(img: DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100) as u8);
    // JPEG has no alpha channel.
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::Encode(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl CaptionBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<SourceInfo, BackendError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let format = reader.format().map(|f| format!("{f:?}").to_lowercase());
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        Ok(SourceInfo {
            dimensions: Dimensions { width, height },
            format,
        })
    }

    fn compose(&self, params: &ComposeParams<'_>) -> Result<Vec<u8>, BackendError> {
        let img = load_image(params.source)?;

        let pixels = params.width as u64 * params.height as u64;
        if pixels == 0 || pixels > MAX_PIXELS {
            return Err(BackendError::Encode(format!(
                "canvas size out of range: {}x{} (max {MAX_PIXELS} pixels)",
                params.width, params.height
            )));
        }
        let mut canvas = img
            .resize_exact(params.width, params.height, FilterType::Lanczos3)
            .to_rgba8();

        for svg in &params.overlays {
            let layer = self.rasterize_overlay(svg, params.width, params.height)?;
            image::imageops::overlay(&mut canvas, &layer, 0, 0);
        }

        encode_jpeg(DynamicImage::ImageRgba8(canvas), params.quality.value())
    }
}
